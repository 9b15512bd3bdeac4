//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellAddress,
    CellError,
    CellKind,
    CellValue,

    // Formula types
    FormulaError,
    FormulaExpr,
    FormulaResult,
    ParsedInput,

    RecalcStats,
    Sheet,
};
