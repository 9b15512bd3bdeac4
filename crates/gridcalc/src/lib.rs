//! # gridcalc
//!
//! A small spreadsheet recalculation engine.
//!
//! Cells hold numeric literals or arithmetic formulas over `+ - * /`, signed
//! number literals and A1-style references. Every edit incrementally
//! recomputes the edited cell and everything that transitively reads it.
//! Dependency cycles are detected and tagged `#CYCLE` instead of being
//! evaluated.
//!
//! ## Features
//!
//! - Strict formula grammar with positioned parse errors
//! - Incremental, dependency-ordered recalculation
//! - Cycle detection on every edit
//! - Error tags (`#PARSE`, `#CYCLE`, `#DIV/0`, `#NAN`) that propagate through formulas
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_cell("A1", "10").unwrap();
//! sheet.set_cell("A2", "=A1*2").unwrap();
//! sheet.set_cell("A3", "=A2+A1").unwrap();
//! assert_eq!(sheet.value_at("A3").unwrap(), CellValue::Number(30.0));
//!
//! // A cycle tags every cell on it
//! sheet.set_cell("A1", "=A3").unwrap();
//! assert_eq!(sheet.value_at("A1").unwrap(), CellValue::Error(CellError::Cycle));
//! ```

pub mod calculation;
pub mod prelude;
pub mod sheet;

pub use calculation::RecalcStats;
pub use sheet::{Cell, CellKind, Sheet};

// Re-export core types
pub use gridcalc_core::{CellAddress, CellError, CellValue, Error, Result};

// Re-export formula types
pub use gridcalc_formula::{
    evaluate, parse_formula, parse_input, BinaryOperator, DependencyGraph, EvaluationContext,
    FormulaError, FormulaExpr, FormulaResult, ParsedInput,
};
