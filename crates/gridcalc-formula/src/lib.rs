//! # gridcalc-formula
//!
//! Formula parser, dependency graph and evaluator for gridcalc.
//!
//! This crate provides:
//! - Input classification and formula parsing (text → AST)
//! - Formula evaluation (AST → value)
//! - Dependency tracking, cycle detection and recalculation order
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use gridcalc_core::{CellAddress, CellValue};
//! use gridcalc_formula::{evaluate, parse_formula};
//!
//! let ast = parse_formula("=A1*2").unwrap();
//! let mut values = BTreeMap::new();
//! values.insert(CellAddress::parse("A1").unwrap(), CellValue::Number(21.0));
//! assert_eq!(evaluate(&ast, &values), CellValue::Number(42.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr};
pub use dependency::{DependencyChange, DependencyGraph, RecalcPlan};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{apply_binary_op, evaluate, EvaluationContext};
pub use parser::{parse_formula, parse_input, ParsedInput};
