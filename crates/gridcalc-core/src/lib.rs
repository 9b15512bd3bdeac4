//! # gridcalc-core
//!
//! Core data structures for the gridcalc recalculation engine.
//!
//! This crate provides the fundamental types used throughout gridcalc:
//! - [`CellAddress`] - One-based cell addressing in A1 notation
//! - [`CellValue`] - A computed cell value (number or error tag)
//! - [`CellError`] - The error tags (`#PARSE`, `#CYCLE`, `#DIV/0`, `#NAN`)
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellAddress, CellError, CellValue};
//!
//! let addr: CellAddress = "B3".parse().unwrap();
//! assert_eq!(addr.col, 2);
//! assert_eq!(addr.row, 3);
//!
//! let value = CellValue::Error(CellError::DivByZero);
//! assert_eq!(value.to_string(), "#DIV/0");
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{CellAddress, CellError, CellValue};
pub use error::{Error, Result};
