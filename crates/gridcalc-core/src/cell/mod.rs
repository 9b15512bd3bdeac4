//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellValue`] - The computed value of a cell
//! - [`CellError`] - Error tags stored in place of a number

mod address;
mod value;

pub use address::CellAddress;
pub use value::{CellError, CellValue};
