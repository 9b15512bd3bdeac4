//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while classifying or parsing cell input
///
/// Evaluation never fails with a `FormulaError`: arithmetic problems are
/// stored on the cell as a [`CellError`](gridcalc_core::CellError) value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Input is not a valid literal, formula, or empty
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Byte offset into the raw input
        position: usize,
        message: String,
    },

    /// Reference to an invalid cell address
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl FormulaError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Byte offset of a parse failure, if this is one
    pub fn position(&self) -> Option<usize> {
        match self {
            FormulaError::Parse { position, .. } => Some(*position),
            FormulaError::InvalidReference(_) => None,
        }
    }
}

impl From<gridcalc_core::Error> for FormulaError {
    fn from(err: gridcalc_core::Error) -> Self {
        FormulaError::InvalidReference(err.to_string())
    }
}
