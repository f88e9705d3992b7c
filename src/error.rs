//! Error types for the rule engine core

use crate::rule::Comparator;
use thiserror::Error;

/// Main error type for compiling, combining and evaluating rules
#[derive(Error, Debug, Clone)]
pub enum RuleError {
    #[error("Unrecognized input at offset {offset}: {fragment:?}")]
    LexError { offset: usize, fragment: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Field not found in record: {0}")]
    FieldNotFound(String),

    #[error("Type mismatch on field '{field}': cannot apply {comparator} to {found} and {expected}")]
    TypeMismatch {
        field: String,
        comparator: Comparator,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot combine an empty rule set")]
    EmptyRuleSet,

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RuleError {
    /// Whether the error was raised while compiling rule text, as opposed to
    /// evaluating a compiled tree against a record.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            RuleError::LexError { .. } | RuleError::ParseError(_) | RuleError::EmptyRuleSet
        )
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyTypeError, PyValueError};

        match err {
            RuleError::FieldNotFound(field) => {
                PyKeyError::new_err(format!("Field not found in record: {}", field))
            }
            err @ RuleError::TypeMismatch { .. } => PyTypeError::new_err(err.to_string()),
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Result type alias for the rule engine core
pub type Result<T> = std::result::Result<T, RuleError>;
