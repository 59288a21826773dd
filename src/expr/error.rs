//! Error types for expression parsing and evaluation.

use thiserror::Error;

/// Errors raised while parsing or evaluating a single expression fragment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// Malformed fragment.
    #[error("Syntax error at column {column}: {message}")]
    Parse { message: String, column: usize },

    /// The fragment names an entity or property that does not exist.
    #[error("Reference error: {0}")]
    Reference(String),

    /// The fragment parsed but failed while running.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ExprError {
    pub fn parse(message: impl Into<String>, column: usize) -> Self {
        ExprError::Parse {
            message: message.into(),
            column,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ExprError::Runtime(message.into())
    }

    pub fn reference(message: impl Into<String>) -> Self {
        ExprError::Reference(message.into())
    }
}
