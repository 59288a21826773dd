use thiserror::Error;

/// Errors raised by tree edits and document loading.
///
/// Every variant aborts the edit that caused it; the tree is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("Tree invariant violation: {message}")]
    TreeInvariantViolation { message: String },

    #[error("Duplicate widget id '{id}'")]
    DuplicateId { id: String },

    #[error("Id '{id}' is already used by {owner}")]
    IdInUse { id: String, owner: String },

    #[error("Widget '{id}' not found")]
    NotFound { id: String },

    #[error("Unknown widget type '{type_name}' for widget '{id}'")]
    UnknownWidgetType { id: String, type_name: String },

    #[error("Invalid tree document: {message}")]
    InvalidDocument { message: String },
}

impl TreeError {
    pub fn violation(message: impl Into<String>) -> Self {
        TreeError::TreeInvariantViolation {
            message: message.into(),
        }
    }

    pub fn id_in_use(id: &str, owner: &str) -> Self {
        TreeError::IdInUse {
            id: id.to_string(),
            owner: owner.to_string(),
        }
    }

    pub fn not_found(id: &str) -> Self {
        TreeError::NotFound { id: id.to_string() }
    }
}
