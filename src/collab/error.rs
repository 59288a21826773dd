use std::path::PathBuf;
use thiserror::Error;

use crate::tree::TreeError;

/// Failure reported by a remote action collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("Unknown action '{action_id}'")]
    UnknownAction { action_id: String },

    #[error("Action '{action_id}' failed: {message}")]
    Failed { action_id: String, message: String },
}

/// Errors from loading or saving page documents.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Page '{page_id}' not found")]
    NotFound { page_id: String },

    #[error("Invalid page id '{page_id}'")]
    InvalidPageId { page_id: String },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid page document: {0}")]
    Document(#[from] TreeError),
}
