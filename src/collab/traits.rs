//! Collaborator interfaces the engine depends on.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use super::error::{PersistenceError, RemoteError};
use crate::expr::Value;
use crate::tree::TreeDocument;

/// Stores page documents.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load_tree(&self, page_id: &str) -> Result<TreeDocument, PersistenceError>;

    async fn save_tree(&self, page_id: &str, document: &TreeDocument) -> Result<(), PersistenceError>;
}

/// Runs named remote actions (queries, API calls).
#[async_trait]
pub trait RemoteActions: Send + Sync {
    async fn invoke(&self, action_id: &str, params: Value) -> Result<Value, RemoteError>;
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// Parse the kind argument of `showAlert`; unknown kinds map to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "success" => NoticeKind::Success,
            "warning" => NoticeKind::Warning,
            "error" => NoticeKind::Error,
            _ => NoticeKind::Info,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A message for the user, e.g. an alert or a failed trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Widget or action the notice originates from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Surfaces notices to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice);

    async fn notify_error(&self, notice: Notice) {
        self.notify(Notice {
            kind: NoticeKind::Error,
            ..notice
        })
        .await
    }

    async fn notify_success(&self, message: &str) {
        self.notify(Notice::new(NoticeKind::Success, message)).await
    }
}
