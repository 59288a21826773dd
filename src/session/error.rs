use thiserror::Error;

use crate::actions::TriggerError;
use crate::collab::PersistenceError;
use crate::tree::TreeError;
use crate::widgets::WidgetError;

/// Errors surfaced by [`super::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("Widget '{id}' not found")]
    UnknownWidget { id: String },
}
