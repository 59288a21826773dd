//! Transitions of the meta overlay.

use crate::expr::{PropertyMap, Value};

/// One meta write inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaWrite {
    pub widget: String,
    pub property: String,
    pub value: Value,
}

/// Writes applied together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaTransaction {
    pub writes: Vec<MetaWrite>,
}

impl MetaTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, widget: &str, property: &str, value: Value) -> Self {
        self.writes.push(MetaWrite {
            widget: widget.to_string(),
            property: property.to_string(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Intents processed by [`MetaReducer`](super::MetaReducer).
#[derive(Debug, Clone, PartialEq)]
pub enum MetaIntent {
    /// A widget was instantiated; its meta state starts at `defaults`.
    Register { widget: String, defaults: PropertyMap },
    Set {
        widget: String,
        property: String,
        value: Value,
    },
    /// Restore the widget's registered defaults.
    Reset { widget: String },
    /// The widget left the tree.
    Remove { widget: String },
    Commit(MetaTransaction),
}
