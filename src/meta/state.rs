use crate::expr::{EntityMap, PropertyMap, Value};

/// Ephemeral per-widget state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaState {
    pub(crate) values: EntityMap,
    pub(crate) defaults: EntityMap,
}

impl MetaState {
    pub fn is_registered(&self, widget: &str) -> bool {
        self.defaults.contains_key(widget)
    }

    pub fn widget(&self, widget: &str) -> Option<&PropertyMap> {
        self.values.get(widget)
    }

    pub fn value(&self, widget: &str, property: &str) -> Option<&Value> {
        self.values.get(widget)?.get(property)
    }

    pub fn values(&self) -> &EntityMap {
        &self.values
    }
}
