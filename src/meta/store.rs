//! Shared meta overlay with intent-based transitions.

use indexmap::IndexSet;
use parking_lot::RwLock;

use super::intent::{MetaIntent, MetaTransaction};
use super::reducer::{MetaReducer, Reducer};
use super::state::MetaState;
use crate::expr::{EntityMap, PropertyMap, Value};
use crate::graph::EntityPath;

/// The meta overlay.
///
/// Every transition runs through [`MetaReducer`] on a copy of the state and
/// is swapped in under the write lock, so readers only ever see whole
/// transactions.
#[derive(Debug, Default)]
pub struct MetaStore {
    state: RwLock<MetaState>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an intent and return the paths whose meta value changed.
    pub fn dispatch(&self, intent: MetaIntent) -> Vec<EntityPath> {
        let mut guard = self.state.write();
        let next = MetaReducer::reduce(guard.clone(), intent);
        let changed = diff(&guard, &next);
        *guard = next;
        changed
    }

    pub fn register(&self, widget: &str, defaults: PropertyMap) -> Vec<EntityPath> {
        self.dispatch(MetaIntent::Register {
            widget: widget.to_string(),
            defaults,
        })
    }

    pub fn set(&self, widget: &str, property: &str, value: Value) -> Vec<EntityPath> {
        self.dispatch(MetaIntent::Set {
            widget: widget.to_string(),
            property: property.to_string(),
            value,
        })
    }

    pub fn reset(&self, widget: &str) -> Vec<EntityPath> {
        self.dispatch(MetaIntent::Reset {
            widget: widget.to_string(),
        })
    }

    pub fn remove(&self, widget: &str) -> Vec<EntityPath> {
        self.dispatch(MetaIntent::Remove {
            widget: widget.to_string(),
        })
    }

    pub fn commit(&self, transaction: MetaTransaction) -> Vec<EntityPath> {
        if transaction.is_empty() {
            return Vec::new();
        }
        self.dispatch(MetaIntent::Commit(transaction))
    }

    /// Current meta props of a widget; empty for unknown widgets.
    pub fn get(&self, widget: &str) -> PropertyMap {
        self.state.read().widget(widget).cloned().unwrap_or_default()
    }

    pub fn value(&self, widget: &str, property: &str) -> Option<Value> {
        self.state.read().value(widget, property).cloned()
    }

    pub fn is_registered(&self, widget: &str) -> bool {
        self.state.read().is_registered(widget)
    }

    /// Copy of every widget's meta props.
    pub fn snapshot(&self) -> EntityMap {
        self.state.read().values().clone()
    }
}

/// Paths present in either state whose values differ.
fn diff(before: &MetaState, after: &MetaState) -> Vec<EntityPath> {
    let widgets: IndexSet<&String> = before.values.keys().chain(after.values.keys()).collect();
    let mut changed = Vec::new();
    for widget in widgets {
        let old = before.values.get(widget);
        let new = after.values.get(widget);
        let keys: IndexSet<&String> = old
            .into_iter()
            .flat_map(|m| m.keys())
            .chain(new.into_iter().flat_map(|m| m.keys()))
            .collect();
        for key in keys {
            if old.and_then(|m| m.get(key)) != new.and_then(|m| m.get(key)) {
                changed.push(EntityPath::new(widget.as_str(), key.as_str()));
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MetaStore {
        let store = MetaStore::new();
        store.register("Popup1", PropertyMap::new());
        store
    }

    #[test]
    fn set_reports_changed_path() {
        let store = store();
        let changed = store.set("Popup1", "height", Value::Number(0.0));
        assert_eq!(changed, vec![EntityPath::new("Popup1", "height")]);
        assert!(store.set("Popup1", "height", Value::Number(0.0)).is_empty());
    }

    #[test]
    fn commit_applies_every_write() {
        let store = store();
        store.register("Text1", PropertyMap::new());
        let changed = store.commit(
            MetaTransaction::new()
                .set("Popup1", "isVisible", Value::Bool(true))
                .set("Text1", "text", Value::from("x")),
        );
        assert_eq!(changed.len(), 2);
        assert_eq!(store.get("Text1").get("text"), Some(&Value::from("x")));
    }

    #[test]
    fn reset_reports_cleared_keys() {
        let store = store();
        store.set("Popup1", "height", Value::Number(0.0));
        assert_eq!(store.reset("Popup1"), vec![EntityPath::new("Popup1", "height")]);
        assert_eq!(store.value("Popup1", "height"), None);
    }
}
