//! Immutable results of evaluation passes.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

use super::error::EvalError;
use crate::expr::{DataContext, EntityMap, PropertyMap, Value};
use crate::graph::EntityPath;
use crate::tree::WidgetType;

/// Final props of one widget after merging meta state over evaluated values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedWidget {
    pub id: String,
    pub widget_type: WidgetType,
    pub props: PropertyMap,
    /// Errors keyed by property name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub errors: IndexMap<String, EvalError>,
}

impl EvaluatedWidget {
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&EvalError> {
        self.errors.get(name)
    }
}

/// Snapshot produced by a pass.
///
/// Widgets are shared behind `Arc`; a widget whose props and errors did not
/// change keeps the same allocation across passes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluatedDataTree {
    pub(crate) widgets: IndexMap<String, Arc<EvaluatedWidget>>,
    pub(crate) sources: EntityMap,
    pub(crate) version: u64,
}

impl EvaluatedDataTree {
    pub fn get(&self, id: &str) -> Option<&Arc<EvaluatedWidget>> {
        self.widgets.get(id)
    }

    /// Widgets in tree pre-order.
    pub fn widgets(&self) -> impl Iterator<Item = &Arc<EvaluatedWidget>> {
        self.widgets.values()
    }

    pub fn source(&self, id: &str) -> Option<&PropertyMap> {
        self.sources.get(id)
    }

    /// Number of passes committed before this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current value at a path, widget or data source.
    pub fn value(&self, path: &EntityPath) -> Option<&Value> {
        match self.widgets.get(&path.entity) {
            Some(widget) => widget.props.get(&path.property),
            None => self.sources.get(&path.entity)?.get(&path.property),
        }
    }

    pub fn error(&self, path: &EntityPath) -> Option<&EvalError> {
        self.widgets.get(&path.entity)?.errors.get(&path.property)
    }

    /// Every recorded error, widgets in pre-order.
    pub fn errors(&self) -> Vec<&EvalError> {
        self.widgets.values().flat_map(|w| w.errors.values()).collect()
    }
}

impl DataContext for EvaluatedDataTree {
    fn has_entity(&self, name: &str) -> bool {
        self.widgets.contains_key(name) || self.sources.contains_key(name)
    }

    fn property(&self, entity: &str, property: &str) -> Option<Value> {
        if let Some(widget) = self.widgets.get(entity) {
            return widget.props.get(property).cloned();
        }
        let source = self.sources.get(entity)?;
        match source.get(property) {
            Some(value) => Some(value.clone()),
            None if entity == crate::graph::STORE_ENTITY => Some(Value::Null),
            None => None,
        }
    }

    fn entity(&self, entity: &str) -> Option<Value> {
        if let Some(widget) = self.widgets.get(entity) {
            return Some(Value::Map(widget.props.clone()));
        }
        self.sources.get(entity).map(|props| Value::Map(props.clone()))
    }
}
