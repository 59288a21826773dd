//! Widget configuration records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::expr::{template, Value};

/// Closed set of widget types the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetType {
    Canvas,
    Container,
    Text,
    Button,
    Input,
    Table,
    Popup,
}

impl WidgetType {
    pub const ALL: [WidgetType; 7] = [
        WidgetType::Canvas,
        WidgetType::Container,
        WidgetType::Text,
        WidgetType::Button,
        WidgetType::Input,
        WidgetType::Table,
        WidgetType::Popup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Canvas => "CANVAS",
            WidgetType::Container => "CONTAINER",
            WidgetType::Text => "TEXT",
            WidgetType::Button => "BUTTON",
            WidgetType::Input => "INPUT",
            WidgetType::Table => "TABLE",
            WidgetType::Popup => "POPUP",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Whether a widget renders for authoring or for end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderMode {
    #[serde(alias = "editor")]
    Editor,
    #[default]
    #[serde(alias = "view")]
    View,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "editor" | "canvas" => Ok(RenderMode::Editor),
            "view" | "page" => Ok(RenderMode::View),
            other => Err(format!("unknown render mode '{}'", other)),
        }
    }
}

/// A persisted property: a literal or a string with embedded `{{ … }}` bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Literal(Value),
    Binding(String),
}

impl PropertyValue {
    /// Classify a raw JSON value: strings containing a fragment are bindings.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(s) if template::is_dynamic(s) => PropertyValue::Binding(s.clone()),
            other => PropertyValue::Literal(Value::from(other)),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Literal(value) => value.to_json(),
            PropertyValue::Binding(source) => serde_json::Value::String(source.clone()),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, PropertyValue::Binding(_))
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if template::is_dynamic(&s) => PropertyValue::Binding(s),
            other => PropertyValue::Literal(other),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::from(Value::from(s))
    }
}

/// One widget instance in the page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetNode {
    /// Stable unique id; bindings refer to widgets by it.
    pub id: String,
    pub widget_type: WidgetType,
    pub parent_id: Option<String>,
    /// Child ids in render order.
    pub children: Vec<String>,
    pub properties: IndexMap<String, PropertyValue>,
    pub render_mode: RenderMode,
}

impl WidgetNode {
    pub fn new(id: impl Into<String>, widget_type: WidgetType) -> Self {
        Self {
            id: id.into(),
            widget_type,
            parent_id: None,
            children: Vec::new(),
            properties: IndexMap::new(),
            render_mode: RenderMode::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Literal(Value::Bool(b))
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Literal(Value::Number(n))
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(json: serde_json::Value) -> Self {
        PropertyValue::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_with_fragments_are_bindings() {
        assert!(PropertyValue::from("{{ A.b }}").is_dynamic());
        assert!(!PropertyValue::from("plain").is_dynamic());
        assert!(!PropertyValue::from_json(&serde_json::json!(400)).is_dynamic());
    }

    #[test]
    fn widget_type_parses_case_insensitively() {
        assert_eq!("popup".parse::<WidgetType>(), Ok(WidgetType::Popup));
        assert!("CHART".parse::<WidgetType>().is_err());
    }
}
