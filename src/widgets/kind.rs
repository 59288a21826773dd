//! The capability trait every widget type implements.

use indexmap::IndexMap;

use super::render::{RenderContext, RenderNode};
use super::schema::{DerivedProperty, PropertyConfig, PropertySection};
use crate::expr::{PropertyMap, Value};
use crate::tree::{RenderMode, WidgetType};

/// User interaction delivered to a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Click,
    ModalClose,
    TextChanged { text: String },
    RowSelected { index: usize },
}

impl WidgetEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            WidgetEvent::Click => "ON_CLICK",
            WidgetEvent::ModalClose => "ON_MODAL_CLOSE",
            WidgetEvent::TextChanged { .. } => "ON_TEXT_CHANGE",
            WidgetEvent::RowSelected { .. } => "ON_ROW_SELECTED",
        }
    }

    /// The `event` object visible to trigger bindings.
    pub fn to_value(&self) -> Value {
        let mut fields = IndexMap::new();
        fields.insert("type".to_string(), Value::from(self.event_type()));
        match self {
            WidgetEvent::TextChanged { text } => {
                fields.insert("text".to_string(), Value::from(text.as_str()));
            }
            WidgetEvent::RowSelected { index } => {
                fields.insert("index".to_string(), Value::Number(*index as f64));
            }
            WidgetEvent::Click | WidgetEvent::ModalClose => {}
        }
        Value::Map(fields)
    }
}

/// How a widget reacts to an event: meta writes first, then a trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub meta_writes: Vec<(String, Value)>,
    /// Trigger property whose binding should run afterwards.
    pub trigger: Option<&'static str>,
}

impl EventResponse {
    pub fn trigger(name: &'static str) -> Self {
        Self {
            meta_writes: Vec::new(),
            trigger: Some(name),
        }
    }

    pub fn with_meta(mut self, property: &str, value: Value) -> Self {
        self.meta_writes.push((property.to_string(), value));
        self
    }
}

/// Capabilities of one widget type.
///
/// Implementations are stateless; per-instance data lives in the tree, the
/// meta overlay and the evaluated snapshot.
pub trait WidgetKind: Send + Sync {
    fn widget_type(&self) -> WidgetType;

    /// Element name used in render descriptions.
    fn element(&self) -> &'static str;

    fn property_pane(&self) -> Vec<PropertySection>;

    /// Meta properties and the values they reset to.
    fn meta_defaults(&self) -> PropertyMap {
        PropertyMap::new()
    }

    fn derived_properties(&self) -> Vec<DerivedProperty> {
        Vec::new()
    }

    /// Props pushed down onto every child at render time.
    fn child_props(&self, _props: &PropertyMap) -> PropertyMap {
        PropertyMap::new()
    }

    fn handle_event(&self, _props: &PropertyMap, _event: &WidgetEvent) -> Option<EventResponse> {
        None
    }

    /// Flattened property configs in pane order.
    fn properties(&self) -> Vec<PropertyConfig> {
        self.property_pane()
            .into_iter()
            .flat_map(|section| section.children)
            .collect()
    }

    /// Properties holding action sequences rather than values.
    fn trigger_properties(&self) -> Vec<&'static str> {
        self.properties()
            .into_iter()
            .filter(|config| config.trigger)
            .map(|config| config.name)
            .collect()
    }

    fn render_editor(&self, ctx: RenderContext<'_>) -> RenderNode {
        RenderNode::from_context(self.element(), RenderMode::Editor, ctx)
    }

    fn render_view(&self, ctx: RenderContext<'_>) -> RenderNode {
        RenderNode::from_context(self.element(), RenderMode::View, ctx)
    }
}
