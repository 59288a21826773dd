//! Render descriptions handed to the rendering collaborator.

use serde::Serialize;

use crate::expr::{PropertyMap, Value};
use crate::scheduler::EvaluatedWidget;
use crate::tree::{RenderMode, WidgetNode, WidgetType};

/// Everything a widget kind needs to describe one instance.
pub struct RenderContext<'a> {
    pub node: &'a WidgetNode,
    pub widget: &'a EvaluatedWidget,
    /// Final props with anything inherited from the parent applied.
    pub props: PropertyMap,
    /// Trigger properties that hold a binding on this instance.
    pub triggers: Vec<String>,
    pub children: Vec<RenderNode>,
}

/// Serializable description of a rendered widget subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    pub widget_type: WidgetType,
    pub element: &'static str,
    pub mode: RenderMode,
    pub visible: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub loading: bool,
    pub props: PropertyMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Default description shared by all kinds.
    ///
    /// Editor output keeps errored values and lists binding errors inline;
    /// view output degrades errored values to `null`.
    pub fn from_context(element: &'static str, mode: RenderMode, ctx: RenderContext<'_>) -> Self {
        let visible = ctx.props.get("isVisible").map(Value::is_truthy).unwrap_or(true);
        let loading = ctx.props.values().any(|v| *v == Value::Loading);
        let (props, errors) = match mode {
            RenderMode::Editor => (
                ctx.props,
                ctx.widget
                    .errors
                    .iter()
                    .map(|(name, err)| format!("{}: {}", name, err.message))
                    .collect(),
            ),
            RenderMode::View => (
                ctx.props
                    .into_iter()
                    .map(|(name, value)| match value {
                        Value::Error(_) => (name, Value::Null),
                        other => (name, other),
                    })
                    .collect(),
                Vec::new(),
            ),
        };
        Self {
            id: ctx.node.id.clone(),
            widget_type: ctx.node.widget_type,
            element,
            mode,
            visible,
            loading,
            props,
            label: None,
            errors,
            events: ctx.triggers,
            children: ctx.children,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Depth-first search by widget id.
    pub fn find(&self, id: &str) -> Option<&RenderNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}
