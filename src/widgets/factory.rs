//! Widget type lookup and instantiation.

use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

use super::kind::WidgetKind;
use super::kinds::{
    ButtonWidget, CanvasWidget, ContainerWidget, InputWidget, PopupWidget, TableWidget, TextWidget,
};
use super::render::{RenderContext, RenderNode};
use super::schema::PropertyConfig;
use crate::expr::PropertyMap;
use crate::scheduler::EvaluatedDataTree;
use crate::tree::{RenderMode, WidgetNode, WidgetTree, WidgetType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("Unknown widget type '{widget_type}' for widget '{id}'")]
    UnknownWidgetType { id: String, widget_type: WidgetType },

    #[error("Widget '{id}' has no evaluated state")]
    NotEvaluated { id: String },

    #[error("Widget '{parent}' lists missing child '{child}'")]
    MissingChild { parent: String, child: String },
}

/// Lookup table from widget type to its capabilities.
#[derive(Clone, Default)]
pub struct WidgetFactory {
    kinds: IndexMap<WidgetType, Arc<dyn WidgetKind>>,
}

impl WidgetFactory {
    /// A factory with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every built-in kind registered.
    pub fn builtin() -> Self {
        let mut factory = Self::new();
        factory.register(Arc::new(CanvasWidget));
        factory.register(Arc::new(ContainerWidget));
        factory.register(Arc::new(TextWidget));
        factory.register(Arc::new(ButtonWidget));
        factory.register(Arc::new(InputWidget));
        factory.register(Arc::new(TableWidget));
        factory.register(Arc::new(PopupWidget));
        factory
    }

    /// Register a kind, replacing any previous kind for the same type.
    pub fn register(&mut self, kind: Arc<dyn WidgetKind>) {
        self.kinds.insert(kind.widget_type(), kind);
    }

    pub fn is_registered(&self, widget_type: WidgetType) -> bool {
        self.kinds.contains_key(&widget_type)
    }

    /// Capabilities for `node`'s type.
    pub fn kind_for(&self, node: &WidgetNode) -> Result<&Arc<dyn WidgetKind>, WidgetError> {
        self.kinds
            .get(&node.widget_type)
            .ok_or_else(|| WidgetError::UnknownWidgetType {
                id: node.id.clone(),
                widget_type: node.widget_type,
            })
    }

    /// Schema entry for one property, if the type declares it.
    pub fn property_config(&self, widget_type: WidgetType, name: &str) -> Option<PropertyConfig> {
        self.kinds
            .get(&widget_type)?
            .properties()
            .into_iter()
            .find(|config| config.name == name)
    }

    pub fn create_widget(&self, node: &WidgetNode, mode: RenderMode) -> Result<RenderableWidget, WidgetError> {
        let kind = self.kind_for(node)?;
        Ok(RenderableWidget {
            node: node.clone(),
            kind: Arc::clone(kind),
            mode,
        })
    }
}

impl std::fmt::Debug for WidgetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetFactory")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A widget instance bound to its kind and a render mode.
pub struct RenderableWidget {
    node: WidgetNode,
    kind: Arc<dyn WidgetKind>,
    mode: RenderMode,
}

impl RenderableWidget {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn kind(&self) -> &dyn WidgetKind {
        self.kind.as_ref()
    }

    /// Render this widget and its subtree.
    ///
    /// `inherited` holds props pushed down by the parent; they override the
    /// widget's own values. In view mode invisible children are omitted.
    pub fn render(
        &self,
        factory: &WidgetFactory,
        tree: &WidgetTree,
        snapshot: &EvaluatedDataTree,
        inherited: &PropertyMap,
    ) -> Result<RenderNode, WidgetError> {
        let widget = snapshot.get(&self.node.id).ok_or_else(|| WidgetError::NotEvaluated {
            id: self.node.id.clone(),
        })?;

        let mut props = widget.props.clone();
        for (name, value) in inherited {
            props.insert(name.clone(), value.clone());
        }
        let pushed = self.kind.child_props(&props);

        let mut children = Vec::with_capacity(self.node.children.len());
        for child_id in &self.node.children {
            let child_node = tree.get(child_id).ok_or_else(|| WidgetError::MissingChild {
                parent: self.node.id.clone(),
                child: child_id.clone(),
            })?;
            let rendered = factory
                .create_widget(child_node, self.mode)?
                .render(factory, tree, snapshot, &pushed)?;
            if self.mode == RenderMode::View && !rendered.visible {
                continue;
            }
            children.push(rendered);
        }

        let triggers = self
            .kind
            .trigger_properties()
            .into_iter()
            .filter(|name| self.node.properties.contains_key(*name))
            .map(str::to_string)
            .collect();

        let ctx = RenderContext {
            node: &self.node,
            widget,
            props,
            triggers,
            children,
        };
        Ok(match self.mode {
            RenderMode::Editor => self.kind.render_editor(ctx),
            RenderMode::View => self.kind.render_view(ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registers_every_type() {
        let factory = WidgetFactory::builtin();
        for widget_type in WidgetType::ALL {
            assert!(factory.is_registered(widget_type), "{} missing", widget_type);
        }
    }

    #[test]
    fn unregistered_type_is_rejected() {
        let factory = WidgetFactory::new();
        let node = WidgetNode::new("Chart1", WidgetType::Table);
        let err = factory.create_widget(&node, RenderMode::View).err().unwrap();
        assert_eq!(
            err,
            WidgetError::UnknownWidgetType {
                id: "Chart1".into(),
                widget_type: WidgetType::Table
            }
        );
    }

    #[test]
    fn property_config_finds_schema_entries() {
        let factory = WidgetFactory::builtin();
        assert!(factory.property_config(WidgetType::Popup, "height").is_some());
        assert!(factory.property_config(WidgetType::Popup, "nope").is_none());
    }
}
