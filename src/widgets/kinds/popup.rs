use crate::expr::{PropertyMap, Value};
use crate::tree::{RenderMode, WidgetType};
use crate::widgets::kind::{EventResponse, WidgetEvent, WidgetKind};
use crate::widgets::render::{RenderContext, RenderNode};
use crate::widgets::schema::{PropertyConfig, PropertySection};

/// Modal overlay. Hidden until `showModal` flips its `isVisible` meta state.
pub struct PopupWidget;

impl PopupWidget {
    fn close() -> EventResponse {
        EventResponse::trigger("onClose").with_meta("isVisible", Value::Bool(false))
    }
}

impl WidgetKind for PopupWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Popup
    }

    fn element(&self) -> &'static str {
        "modal"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![
                    PropertyConfig::number("height", "Height", 400.0, Some(200.0), Some(800.0)),
                    PropertyConfig::switch("canOutsideClickClose", "Quick Dismiss", false),
                    PropertyConfig::switch("rounded", "Rounded", false),
                ],
            ),
            PropertySection::new("Actions", vec![PropertyConfig::action("onClose", "onClose")]),
        ]
    }

    fn meta_defaults(&self) -> PropertyMap {
        let mut defaults = PropertyMap::new();
        defaults.insert("isVisible".to_string(), Value::Bool(false));
        defaults
    }

    fn child_props(&self, props: &PropertyMap) -> PropertyMap {
        let mut pushed = PropertyMap::new();
        pushed.insert(
            "isVisible".to_string(),
            props.get("isVisible").cloned().unwrap_or(Value::Bool(false)),
        );
        pushed.insert(
            "minHeight".to_string(),
            props.get("height").cloned().unwrap_or(Value::Null),
        );
        pushed
    }

    fn handle_event(&self, props: &PropertyMap, event: &WidgetEvent) -> Option<EventResponse> {
        match event {
            WidgetEvent::ModalClose => Some(Self::close()),
            // A click on the backdrop.
            WidgetEvent::Click if props.get("canOutsideClickClose").is_some_and(Value::is_truthy) => {
                Some(Self::close())
            }
            _ => None,
        }
    }

    fn render_editor(&self, ctx: RenderContext<'_>) -> RenderNode {
        let name = ctx.node.id.clone();
        RenderNode::from_context(self.element(), RenderMode::Editor, ctx).with_label(name)
    }
}
