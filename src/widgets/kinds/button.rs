use crate::expr::{PropertyMap, Value};
use crate::tree::WidgetType;
use crate::widgets::kind::{EventResponse, WidgetEvent, WidgetKind};
use crate::widgets::schema::{PropertyConfig, PropertySection};

pub struct ButtonWidget;

impl WidgetKind for ButtonWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Button
    }

    fn element(&self) -> &'static str {
        "button"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![
                    PropertyConfig::text("text", "Label", "Submit"),
                    PropertyConfig::switch("isDisabled", "Disabled", false).bindable(),
                    PropertyConfig::switch("isVisible", "Visible", true).bindable(),
                ],
            ),
            PropertySection::new("Actions", vec![PropertyConfig::action("onClick", "onClick")]),
        ]
    }

    fn handle_event(&self, props: &PropertyMap, event: &WidgetEvent) -> Option<EventResponse> {
        match event {
            WidgetEvent::Click if !props.get("isDisabled").is_some_and(Value::is_truthy) => {
                Some(EventResponse::trigger("onClick"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_button_ignores_clicks() {
        let mut props = PropertyMap::new();
        props.insert("isDisabled".into(), Value::Bool(true));
        assert!(ButtonWidget.handle_event(&props, &WidgetEvent::Click).is_none());

        props.insert("isDisabled".into(), Value::Bool(false));
        let response = ButtonWidget.handle_event(&props, &WidgetEvent::Click).unwrap();
        assert_eq!(response.trigger, Some("onClick"));
    }
}
