use crate::expr::{PropertyMap, Value};
use crate::tree::WidgetType;
use crate::widgets::kind::{EventResponse, WidgetEvent, WidgetKind};
use crate::widgets::schema::{DerivedProperty, PropertyConfig, PropertySection};

/// Text input. `text` starts as `defaultText`; typing overrides it through
/// meta state until the widget is reset.
pub struct InputWidget;

impl WidgetKind for InputWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Input
    }

    fn element(&self) -> &'static str {
        "input"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![
                    PropertyConfig::text("label", "Label", ""),
                    PropertyConfig::text("defaultText", "Default Text", ""),
                    PropertyConfig::switch("isRequired", "Required", false).bindable(),
                    PropertyConfig::switch("isVisible", "Visible", true).bindable(),
                ],
            ),
            PropertySection::new(
                "Actions",
                vec![PropertyConfig::action("onTextChanged", "onTextChanged")],
            ),
        ]
    }

    fn derived_properties(&self) -> Vec<DerivedProperty> {
        vec![
            DerivedProperty {
                name: "text",
                expression: "{{ this.defaultText }}",
            },
            DerivedProperty {
                name: "isValid",
                expression: "{{ !this.isRequired || this.text.length > 0 }}",
            },
        ]
    }

    fn handle_event(&self, _props: &PropertyMap, event: &WidgetEvent) -> Option<EventResponse> {
        match event {
            WidgetEvent::TextChanged { text } => Some(
                EventResponse::trigger("onTextChanged").with_meta("text", Value::from(text.as_str())),
            ),
            _ => None,
        }
    }
}
