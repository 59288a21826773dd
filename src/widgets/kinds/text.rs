use crate::tree::WidgetType;
use crate::widgets::kind::WidgetKind;
use crate::widgets::schema::{PropertyConfig, PropertySection};

pub struct TextWidget;

impl WidgetKind for TextWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Text
    }

    fn element(&self) -> &'static str {
        "text"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![
                    PropertyConfig::text("text", "Text", ""),
                    PropertyConfig::switch("isVisible", "Visible", true).bindable(),
                ],
            ),
            PropertySection::new(
                "Style",
                vec![PropertyConfig::number("fontSize", "Font Size", 14.0, Some(8.0), Some(72.0))],
            ),
        ]
    }
}
