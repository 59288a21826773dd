use crate::tree::WidgetType;
use crate::widgets::kind::WidgetKind;
use crate::widgets::schema::{PropertyConfig, PropertySection};

/// Page root; lays out its children and nothing else.
pub struct CanvasWidget;

impl WidgetKind for CanvasWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Canvas
    }

    fn element(&self) -> &'static str {
        "canvas"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![PropertySection::new(
            "Style",
            vec![PropertyConfig::text("backgroundColor", "Background Color", "")],
        )]
    }
}
