use crate::tree::WidgetType;
use crate::widgets::kind::WidgetKind;
use crate::widgets::schema::{PropertyConfig, PropertySection};

pub struct ContainerWidget;

impl WidgetKind for ContainerWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Container
    }

    fn element(&self) -> &'static str {
        "container"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![PropertyConfig::switch("isVisible", "Visible", true).bindable()],
            ),
            PropertySection::new(
                "Style",
                vec![PropertyConfig::text("backgroundColor", "Background Color", "#FFFFFF")],
            ),
        ]
    }
}
