use crate::expr::{PropertyMap, Value};
use crate::tree::WidgetType;
use crate::widgets::kind::{EventResponse, WidgetEvent, WidgetKind};
use crate::widgets::schema::{DerivedProperty, PropertyConfig, PropertySection};

pub struct TableWidget;

impl WidgetKind for TableWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Table
    }

    fn element(&self) -> &'static str {
        "table"
    }

    fn property_pane(&self) -> Vec<PropertySection> {
        vec![
            PropertySection::new(
                "General",
                vec![
                    PropertyConfig::array("tableData", "Table Data"),
                    PropertyConfig::switch("isVisible", "Visible", true).bindable(),
                ],
            ),
            PropertySection::new(
                "Actions",
                vec![PropertyConfig::action("onRowSelected", "onRowSelected")],
            ),
        ]
    }

    fn meta_defaults(&self) -> PropertyMap {
        let mut defaults = PropertyMap::new();
        defaults.insert("selectedRowIndex".to_string(), Value::Number(-1.0));
        defaults
    }

    fn derived_properties(&self) -> Vec<DerivedProperty> {
        vec![DerivedProperty {
            name: "selectedRow",
            expression: "{{ this.selectedRowIndex >= 0 ? this.tableData[this.selectedRowIndex] : null }}",
        }]
    }

    fn handle_event(&self, _props: &PropertyMap, event: &WidgetEvent) -> Option<EventResponse> {
        match event {
            WidgetEvent::RowSelected { index } => Some(
                EventResponse::trigger("onRowSelected")
                    .with_meta("selectedRowIndex", Value::Number(*index as f64)),
            ),
            _ => None,
        }
    }
}
