//! Persisted page layout: a flat list of widget records plus page queries.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::edit::WidgetTree;
use super::error::TreeError;
use super::node::{PropertyValue, RenderMode, WidgetNode, WidgetType};
use crate::graph::STORE_ENTITY;

/// Serialized page: widget records plus the page's queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    #[serde(default)]
    pub page_id: String,
    pub widgets: Vec<WidgetRecord>,
    #[serde(default)]
    pub queries: Vec<QueryDef>,
}

/// One widget as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub render_mode: RenderMode,
}

/// A named remote query whose results are addressable as `<id>.data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDef {
    pub id: String,
    #[serde(default)]
    pub run_on_load: bool,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl TreeDocument {
    pub fn from_json(text: &str) -> Result<Self, TreeError> {
        serde_json::from_str(text).map_err(|e| TreeError::InvalidDocument {
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, TreeError> {
        serde_json::to_string_pretty(self).map_err(|e| TreeError::InvalidDocument {
            message: e.to_string(),
        })
    }

    /// Build and validate the widget tree described by this document.
    ///
    /// Rejects duplicate ids, unknown types, missing or multiple roots and
    /// any parent/children mismatch. Widgets, queries and the store share one
    /// namespace, so a query id may not repeat or shadow any other entity.
    pub fn to_tree(&self) -> Result<WidgetTree, TreeError> {
        let mut nodes: IndexMap<String, WidgetNode> = IndexMap::with_capacity(self.widgets.len());
        let mut roots = Vec::new();

        let mut query_ids = IndexSet::with_capacity(self.queries.len());
        for query in &self.queries {
            if query.id == STORE_ENTITY {
                return Err(TreeError::id_in_use(&query.id, "the global store"));
            }
            if !query_ids.insert(query.id.as_str()) {
                return Err(TreeError::id_in_use(&query.id, "another query"));
            }
        }

        for record in &self.widgets {
            if nodes.contains_key(&record.id) {
                return Err(TreeError::DuplicateId { id: record.id.clone() });
            }
            check_widget_id(&record.id, &self.queries)?;
            let widget_type: WidgetType =
                record
                    .widget_type
                    .parse()
                    .map_err(|type_name| TreeError::UnknownWidgetType {
                        id: record.id.clone(),
                        type_name,
                    })?;
            let unique_children: IndexSet<&String> = record.children.iter().collect();
            if unique_children.len() != record.children.len() {
                return Err(TreeError::violation(format!(
                    "widget '{}' lists a child more than once",
                    record.id
                )));
            }
            if record.parent_id.is_none() {
                roots.push(record.id.clone());
            }
            nodes.insert(
                record.id.clone(),
                WidgetNode {
                    id: record.id.clone(),
                    widget_type,
                    parent_id: record.parent_id.clone(),
                    children: record.children.clone(),
                    properties: record
                        .properties
                        .iter()
                        .map(|(name, json)| (name.clone(), PropertyValue::from_json(json)))
                        .collect(),
                    render_mode: record.render_mode,
                },
            );
        }

        let root = match roots.as_slice() {
            [root] => root.clone(),
            [] => {
                return Err(TreeError::InvalidDocument {
                    message: "document has no root widget".to_string(),
                })
            }
            _ => {
                return Err(TreeError::InvalidDocument {
                    message: format!("document has multiple root widgets: {}", roots.join(", ")),
                })
            }
        };

        let tree = WidgetTree::from_parts(nodes, root);
        tree.validate()?;
        Ok(tree)
    }

    /// Serialize a tree (pre-order) together with the given queries.
    pub fn from_tree(page_id: &str, tree: &WidgetTree, queries: Vec<QueryDef>) -> Self {
        let widgets = tree
            .preorder()
            .into_iter()
            .map(|node| WidgetRecord {
                id: node.id.clone(),
                widget_type: node.widget_type.as_str().to_string(),
                parent_id: node.parent_id.clone(),
                children: node.children.clone(),
                properties: node
                    .properties
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
                render_mode: node.render_mode,
            })
            .collect();
        Self {
            page_id: page_id.to_string(),
            widgets,
            queries,
        }
    }
}

/// Reject a widget id that names the store or one of the page's queries.
pub fn check_widget_id(id: &str, queries: &[QueryDef]) -> Result<(), TreeError> {
    if id == STORE_ENTITY {
        return Err(TreeError::id_in_use(id, "the global store"));
    }
    if queries.iter().any(|query| query.id == id) {
        return Err(TreeError::id_in_use(id, "a query"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "pageId": "home",
        "widgets": [
            {"id": "Canvas", "type": "CANVAS", "children": ["Text1"]},
            {"id": "Text1", "type": "TEXT", "parentId": "Canvas",
             "properties": {"text": "Hello {{ Input1.text }}", "fontSize": 14}}
        ]
    }"#;

    #[test]
    fn parses_bindings_and_literals() {
        let tree = TreeDocument::from_json(PAGE).unwrap().to_tree().unwrap();
        let text = tree.get("Text1").unwrap();
        assert!(text.property("text").unwrap().is_dynamic());
        assert!(!text.property("fontSize").unwrap().is_dynamic());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        let dup = doc.widgets[1].clone();
        doc.widgets.push(dup);
        assert_eq!(doc.to_tree().unwrap_err(), TreeError::DuplicateId { id: "Text1".into() });
    }

    #[test]
    fn non_mutual_links_are_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        doc.widgets[0].children.clear();
        assert!(matches!(
            doc.to_tree().unwrap_err(),
            TreeError::TreeInvariantViolation { .. }
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        doc.widgets[1].widget_type = "CHART".into();
        assert!(matches!(doc.to_tree().unwrap_err(), TreeError::UnknownWidgetType { .. }));
    }

    fn query(id: &str) -> QueryDef {
        QueryDef {
            id: id.into(),
            run_on_load: false,
            params: serde_json::Value::Null,
        }
    }

    #[test]
    fn query_named_like_a_widget_is_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        doc.queries.push(query("Text1"));
        assert_eq!(doc.to_tree().unwrap_err(), TreeError::id_in_use("Text1", "a query"));
    }

    #[test]
    fn repeated_or_store_query_ids_are_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        doc.queries = vec![query("Users"), query("Users")];
        assert_eq!(doc.to_tree().unwrap_err(), TreeError::id_in_use("Users", "another query"));

        doc.queries = vec![query("store")];
        assert_eq!(doc.to_tree().unwrap_err(), TreeError::id_in_use("store", "the global store"));
    }

    #[test]
    fn widget_named_store_is_rejected() {
        let mut doc = TreeDocument::from_json(PAGE).unwrap();
        doc.widgets[1].id = "store".into();
        doc.widgets[0].children = vec!["store".into()];
        assert_eq!(doc.to_tree().unwrap_err(), TreeError::id_in_use("store", "the global store"));
    }

    #[test]
    fn round_trips_through_tree() {
        let doc = TreeDocument::from_json(PAGE).unwrap();
        let tree = doc.to_tree().unwrap();
        let back = TreeDocument::from_tree("home", &tree, Vec::new());
        assert_eq!(back.to_tree().unwrap(), tree);
    }
}
