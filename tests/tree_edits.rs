//! Tree edits through a session: atomicity and re-evaluation.

mod common;

use common::{document, session, value, POPUP_PAGE};
use widgetbind::config::EngineConfig;
use widgetbind::expr::Value;
use widgetbind::session::{Collaborators, Session, SessionError};
use widgetbind::tree::{QueryDef, TreeEdit, TreeError, WidgetNode, WidgetType};

#[test]
fn moving_a_widget_under_its_descendant_is_rejected() {
    let mut session = session(POPUP_PAGE);
    let before = session.tree().clone();

    let err = session
        .apply_edit(TreeEdit::Reparent {
            id: "Popup1".into(),
            new_parent: "Text2".into(),
            index: None,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Tree(TreeError::TreeInvariantViolation { .. })
    ));
    assert_eq!(session.tree(), &before);
    session.tree().validate().unwrap();
}

#[test]
fn duplicate_ids_are_rejected_without_side_effects() {
    let mut session = session(POPUP_PAGE);
    let version = session.evaluated().version();

    let err = session
        .apply_edit(TreeEdit::AddWidget {
            node: WidgetNode::new("Text1", WidgetType::Text).with_parent("Canvas"),
            index: None,
        })
        .unwrap_err();

    assert!(matches!(err, SessionError::Tree(TreeError::DuplicateId { .. })));
    assert_eq!(session.evaluated().version(), version);
}

#[test]
fn removing_a_widget_removes_its_subtree() {
    let mut session = session(POPUP_PAGE);
    session
        .apply_edit(TreeEdit::AddWidget {
            node: WidgetNode::new("Text3", WidgetType::Text).with_parent("Popup1"),
            index: None,
        })
        .unwrap();
    let outcome = session
        .apply_edit(TreeEdit::RemoveWidget { id: "Popup1".into() })
        .unwrap();

    let removed: Vec<&str> = outcome.removed.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(removed, vec!["Popup1", "Text2", "Text3"]);
    assert!(session.evaluated().get("Text2").is_none());
    assert!(!session.meta().is_registered("Text3"));
    session.tree().validate().unwrap();

    // The reader of the removed popup now reports a reference error.
    assert!(session.evaluated().error(&"Text1.text".parse().unwrap()).is_some());
}

#[test]
fn added_widgets_are_evaluated_and_bindable() {
    let mut session = session(POPUP_PAGE);
    session
        .apply_edit(TreeEdit::AddWidget {
            node: WidgetNode::new("Text3", WidgetType::Text)
                .with_parent("Canvas")
                .with_property("text", "{{ Text1.text }} px"),
            index: Some(0),
        })
        .unwrap();

    assert_eq!(value(&session, "Text3.text"), Value::from("Height is 400 px"));
    assert_eq!(session.tree().get("Canvas").unwrap().children[0], "Text3");
}

#[test]
fn reorder_keeps_every_value() {
    let mut session = session(POPUP_PAGE);
    session
        .apply_edit(TreeEdit::Reorder {
            id: "Popup1".into(),
            index: 0,
        })
        .unwrap();

    assert_eq!(session.tree().get("Canvas").unwrap().children[0], "Popup1");
    assert_eq!(value(&session, "Text1.text"), Value::from("Height is 400"));
}

#[test]
fn removing_a_binding_falls_back_to_schema_default() {
    let mut session = session(POPUP_PAGE);
    session
        .apply_edit(TreeEdit::RemoveProperty {
            id: "Button1".into(),
            name: "text".into(),
        })
        .unwrap();
    assert_eq!(value(&session, "Button1.text"), Value::from("Submit"));
}

#[test]
fn unknown_widget_types_fail_to_load() {
    let mut doc = document(POPUP_PAGE);
    doc.widgets[2].widget_type = "CHART".into();
    let err = Session::from_document(doc, EngineConfig::default(), Collaborators::default()).unwrap_err();
    assert!(matches!(err, SessionError::Tree(TreeError::UnknownWidgetType { .. })));
}

#[test]
fn widget_ids_cannot_shadow_queries_or_the_store() {
    let mut doc = document(POPUP_PAGE);
    doc.queries.push(QueryDef {
        id: "Users".into(),
        run_on_load: false,
        params: serde_json::Value::Null,
    });
    let mut session = Session::from_document(doc, EngineConfig::default(), Collaborators::default()).unwrap();
    let before = session.tree().clone();

    for id in ["Users", "store"] {
        let err = session
            .apply_edit(TreeEdit::AddWidget {
                node: WidgetNode::new(id, WidgetType::Text).with_parent("Canvas"),
                index: None,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::Tree(TreeError::IdInUse { .. })), "{}", id);
    }

    assert_eq!(session.tree(), &before);
    assert!(!session.meta().is_registered("Users"));
    assert_eq!(session.source("Users").unwrap()["isLoading"], Value::Bool(false));
}

#[test]
fn queries_sharing_a_widget_id_fail_to_load() {
    let mut doc = document(POPUP_PAGE);
    doc.queries.push(QueryDef {
        id: "Text1".into(),
        run_on_load: false,
        params: serde_json::Value::Null,
    });
    let err = Session::from_document(doc, EngineConfig::default(), Collaborators::default()).unwrap_err();
    assert!(matches!(err, SessionError::Tree(ref tree) if *tree == TreeError::id_in_use("Text1", "a query")));
}
