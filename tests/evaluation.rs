//! Evaluation passes: ordering, isolation, cycles, incrementality.

mod common;

use common::{session, value, POPUP_PAGE};
use std::sync::Arc;
use widgetbind::expr::Value;
use widgetbind::scheduler::EvalErrorKind;
use widgetbind::tree::TreeEdit;

const CHAIN_PAGE: &str = r#"{
    "pageId": "chain",
    "widgets": [
        {"id": "Canvas", "type": "CANVAS", "children": ["Text1", "Text2", "Text3", "Input1"]},
        {"id": "Text1", "type": "TEXT", "parentId": "Canvas",
         "properties": {"text": "{{ Text2.text + '!' }}"}},
        {"id": "Text2", "type": "TEXT", "parentId": "Canvas",
         "properties": {"text": "{{ Input1.text.toUpperCase() }}"}},
        {"id": "Text3", "type": "TEXT", "parentId": "Canvas",
         "properties": {"text": "static"}},
        {"id": "Input1", "type": "INPUT", "parentId": "Canvas",
         "properties": {"defaultText": "hello"}}
    ]
}"#;

#[test]
fn forward_references_resolve_in_dependency_order() {
    let session = session(CHAIN_PAGE);
    assert_eq!(value(&session, "Text2.text"), Value::from("HELLO"));
    assert_eq!(value(&session, "Text1.text"), Value::from("HELLO!"));

    let order = &session.last_report().unwrap().order;
    let position = |p: &str| order.iter().position(|x| x.to_string() == p).unwrap();
    assert!(position("Input1.text") < position("Text2.text"));
    assert!(position("Text2.text") < position("Text1.text"));
}

#[test]
fn template_with_text_yields_string() {
    let session = session(POPUP_PAGE);
    assert_eq!(value(&session, "Text1.text"), Value::from("Height is 400"));
}

#[test]
fn parse_error_is_scoped_to_its_path() {
    let mut session = session(CHAIN_PAGE);
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text3".into(),
            name: "text".into(),
            value: "{{ 1 + }}".into(),
        })
        .unwrap();

    let err = session.evaluated().error(&"Text3.text".parse().unwrap()).unwrap();
    assert_eq!(err.kind, EvalErrorKind::Parse);
    assert!(matches!(value(&session, "Text3.text"), Value::Error(_)));
    assert_eq!(value(&session, "Text1.text"), Value::from("HELLO!"));
}

#[test]
fn readers_of_a_failed_path_see_an_error() {
    let mut session = session(CHAIN_PAGE);
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text2".into(),
            name: "text".into(),
            value: "{{ Missing.value }}".into(),
        })
        .unwrap();

    let err = session.evaluated().error(&"Text2.text".parse().unwrap()).unwrap();
    assert_eq!(err.kind, EvalErrorKind::Reference);
    assert!(session.evaluated().error(&"Text1.text".parse().unwrap()).is_some());
    assert_eq!(value(&session, "Text3.text"), Value::from("static"));
}

#[test]
fn cycles_are_reported_and_skipped() {
    let mut session = session(CHAIN_PAGE);
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text2".into(),
            name: "text".into(),
            value: "{{ Text1.text }}".into(),
        })
        .unwrap();

    let report = session.last_report().unwrap();
    assert_eq!(report.cycles.len(), 1);
    for path in ["Text1.text", "Text2.text"] {
        let err = session.evaluated().error(&path.parse().unwrap()).unwrap();
        assert_eq!(err.kind, EvalErrorKind::Cycle, "{}", path);
    }
    assert_eq!(value(&session, "Text3.text"), Value::from("static"));
    assert_eq!(value(&session, "Input1.text"), Value::from("hello"));
}

#[test]
fn breaking_a_cycle_clears_its_errors() {
    let mut session = session(CHAIN_PAGE);
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text2".into(),
            name: "text".into(),
            value: "{{ Text1.text }}".into(),
        })
        .unwrap();
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text2".into(),
            name: "text".into(),
            value: "plain".into(),
        })
        .unwrap();

    assert!(session.evaluated().errors().is_empty());
    assert_eq!(value(&session, "Text1.text"), Value::from("plain!"));
}

#[test]
fn identical_pages_evaluate_identically() {
    let a = session(CHAIN_PAGE);
    let b = session(CHAIN_PAGE);
    assert_eq!(a.last_report().unwrap().order, b.last_report().unwrap().order);
    assert_eq!(
        serde_json::to_value(a.evaluated()).unwrap(),
        serde_json::to_value(b.evaluated()).unwrap()
    );
}

#[test]
fn unrelated_widgets_keep_their_snapshot() {
    let mut session = session(POPUP_PAGE);
    let button_before = Arc::clone(session.evaluated().get("Button1").unwrap());
    let text_before = Arc::clone(session.evaluated().get("Text1").unwrap());

    session.set_meta("Popup1", "height", Value::Number(500.0));

    assert!(Arc::ptr_eq(&button_before, session.evaluated().get("Button1").unwrap()));
    assert!(!Arc::ptr_eq(&text_before, session.evaluated().get("Text1").unwrap()));
    assert_eq!(value(&session, "Text1.text"), Value::from("Height is 500"));

    let report = session.last_report().unwrap();
    assert!(report.order.iter().all(|path| path.entity != "Button1"));
}

#[test]
fn editing_an_unread_property_evaluates_only_that_property() {
    let mut session = session(CHAIN_PAGE);
    let before: Vec<_> = ["Canvas", "Text1", "Text2", "Input1"]
        .into_iter()
        .map(|id| (id, Arc::clone(session.evaluated().get(id).unwrap())))
        .collect();

    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Text3".into(),
            name: "text".into(),
            value: "changed".into(),
        })
        .unwrap();

    let report = session.last_report().unwrap();
    assert_eq!(report.order, vec!["Text3.text".parse().unwrap()]);
    assert_eq!(report.changed_widgets, vec!["Text3".to_string()]);
    assert_eq!(value(&session, "Text3.text"), Value::from("changed"));
    for (id, old) in &before {
        assert!(Arc::ptr_eq(old, session.evaluated().get(id).unwrap()), "{} was re-committed", id);
    }
}

#[test]
fn deeply_nested_binding_fails_alone() {
    let deep = format!("{{{{ {}1{} }}}}", "(".repeat(5_000), ")".repeat(5_000));
    let page = CHAIN_PAGE.replace(r#""text": "static""#, &format!(r#""text": "{}""#, deep));
    let session = session(&page);

    let err = session.evaluated().error(&"Text3.text".parse().unwrap()).unwrap();
    assert_eq!(err.kind, EvalErrorKind::Parse);
    assert_eq!(value(&session, "Text1.text"), Value::from("HELLO!"));
}

#[test]
fn out_of_range_values_fall_back_to_the_default() {
    let mut session = session(POPUP_PAGE);
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Popup1".into(),
            name: "height".into(),
            value: Value::Number(1000.0).into(),
        })
        .unwrap();

    assert_eq!(value(&session, "Popup1.height"), Value::Number(400.0));
    let err = session.evaluated().error(&"Popup1.height".parse().unwrap()).unwrap();
    assert_eq!(err.kind, EvalErrorKind::Validation);
}

#[test]
fn derived_properties_follow_their_inputs() {
    let session = session(CHAIN_PAGE);
    assert_eq!(value(&session, "Input1.isValid"), Value::Bool(true));
}
