//! Pass queue coalescing as seen through a session.

mod common;

use common::{session_with, value, POPUP_PAGE};
use widgetbind::config::EngineConfig;
use widgetbind::expr::Value;
use widgetbind::graph::EntityPath;
use widgetbind::scheduler::{Changed, CoalescePolicy};
use widgetbind::session::Collaborators;

fn path(s: &str) -> EntityPath {
    s.parse().unwrap()
}

fn config(coalesce: CoalescePolicy) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.evaluation.coalesce = coalesce;
    config
}

#[test]
fn merge_folds_pending_batches_into_one_pass() {
    let mut session = session_with(POPUP_PAGE, config(CoalescePolicy::Merge), Collaborators::default());
    let version = session.evaluated().version();

    session.enqueue(Changed::path(path("Popup1.height")));
    session.enqueue(Changed::path(path("Button1.text")));
    assert_eq!(session.flush(), 1);
    assert_eq!(session.evaluated().version(), version + 1);

    let order = &session.last_report().unwrap().order;
    assert!(order.contains(&path("Text1.text")));
    assert!(order.contains(&path("Button1.text")));
}

#[test]
fn defer_runs_one_pass_per_batch() {
    let mut session = session_with(POPUP_PAGE, config(CoalescePolicy::Defer), Collaborators::default());
    let version = session.evaluated().version();

    session.enqueue(Changed::path(path("Popup1.height")));
    session.enqueue(Changed::path(path("Button1.text")));
    assert_eq!(session.flush(), 2);
    assert_eq!(session.evaluated().version(), version + 2);

    let order = &session.last_report().unwrap().order;
    assert_eq!(order, &vec![path("Button1.text")]);
}

#[test]
fn flush_with_nothing_pending_runs_no_pass() {
    let mut session = session_with(POPUP_PAGE, EngineConfig::default(), Collaborators::default());
    let version = session.evaluated().version();
    assert_eq!(session.flush(), 0);
    assert_eq!(session.evaluated().version(), version);
}

#[test]
fn passes_see_only_committed_writes() {
    let mut session = session_with(POPUP_PAGE, config(CoalescePolicy::Defer), Collaborators::default());
    session.set_meta("Popup1", "height", Value::Number(210.0));
    session.set_meta("Popup1", "height", Value::Number(220.0));
    assert_eq!(value(&session, "Text1.text"), Value::from("Height is 220"));
}
