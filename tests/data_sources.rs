//! Page queries, loading placeholders and the scratch store.

mod common;

use common::{collaborators, document, MemoryPersistence, MockRemote, RecordingNotifier};
use std::sync::Arc;
use std::time::Duration;
use widgetbind::config::EngineConfig;
use widgetbind::expr::Value;
use widgetbind::session::Session;
use widgetbind::tree::RenderMode;

const QUERY_PAGE: &str = r#"{
    "pageId": "users",
    "widgets": [
        {"id": "Canvas", "type": "CANVAS", "children": ["Table1", "Text1"]},
        {"id": "Table1", "type": "TABLE", "parentId": "Canvas",
         "properties": {"tableData": "{{ Users.data }}"}},
        {"id": "Text1", "type": "TEXT", "parentId": "Canvas",
         "properties": {"text": "{{ Users.isLoading ? 'Loading' : 'Ready' }}"}}
    ],
    "queries": [
        {"id": "Users", "runOnLoad": true, "params": {"limit": 2}}
    ]
}"#;

fn rows() -> Value {
    Value::List(vec![Value::from("ada"), Value::from("grace")])
}

fn path_value(session: &Session, path: &str) -> Value {
    session
        .evaluated()
        .value(&path.parse().unwrap())
        .cloned()
        .unwrap()
}

async fn loaded(remote: MockRemote) -> (Session, Arc<MockRemote>) {
    let remote = Arc::new(remote);
    let persistence = MemoryPersistence::default().with_page(document(QUERY_PAGE));
    let session = Session::load(
        &persistence,
        "users",
        EngineConfig::default(),
        collaborators(Arc::clone(&remote), Arc::new(RecordingNotifier::default())),
    )
    .await
    .unwrap();
    (session, remote)
}

#[tokio::test(start_paused = true)]
async fn unresolved_query_reads_as_loading() {
    let (mut session, remote) = loaded(
        MockRemote::new()
            .respond("Users", rows())
            .with_delay(Duration::from_millis(100)),
    )
    .await;

    assert_eq!(path_value(&session, "Table1.tableData"), Value::Loading);
    assert_eq!(path_value(&session, "Text1.text"), Value::from("Loading"));
    let view = session.render(Some(RenderMode::View)).unwrap();
    assert!(view.find("Table1").unwrap().loading);

    session.settle().await;

    assert_eq!(path_value(&session, "Table1.tableData"), rows());
    assert_eq!(path_value(&session, "Text1.text"), Value::from("Ready"));
    assert_eq!(session.pending_loads(), 0);

    let calls = remote.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, Value::from(serde_json::json!({"limit": 2})));
}

#[tokio::test]
async fn failed_query_exposes_its_error() {
    let (mut session, _) = loaded(MockRemote::new()).await;
    session.settle().await;

    let source = session.source("Users").unwrap();
    assert_eq!(source["data"], Value::Null);
    assert_eq!(source["isLoading"], Value::Bool(false));
    assert!(source["error"].to_display_string().contains("Users"));
    assert_eq!(path_value(&session, "Users.isLoading"), Value::Bool(false));
    assert_eq!(path_value(&session, "Table1.tableData"), Value::Null);
}

#[tokio::test]
async fn queries_start_idle_without_run_on_load() {
    let doc = document(&QUERY_PAGE.replace("\"runOnLoad\": true", "\"runOnLoad\": false"));
    let session = Session::from_document(doc, EngineConfig::default(), Default::default()).unwrap();
    assert_eq!(session.pending_loads(), 0);
    assert_eq!(path_value(&session, "Users.isLoading"), Value::Bool(false));
    assert_eq!(path_value(&session, "Text1.text"), Value::from("Ready"));
}

#[tokio::test]
async fn saved_page_round_trips_through_persistence() {
    let persistence = MemoryPersistence::default().with_page(document(QUERY_PAGE));
    let session = Session::load(&persistence, "users", EngineConfig::default(), Default::default())
        .await
        .unwrap();
    session.save(&persistence).await.unwrap();

    let saved = persistence.page("users").unwrap();
    assert_eq!(saved.queries, document(QUERY_PAGE).queries);
    assert_eq!(saved.to_tree().unwrap(), session.tree().clone());
}

#[tokio::test]
async fn missing_page_is_reported() {
    let persistence = MemoryPersistence::default();
    let err = Session::load(&persistence, "nope", EngineConfig::default(), Default::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nope"));
}
