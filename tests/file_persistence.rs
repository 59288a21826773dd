mod common;

use common::{document, POPUP_PAGE};
use tempfile::TempDir;
use widgetbind::collab::{FilePersistence, Persistence, PersistenceError};
use widgetbind::config::EngineConfig;
use widgetbind::expr::Value;
use widgetbind::session::{Collaborators, Session};
use widgetbind::tree::TreeEdit;

#[tokio::test]
async fn saved_document_loads_back_unchanged() {
    let dir = TempDir::new().unwrap();
    let persistence = FilePersistence::new(dir.path().join("pages"));
    let doc = document(POPUP_PAGE);

    persistence.save_tree("home", &doc).await.unwrap();
    assert!(persistence.page_path("home").unwrap().exists());
    assert!(!persistence.page_path("home").unwrap().with_extension("json.tmp").exists());

    let loaded = persistence.load_tree("home").await.unwrap();
    assert_eq!(loaded, doc);
}

#[tokio::test]
async fn missing_page_is_not_found() {
    let dir = TempDir::new().unwrap();
    let persistence = FilePersistence::new(dir.path());
    let err = persistence.load_tree("ghost").await.unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound { ref page_id } if page_id == "ghost"));
}

#[tokio::test]
async fn page_ids_cannot_leave_the_store_directory() {
    let dir = TempDir::new().unwrap();
    let persistence = FilePersistence::new(dir.path().join("pages"));
    let doc = document(POPUP_PAGE);

    for page_id in ["../x", "a/b", "..", "a\\b", ""] {
        let err = persistence.save_tree(page_id, &doc).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidPageId { .. }), "{:?}", page_id);
        let err = persistence.load_tree(page_id).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidPageId { .. }), "{:?}", page_id);
    }
    assert!(!dir.path().join("x.json").exists());
}

#[tokio::test]
async fn corrupt_page_is_a_document_error() {
    let dir = TempDir::new().unwrap();
    let persistence = FilePersistence::new(dir.path());
    std::fs::write(persistence.page_path("bad").unwrap(), "{ not json").unwrap();
    let err = persistence.load_tree("bad").await.unwrap_err();
    assert!(matches!(err, PersistenceError::Document(_)));
}

#[tokio::test]
async fn session_edits_persist_but_meta_does_not() {
    let dir = TempDir::new().unwrap();
    let persistence = FilePersistence::new(dir.path());
    persistence.save_tree("home", &document(POPUP_PAGE)).await.unwrap();

    let mut session = Session::load(&persistence, "home", EngineConfig::default(), Collaborators::default())
        .await
        .unwrap();
    session
        .apply_edit(TreeEdit::SetProperty {
            id: "Popup1".into(),
            name: "height".into(),
            value: Value::Number(500.0).into(),
        })
        .unwrap();
    session.set_meta("Popup1", "isVisible", Value::Bool(true));
    session.save(&persistence).await.unwrap();

    let reloaded = Session::load(&persistence, "home", EngineConfig::default(), Collaborators::default())
        .await
        .unwrap();
    let height = reloaded.evaluated().value(&"Popup1.height".parse().unwrap()).cloned();
    let visible = reloaded.evaluated().value(&"Popup1.isVisible".parse().unwrap()).cloned();
    assert_eq!(height, Some(Value::Number(500.0)));
    assert_eq!(visible, Some(Value::Bool(false)));
}
