//! Shared test utilities and mock collaborators.

#![allow(dead_code, unused_imports)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use widgetbind::collab::{Notice, Notifier, Persistence, PersistenceError, RemoteActions, RemoteError};
use widgetbind::config::EngineConfig;
use widgetbind::expr::Value;
use widgetbind::session::{Collaborators, Session};
use widgetbind::tree::TreeDocument;

/// Page used across tests: a button that opens a popup and a text that
/// reads the popup's height.
pub const POPUP_PAGE: &str = r#"{
    "pageId": "home",
    "widgets": [
        {"id": "Canvas", "type": "CANVAS", "children": ["Button1", "Text1", "Popup1"]},
        {"id": "Button1", "type": "BUTTON", "parentId": "Canvas",
         "properties": {"text": "Open", "onClick": "{{ showModal('Popup1') }}"}},
        {"id": "Text1", "type": "TEXT", "parentId": "Canvas",
         "properties": {"text": "Height is {{ Popup1.height }}"}},
        {"id": "Popup1", "type": "POPUP", "parentId": "Canvas", "children": ["Text2"],
         "properties": {"height": 400, "onClose": "{{ showAlert('closed') }}"}},
        {"id": "Text2", "type": "TEXT", "parentId": "Popup1",
         "properties": {"text": "Inside"}}
    ]
}"#;

pub fn document(json: &str) -> TreeDocument {
    TreeDocument::from_json(json).expect("test page should parse")
}

pub fn session(json: &str) -> Session {
    session_with(json, EngineConfig::default(), Collaborators::default())
}

pub fn session_with(json: &str, config: EngineConfig, collaborators: Collaborators) -> Session {
    Session::from_document(document(json), config, collaborators).expect("session should load")
}

/// Current evaluated value at `entity.property`.
pub fn value(session: &Session, path: &str) -> Value {
    session
        .evaluated()
        .value(&path.parse().expect("valid path"))
        .cloned()
        .unwrap_or_else(|| panic!("{} has no value", path))
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Remote actions with canned responses and an optional delay.
#[derive(Default)]
pub struct MockRemote {
    responses: HashMap<String, Result<Value, RemoteError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, action_id: &str, value: Value) -> Self {
        self.responses.insert(action_id.to_string(), Ok(value));
        self
    }

    pub fn fail(mut self, action_id: &str, message: &str) -> Self {
        self.responses.insert(
            action_id.to_string(),
            Err(RemoteError::Failed {
                action_id: action_id.to_string(),
                message: message.to_string(),
            }),
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RemoteActions for MockRemote {
    async fn invoke(&self, action_id: &str, params: Value) -> Result<Value, RemoteError> {
        self.calls.lock().push((action_id.to_string(), params));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(action_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(RemoteError::UnknownAction {
                    action_id: action_id.to_string(),
                })
            })
    }
}

/// Persistence backed by a map.
#[derive(Default)]
pub struct MemoryPersistence {
    pages: Mutex<HashMap<String, TreeDocument>>,
}

impl MemoryPersistence {
    pub fn with_page(self, document: TreeDocument) -> Self {
        self.pages.lock().insert(document.page_id.clone(), document);
        self
    }

    pub fn page(&self, page_id: &str) -> Option<TreeDocument> {
        self.pages.lock().get(page_id).cloned()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn load_tree(&self, page_id: &str) -> Result<TreeDocument, PersistenceError> {
        self.page(page_id).ok_or_else(|| PersistenceError::NotFound {
            page_id: page_id.to_string(),
        })
    }

    async fn save_tree(&self, page_id: &str, document: &TreeDocument) -> Result<(), PersistenceError> {
        self.pages.lock().insert(page_id.to_string(), document.clone());
        Ok(())
    }
}

/// Collaborators wired to the given mocks.
pub fn collaborators(remote: Arc<MockRemote>, notifier: Arc<RecordingNotifier>) -> Collaborators {
    Collaborators { remote, notifier }
}
