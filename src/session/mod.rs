//! A loaded page: persisted tree, meta overlay, data sources and the latest
//! evaluated snapshot, kept consistent across edits, events and triggers.
//!
//! ```text
//! edit / meta write / source write ──▶ PassQueue ──▶ reevaluate ──▶ EvaluatedDataTree
//!                                                                       │
//!                          render(mode) ◀── WidgetFactory ◀─────────────┘
//! ```

mod error;
mod queries;

pub use error::SessionError;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::actions::{ActionHost, ActionRunner, TriggerOutcome};
use crate::collab::{Notifier, OfflineRemote, Persistence, RemoteActions, TracingNotifier};
use crate::config::EngineConfig;
use crate::expr::{EntityMap, PropertyMap, Value};
use crate::graph::{build_graph, EntityPath, EvaluationGraph, STORE_ENTITY};
use crate::meta::{MetaStore, MetaTransaction};
use crate::scheduler::{reevaluate, Changed, EvaluatedDataTree, PassInputs, PassQueue, PassReport};
use crate::tree::{
    check_widget_id, EditOutcome, PropertyValue, QueryDef, RenderMode, TreeDocument, TreeEdit, WidgetTree,
};
use crate::widgets::{RenderNode, WidgetError, WidgetEvent, WidgetFactory};
use queries::{idle_source, QueryLoader};

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub remote: Arc<dyn RemoteActions>,
    pub notifier: Arc<dyn Notifier>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            remote: Arc::new(OfflineRemote),
            notifier: Arc::new(TracingNotifier),
        }
    }
}

/// One page being edited or viewed.
pub struct Session {
    page_id: String,
    tree: WidgetTree,
    queries: Vec<QueryDef>,
    factory: WidgetFactory,
    config: EngineConfig,
    graph: EvaluationGraph,
    graph_stale: bool,
    meta: MetaStore,
    sources: Arc<RwLock<EntityMap>>,
    evaluated: EvaluatedDataTree,
    queue: Arc<PassQueue>,
    loads: JoinSet<()>,
    collaborators: Collaborators,
    last_report: Option<PassReport>,
}

impl Session {
    /// Build a session from a persisted document and run the first pass.
    ///
    /// On-load queries are not started; see [`Session::run_on_load`].
    pub fn from_document(
        document: TreeDocument,
        config: EngineConfig,
        collaborators: Collaborators,
    ) -> Result<Self, SessionError> {
        let tree = document.to_tree()?;
        let factory = WidgetFactory::builtin();

        let meta = MetaStore::new();
        for node in tree.preorder() {
            meta.register(&node.id, factory.kind_for(node)?.meta_defaults());
        }

        let mut sources = EntityMap::new();
        sources.insert(STORE_ENTITY.to_string(), PropertyMap::new());
        for query in &document.queries {
            sources.insert(query.id.clone(), idle_source());
        }

        let graph = build_graph(&tree, &factory, &sources, &meta.snapshot())?;
        let queue = Arc::new(PassQueue::new(config.evaluation.coalesce));

        let mut session = Self {
            page_id: document.page_id,
            tree,
            queries: document.queries,
            factory,
            config,
            graph,
            graph_stale: false,
            meta,
            sources: Arc::new(RwLock::new(sources)),
            evaluated: EvaluatedDataTree::default(),
            queue,
            loads: JoinSet::new(),
            collaborators,
            last_report: None,
        };
        session.queue.enqueue(Changed::All);
        session.flush();

        info!(
            page_id = %session.page_id,
            widgets = session.tree.len(),
            nodes = session.graph.len(),
            "Session ready"
        );
        Ok(session)
    }

    /// Load a page from persistence and start its on-load queries.
    pub async fn load(
        persistence: &dyn Persistence,
        page_id: &str,
        config: EngineConfig,
        collaborators: Collaborators,
    ) -> Result<Self, SessionError> {
        let document = persistence.load_tree(page_id).await?;
        let mut session = Self::from_document(document, config, collaborators)?;
        session.run_on_load();
        Ok(session)
    }

    pub async fn save(&self, persistence: &dyn Persistence) -> Result<(), SessionError> {
        persistence.save_tree(&self.page_id, &self.document()).await?;
        info!(page_id = %self.page_id, "Page saved");
        Ok(())
    }

    /// Start every query marked `runOnLoad`. Their sources read as loading
    /// until [`Session::settle`] (or a later flush) picks up the results.
    pub fn run_on_load(&mut self) {
        let loader = QueryLoader {
            sources: Arc::clone(&self.sources),
            queue: Arc::clone(&self.queue),
            remote: Arc::clone(&self.collaborators.remote),
            timeout: self.config.actions.timeout(),
        };
        let mut started = 0;
        for query in self.queries.iter().filter(|q| q.run_on_load) {
            loader.spawn(query, &mut self.loads);
            started += 1;
        }
        if started > 0 {
            debug!(started, "On-load queries started");
            self.flush();
        }
    }

    /// Wait for in-flight queries, then evaluate everything they changed.
    pub async fn settle(&mut self) -> usize {
        while self.loads.join_next().await.is_some() {}
        self.flush()
    }

    pub fn pending_loads(&self) -> usize {
        self.loads.len()
    }

    /// Apply a tree edit and re-evaluate what it touched.
    ///
    /// The edit is rejected before any state changes if it would introduce a
    /// widget of an unregistered type, or one whose id names the store or a
    /// query.
    pub fn apply_edit(&mut self, edit: TreeEdit) -> Result<EditOutcome, SessionError> {
        if let TreeEdit::AddWidget { node, .. } = &edit {
            self.factory.kind_for(node)?;
            check_widget_id(&node.id, &self.queries)?;
        }
        let outcome = self.tree.apply(edit)?;

        for node in &outcome.removed {
            self.meta.remove(&node.id);
        }
        for id in &outcome.added {
            if let Some(node) = self.tree.get(id) {
                self.meta.register(id, self.factory.kind_for(node)?.meta_defaults());
            }
        }

        if outcome.is_structural() {
            self.graph_stale = true;
            self.queue.enqueue(Changed::All);
        } else if let Some((id, name)) = &outcome.property {
            self.graph_stale = true;
            self.queue.enqueue(Changed::path(EntityPath::new(id.as_str(), name.as_str())));
        }
        debug!(
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "Tree edit applied"
        );
        self.flush();
        Ok(outcome)
    }

    /// Write one meta value and re-evaluate. Writes to unknown widgets are
    /// ignored.
    pub fn set_meta(&mut self, widget: &str, property: &str, value: Value) -> Vec<EntityPath> {
        self.commit_meta_transaction(MetaTransaction::new().set(widget, property, value))
    }

    /// Restore a widget's meta to its defaults.
    pub fn reset_meta(&mut self, widget: &str) -> Vec<EntityPath> {
        let changed = self.meta.reset(widget);
        // Runtime-only keys dropped by the reset leave the graph too.
        let remaining = self.meta.get(widget);
        if changed.iter().any(|path| !remaining.contains_key(&path.property)) {
            self.graph_stale = true;
        }
        self.announce(changed.clone());
        changed
    }

    /// Apply every write of `transaction` as one meta transition.
    pub fn commit_meta_transaction(&mut self, transaction: MetaTransaction) -> Vec<EntityPath> {
        let changed = self.meta.commit(transaction);
        self.announce(changed.clone());
        changed
    }

    /// Queue a change batch without running a pass.
    pub fn enqueue(&self, changed: Changed) {
        self.queue.enqueue(changed);
    }

    /// Run passes until the queue is empty; returns the number of passes.
    pub fn flush(&mut self) -> usize {
        let queue = Arc::clone(&self.queue);
        queue.drain(|changed| self.run_pass(&changed))
    }

    /// Deliver a UI event to a widget and run the trigger it selects.
    ///
    /// Returns `None` when the widget ignores the event or has no binding for
    /// the selected trigger.
    pub async fn fire_event(
        &mut self,
        widget: &str,
        event: WidgetEvent,
    ) -> Result<Option<TriggerOutcome>, SessionError> {
        let node = self.tree.get(widget).ok_or_else(|| SessionError::UnknownWidget {
            id: widget.to_string(),
        })?;
        let kind = Arc::clone(self.factory.kind_for(node)?);
        let props = self
            .evaluated
            .get(widget)
            .map(|w| w.props.clone())
            .unwrap_or_default();

        let Some(response) = kind.handle_event(&props, &event) else {
            debug!(widget, event = event.event_type(), "Event ignored");
            return Ok(None);
        };
        let binding = response
            .trigger
            .and_then(|name| node.properties.get(name))
            .and_then(|value| match value {
                PropertyValue::Binding(source) => Some(source.clone()),
                PropertyValue::Literal(_) => None,
            });

        let mut transaction = MetaTransaction::new();
        for (property, value) in response.meta_writes {
            transaction = transaction.set(widget, &property, value);
        }
        self.commit_meta_transaction(transaction);

        match binding {
            Some(binding) => Ok(Some(self.run_trigger(widget, &binding, event.to_value()).await?)),
            None => Ok(None),
        }
    }

    /// Run a trigger binding on behalf of `owner`.
    pub async fn run_trigger(
        &mut self,
        owner: &str,
        binding: &str,
        event: Value,
    ) -> Result<TriggerOutcome, SessionError> {
        let remote = Arc::clone(&self.collaborators.remote);
        let notifier = Arc::clone(&self.collaborators.notifier);
        let actions = self.config.actions.clone();
        let runner = ActionRunner::new(remote.as_ref(), notifier.as_ref(), &actions);
        Ok(runner.run_binding(self, owner, binding, event).await?)
    }

    /// Render the whole page. `mode` defaults to the configured mode.
    pub fn render(&self, mode: Option<RenderMode>) -> Result<RenderNode, WidgetError> {
        let mode = mode.unwrap_or(self.config.render.mode);
        let root = self.tree.get(self.tree.root_id()).ok_or_else(|| WidgetError::NotEvaluated {
            id: self.tree.root_id().to_string(),
        })?;
        self.factory
            .create_widget(root, mode)?
            .render(&self.factory, &self.tree, &self.evaluated, &PropertyMap::new())
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn evaluated(&self) -> &EvaluatedDataTree {
        &self.evaluated
    }

    pub fn graph(&self) -> &EvaluationGraph {
        &self.graph
    }

    pub fn meta(&self) -> &MetaStore {
        &self.meta
    }

    pub fn factory(&self) -> &WidgetFactory {
        &self.factory
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Diagnostics of the most recent pass.
    pub fn last_report(&self) -> Option<&PassReport> {
        self.last_report.as_ref()
    }

    /// Current values of a data source.
    pub fn source(&self, id: &str) -> Option<PropertyMap> {
        self.sources.read().get(id).cloned()
    }

    /// The persisted form of the current tree.
    pub fn document(&self) -> TreeDocument {
        TreeDocument::from_tree(&self.page_id, &self.tree, self.queries.clone())
    }

    fn announce(&mut self, changed: Vec<EntityPath>) {
        if changed.iter().any(|path| !self.graph.contains(path)) {
            self.graph_stale = true;
        }
        self.queue.enqueue(Changed::paths(changed));
        self.flush();
    }

    fn write_source_props(&mut self, source: &str, props: PropertyMap) {
        let changed: Vec<EntityPath> = {
            let mut sources = self.sources.write();
            let entry = sources.entry(source.to_string()).or_default();
            let mut changed = Vec::new();
            for (name, value) in props {
                if entry.get(&name) != Some(&value) {
                    changed.push(EntityPath::new(source, name.as_str()));
                    entry.insert(name, value);
                }
            }
            changed
        };
        self.announce(changed);
    }

    fn run_pass(&mut self, changed: &Changed) {
        let sources = self.sources.read().clone();
        let meta = self.meta.snapshot();

        let stale = self.graph_stale
            || match changed {
                Changed::All => false,
                Changed::Paths(paths) => paths.iter().any(|path| !self.graph.contains(path)),
            };
        if stale {
            match build_graph(&self.tree, &self.factory, &sources, &meta) {
                Ok(graph) => {
                    self.graph = graph;
                    self.graph_stale = false;
                }
                Err(err) => {
                    // Widgets are type-checked on insert, so this only fires
                    // for kinds unregistered after load.
                    debug!(error = %err, "Keeping previous graph");
                }
            }
        }

        let inputs = PassInputs {
            tree: &self.tree,
            factory: &self.factory,
            meta: &meta,
            sources: &sources,
        };
        let outcome = reevaluate(changed, &self.graph, &inputs, &self.evaluated);
        self.evaluated = outcome.tree;
        self.last_report = Some(outcome.report);
    }
}

impl ActionHost for Session {
    fn snapshot(&self) -> &EvaluatedDataTree {
        &self.evaluated
    }

    fn commit_meta(&mut self, transaction: MetaTransaction) {
        self.commit_meta_transaction(transaction);
    }

    fn reset_widget(&mut self, widget: &str) {
        self.reset_meta(widget);
    }

    fn store_value(&mut self, key: &str, value: Value) {
        let mut props = PropertyMap::new();
        props.insert(key.to_string(), value);
        self.write_source_props(STORE_ENTITY, props);
    }

    fn write_source(&mut self, source: &str, props: PropertyMap) {
        self.write_source_props(source, props);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("page_id", &self.page_id)
            .field("widgets", &self.tree.len())
            .field("version", &self.evaluated.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{WidgetNode, WidgetType};

    fn document() -> TreeDocument {
        let mut tree = WidgetTree::new(WidgetNode::new("Canvas", WidgetType::Canvas));
        for node in [
            WidgetNode::new("Text1", WidgetType::Text)
                .with_parent("Canvas")
                .with_property("text", "{{ store.greeting }}"),
            WidgetNode::new("Popup1", WidgetType::Popup)
                .with_parent("Canvas")
                .with_property("height", 400.0),
        ] {
            tree.apply(TreeEdit::AddWidget { node, index: None }).unwrap();
        }
        TreeDocument::from_tree("home", &tree, Vec::new())
    }

    fn session() -> Session {
        Session::from_document(document(), EngineConfig::default(), Collaborators::default()).unwrap()
    }

    fn value(session: &Session, path: &str) -> Value {
        session.evaluated().value(&path.parse().unwrap()).cloned().unwrap()
    }

    #[test]
    fn first_pass_evaluates_every_widget() {
        let session = session();
        assert_eq!(value(&session, "Popup1.height"), Value::Number(400.0));
        assert_eq!(value(&session, "Popup1.isVisible"), Value::Bool(false));
        assert_eq!(value(&session, "Text1.text"), Value::Null);
        assert_eq!(session.evaluated().version(), 1);
    }

    #[test]
    fn store_writes_reach_readers() {
        let mut session = session();
        session.store_value("greeting", Value::from("hi"));
        assert_eq!(value(&session, "Text1.text"), Value::from("hi"));
    }

    #[test]
    fn added_widget_gets_meta_defaults() {
        let mut session = session();
        session
            .apply_edit(TreeEdit::AddWidget {
                node: WidgetNode::new("Popup2", WidgetType::Popup).with_parent("Canvas"),
                index: None,
            })
            .unwrap();
        assert!(session.meta().is_registered("Popup2"));
        assert_eq!(value(&session, "Popup2.isVisible"), Value::Bool(false));
    }

    #[test]
    fn removed_widget_leaves_snapshot_and_meta() {
        let mut session = session();
        session
            .apply_edit(TreeEdit::RemoveWidget { id: "Popup1".into() })
            .unwrap();
        assert!(session.evaluated().get("Popup1").is_none());
        assert!(!session.meta().is_registered("Popup1"));
    }

    #[test]
    fn meta_write_to_new_property_rebuilds_graph() {
        let mut session = session();
        session.set_meta("Popup1", "title", Value::from("Hello"));
        assert!(session.graph().contains(&"Popup1.title".parse().unwrap()));
        assert_eq!(value(&session, "Popup1.title"), Value::from("Hello"));
    }

    #[test]
    fn reset_drops_runtime_only_meta_properties() {
        let mut session = session();
        session.set_meta("Popup1", "title", Value::from("Hello"));
        session.reset_meta("Popup1");

        let title: EntityPath = "Popup1.title".parse().unwrap();
        assert!(!session.graph().contains(&title));
        assert!(session.evaluated().value(&title).is_none());
        assert!(!session.evaluated().get("Popup1").unwrap().props.contains_key("title"));
        assert_eq!(value(&session, "Popup1.isVisible"), Value::Bool(false));
    }
}
