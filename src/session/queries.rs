//! Page queries that run when the page loads.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::collab::RemoteActions;
use crate::expr::{EntityMap, PropertyMap, Value};
use crate::graph::{EntityPath, QUERY_PROPERTIES};
use crate::scheduler::{Changed, PassQueue};
use crate::tree::QueryDef;

/// Initial state of a query source that has never run.
pub(crate) fn idle_source() -> PropertyMap {
    source_state(Value::Null, false, Value::Null)
}

pub(crate) fn source_state(data: Value, is_loading: bool, error: Value) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("data".to_string(), data);
    props.insert("isLoading".to_string(), Value::Bool(is_loading));
    props.insert("error".to_string(), error);
    props
}

pub(crate) fn source_paths(id: &str) -> Changed {
    Changed::paths(QUERY_PROPERTIES.map(|name| EntityPath::new(id, name)))
}

/// Spawns on-load queries and publishes their results as data sources.
///
/// Results are written into the shared source map and announced on the pass
/// queue; the owning session drains the queue.
pub(crate) struct QueryLoader {
    pub sources: Arc<RwLock<EntityMap>>,
    pub queue: Arc<PassQueue>,
    pub remote: Arc<dyn RemoteActions>,
    pub timeout: Duration,
}

impl QueryLoader {
    /// Mark `query` as loading and spawn its invocation onto `tasks`.
    pub fn spawn(&self, query: &QueryDef, tasks: &mut JoinSet<()>) {
        let id = query.id.clone();
        self.sources
            .write()
            .insert(id.clone(), source_state(Value::Loading, true, Value::Null));
        self.queue.enqueue(source_paths(&id));

        let sources = Arc::clone(&self.sources);
        let queue = Arc::clone(&self.queue);
        let remote = Arc::clone(&self.remote);
        let timeout = self.timeout;
        let params = Value::from(&query.params);

        tasks.spawn(async move {
            let state = match tokio::time::timeout(timeout, remote.invoke(&id, params)).await {
                Ok(Ok(data)) => {
                    info!(query = %id, "Query loaded");
                    source_state(data, false, Value::Null)
                }
                Ok(Err(err)) => {
                    warn!(query = %id, error = %err, "Query failed");
                    source_state(Value::Null, false, Value::from(err.to_string()))
                }
                Err(_) => {
                    warn!(query = %id, timeout_ms = timeout.as_millis() as u64, "Query timed out");
                    source_state(
                        Value::Null,
                        false,
                        Value::from(format!("query '{}' timed out", id)),
                    )
                }
            };
            sources.write().insert(id.clone(), state);
            queue.enqueue(source_paths(&id));
        });
    }
}
