//! Dependency graph between entity paths.
//!
//! ```text
//! WidgetTree + WidgetFactory ──build_graph──▶ EvaluationGraph
//!        bindings scanned lexically        nodes: entity.property
//!                                          edges: reader ──▶ read
//! ```

mod builder;
mod evaluation;
mod path;

pub use builder::{build_graph, scan_references};
pub use evaluation::{EvaluationGraph, NodeKind};
pub use path::EntityPath;

/// Global key/value entity written by `storeValue`.
pub const STORE_ENTITY: &str = "store";

/// Properties every query data source exposes.
pub const QUERY_PROPERTIES: [&str; 3] = ["data", "isLoading", "error"];
