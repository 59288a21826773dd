//! Widget composition and reactive binding engine.
//!
//! A page is a tree of widgets whose properties may hold `{{ }}` bindings.
//! Bindings are scanned into a dependency graph and re-evaluated
//! incrementally whenever the tree, the meta overlay or a data source
//! changes. Trigger properties hold action lists run in response to events.

pub mod actions;
pub mod collab;
pub mod config;
pub mod expr;
pub mod graph;
pub mod logging;
pub mod meta;
pub mod scheduler;
pub mod session;
pub mod tree;
pub mod widgets;
