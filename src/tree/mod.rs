//! Persisted widget configuration tree.
//!
//! The tree is the single source of persisted widget configuration. All
//! mutations go through [`WidgetTree::apply`], which validates an edit fully
//! before touching any node.

mod document;
mod edit;
mod error;
mod node;

pub use document::{check_widget_id, QueryDef, TreeDocument, WidgetRecord};
pub use edit::{EditOutcome, TreeEdit, WidgetTree};
pub use error::TreeError;
pub use node::{PropertyValue, RenderMode, WidgetNode, WidgetType};
