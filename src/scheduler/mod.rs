//! Incremental evaluation scheduler.
//!
//! A pass takes a set of changed paths, widens it to everything that reads
//! them, excludes cycle members, evaluates the rest in a stable topological
//! order against a pass-local context and commits a new
//! [`EvaluatedDataTree`]. The [`PassQueue`] makes sure passes never overlap.

mod error;
mod pass;
mod queue;
mod snapshot;

pub use error::{EvalError, EvalErrorKind};
pub use pass::{reevaluate, Changed, PassInputs, PassOutcome, PassReport};
pub use queue::{CoalescePolicy, PassQueue};
pub use snapshot::{EvaluatedDataTree, EvaluatedWidget};
