//! Widget meta-state overlay.
//!
//! ```text
//! MetaIntent ──▶ MetaReducer ──▶ MetaState ──▶ MetaStore (RwLock swap)
//! ```
//!
//! Meta values override evaluated props and are never written back to the
//! persisted tree.

mod intent;
mod reducer;
mod state;
mod store;

pub use intent::{MetaIntent, MetaTransaction, MetaWrite};
pub use reducer::{MetaReducer, Reducer};
pub use state::MetaState;
pub use store::MetaStore;
