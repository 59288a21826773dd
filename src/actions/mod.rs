//! Trigger bindings: parse into typed action calls, run them in order.
//!
//! ```text
//! "{{ showModal('Popup1'); storeValue('k', Input1.text) }}"
//!     └─ parse_trigger ─▶ [ShowModal, StoreValue] ─▶ ActionRunner ─▶ ActionHost
//! ```

mod call;
mod error;
mod interpreter;

pub use call::{parse_trigger, ActionCall, AssignTarget};
pub use error::TriggerError;
pub use interpreter::{ActionHost, ActionRunner, TriggerOutcome};
