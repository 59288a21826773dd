use thiserror::Error;

/// Errors raised while parsing or running a trigger binding.
///
/// A trigger error aborts the remaining actions of its own sequence only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerError {
    #[error("Invalid trigger binding: {message}")]
    Parse { message: String },

    #[error("Action '{action}' failed: {message}")]
    TriggerActionError { action: String, message: String },

    #[error("Action '{action_id}' timed out after {timeout_ms}ms")]
    Timeout { action_id: String, timeout_ms: u64 },

    #[error("Trigger has {count} actions, the limit is {max}")]
    TooManyActions { count: usize, max: usize },
}

impl TriggerError {
    pub fn parse(message: impl Into<String>) -> Self {
        TriggerError::Parse {
            message: message.into(),
        }
    }

    pub fn action(action: &str, message: impl Into<String>) -> Self {
        TriggerError::TriggerActionError {
            action: action.to_string(),
            message: message.into(),
        }
    }
}
