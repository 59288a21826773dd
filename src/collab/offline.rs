use async_trait::async_trait;

use super::error::RemoteError;
use super::traits::RemoteActions;
use crate::expr::Value;

/// Remote collaborator for sessions without a backend: every action is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteActions for OfflineRemote {
    async fn invoke(&self, action_id: &str, _params: Value) -> Result<Value, RemoteError> {
        Err(RemoteError::UnknownAction {
            action_id: action_id.to_string(),
        })
    }
}
