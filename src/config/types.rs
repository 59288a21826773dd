use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scheduler::CoalescePolicy;
use crate::tree::RenderMode;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Evaluation pass settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// How change batches queued during a pass are combined.
    #[serde(default)]
    pub coalesce: CoalescePolicy,
}

/// Trigger execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Timeout for a single remote action in milliseconds (default: 10000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Max actions a single trigger may run (default: 32).
    #[serde(default = "default_max_actions")]
    pub max_actions: usize,
}

impl ActionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_actions: default_max_actions(),
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Mode used when a caller does not pick one.
    #[serde(default)]
    pub mode: RenderMode,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_actions() -> usize {
    32
}
