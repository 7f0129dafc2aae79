//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hold a lease on the listing store from reset to terminal state.
    /// Concurrent jobs queue instead of wiping each other's results.
    #[serde(default = "default_serialize_jobs")]
    pub serialize_jobs: bool,

    /// Status message written on success. `{total}` is replaced with the
    /// number of listings found.
    #[serde(default = "default_completion_message")]
    pub completion_message: String,

    /// Finished jobs older than this are pruned. Kept forever when unset.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

fn default_serialize_jobs() -> bool {
    true
}

fn default_completion_message() -> String {
    "Zakończono! Znaleziono {total} ogłoszeń".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            serialize_jobs: default_serialize_jobs(),
            completion_message: default_completion_message(),
            retention_days: None,
        }
    }
}
