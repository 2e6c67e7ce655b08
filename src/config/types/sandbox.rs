//! Sandbox configuration types
//!
//! Limits enforced by the embedded interpreter itself, independent of the
//! OS-level run timeout that backs it up.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedded interpreter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Execution-time budget enforced by the interpreter's interrupt handler
    #[serde(default = "default_time_budget", with = "humantime_serde")]
    pub time_budget: Duration,
    /// Heap limit for one interpreter runtime
    #[serde(default = "default_memory_limit")]
    pub memory_limit_bytes: usize,
    /// Native stack limit for one interpreter runtime
    #[serde(default = "default_max_stack")]
    pub max_stack_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            time_budget: default_time_budget(),
            memory_limit_bytes: default_memory_limit(),
            max_stack_bytes: default_max_stack(),
        }
    }
}

fn default_time_budget() -> Duration {
    Duration::from_secs(5)
}

fn default_memory_limit() -> usize {
    64 * 1024 * 1024 // 64MB
}

fn default_max_stack() -> usize {
    1024 * 1024 // 1MB
}
