//! Execution configuration types
//!
//! Workspace placement, concurrency cap, output bounds and per-language
//! toolchain overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Directory under which per-run workspaces are created
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Maximum number of toolchain or sandbox runs in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Maximum captured bytes per output stream
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
    /// How long to keep draining pipes after a forced kill
    #[serde(default = "default_kill_grace", with = "humantime_serde")]
    pub kill_grace: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            workspace_root: default_workspace_root(),
            max_concurrency: default_max_concurrency(),
            max_output_bytes: default_max_output(),
            kill_grace: default_kill_grace(),
        }
    }
}

fn default_workspace_root() -> PathBuf {
    crate::config::paths::workspace_dir()
}

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_output() -> usize {
    1024 * 1024 // 1MB
}

fn default_kill_grace() -> Duration {
    Duration::from_millis(500)
}

/// Per-language override of toolchain binaries and phase timeouts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOverride {
    /// Interpreter or runner binary (e.g. `python3.12`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Compiler binary (e.g. `clang`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    /// Compile phase timeout
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub compile_timeout: Option<Duration>,
    /// Run phase timeout
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub run_timeout: Option<Duration>,
}
