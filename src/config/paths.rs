//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("POLYRUN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("polyrun"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("polyrun"))
                .unwrap_or_else(|| PathBuf::from(".polyrun"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("POLYRUN_CONFIG") {
        return PathBuf::from(path);
    }

    let dir = config_dir();
    let toml = dir.join("config.toml");
    if toml.exists() {
        return toml;
    }
    dir.join("config.json")
}

/// Get the root under which per-run workspaces are created
///
/// Workspaces are short-lived, so this lives in the system temp directory
/// rather than in the user's data directory.
pub fn workspace_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("POLYRUN_WORKSPACE_ROOT") {
        return PathBuf::from(dir);
    }

    std::env::temp_dir().join("polyrun")
}
