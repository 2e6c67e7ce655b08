//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// This loads `.env` file if present and overlays any set environment
/// variables onto the config. Env vars have the highest precedence:
/// defaults < file < env. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();

    // Execution overrides
    if let Ok(root) = std::env::var("POLYRUN_WORKSPACE_ROOT") {
        config.execution.workspace_root = std::path::PathBuf::from(root);
    }
    if let Ok(v) = std::env::var("POLYRUN_MAX_CONCURRENCY") {
        if let Ok(v) = v.parse() {
            config.execution.max_concurrency = v;
        }
    }
    if let Ok(v) = std::env::var("POLYRUN_MAX_OUTPUT_BYTES") {
        if let Ok(v) = v.parse() {
            config.execution.max_output_bytes = v;
        }
    }

    // Sandbox overrides
    if let Ok(v) = std::env::var("POLYRUN_SANDBOX_TIME_BUDGET") {
        if let Ok(v) = humantime_serde::re::humantime::parse_duration(&v) {
            config.sandbox.time_budget = v;
        }
    }

    // Server overrides
    if let Ok(bind) = std::env::var("POLYRUN_BIND") {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("POLYRUN_PORT") {
        if let Ok(port) = port.parse() {
            config.server.port = port;
        }
    }

    // Logging overrides
    if let Ok(level) = std::env::var("POLYRUN_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(format) = std::env::var("POLYRUN_LOG_FORMAT") {
        if let Ok(format) = format.parse() {
            config.logging.format = format;
        }
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageOverride;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 4100;
        config.languages.insert(
            "python".to_string(),
            LanguageOverride {
                program: Some("python3.11".to_string()),
                run_timeout: Some(Duration::from_secs(2)),
                ..Default::default()
            },
        );
        save_config(&config, &path).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.server.port, 4100);
        assert_eq!(loaded.languages["python"], config.languages["python"]);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::default();
        save_config(&config, &path).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.sandbox.time_budget, config.sandbox.time_budget);
        assert_eq!(loaded.execution.workspace_root, config.execution.workspace_root);
    }

    #[test]
    fn test_partial_json5_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ // comment\n execution: { max_concurrency: 2 }, }").unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.execution.max_concurrency, 2);
        assert_eq!(loaded.server.port, 3000);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "execution = 5").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
