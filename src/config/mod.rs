//! Configuration module - Modular configuration management
//!
//! - types/mod.rs: Core configuration types (Config, ServerConfig, LoggingConfig)
//! - types/execution.rs: Workspace, concurrency and per-language overrides
//! - types/sandbox.rs: Embedded interpreter limits
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
pub(crate) mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, LogFormat, LoggingConfig, ServerConfig};

// Re-export execution types
pub use types::execution::{ExecutionConfig, LanguageOverride};

// Re-export sandbox types
pub use types::sandbox::SandboxConfig;

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path, workspace_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
