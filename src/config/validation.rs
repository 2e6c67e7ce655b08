//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;
use crate::languages::AdapterRegistry;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_execution_config(config, result);
    result = validate_sandbox_config(config, result);
    result = validate_language_overrides(config, result);

    result
}

fn validate_execution_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.execution.max_concurrency == 0 {
        result = result.with_error(
            ValidationIssue::new("execution.max_concurrency", "Concurrency limit of 0 would block every run")
                .with_suggestion("Set execution.max_concurrency to at least 1"),
        );
    }

    if config.execution.max_output_bytes == 0 {
        result = result.with_warning(
            ValidationIssue::new("execution.max_output_bytes", "All program output will be discarded")
                .with_suggestion("Raise execution.max_output_bytes (default is 1MB)"),
        );
    }

    if config.execution.workspace_root.is_relative() {
        result = result.with_warning(
            ValidationIssue::new(
                "execution.workspace_root",
                format!(
                    "Workspace root is relative and depends on the working directory: {}",
                    config.execution.workspace_root.display()
                ),
            )
            .with_suggestion("Use an absolute path"),
        );
    }

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.sandbox.time_budget.is_zero() {
        result = result.with_error(
            ValidationIssue::new("sandbox.time_budget", "Sandbox time budget must be greater than zero")
                .with_suggestion("Set sandbox.time_budget, e.g. \"5s\""),
        );
    }

    // The interpreter budget should trip before the OS-level watchdog does.
    let registry = AdapterRegistry::with_builtin();
    if let Some(js) = registry.get("javascript") {
        let watchdog = config
            .languages
            .get(js.id())
            .and_then(|o| o.run_timeout)
            .unwrap_or(js.timeouts().run);
        if config.sandbox.time_budget >= watchdog {
            result = result.with_warning(
                ValidationIssue::new(
                    "sandbox.time_budget",
                    format!(
                        "Sandbox budget {:?} is not shorter than the javascript run timeout {:?}",
                        config.sandbox.time_budget, watchdog
                    ),
                )
                .with_suggestion("Lower sandbox.time_budget or raise languages.javascript.run_timeout"),
            );
        }
    }

    result
}

fn validate_language_overrides(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let registry = AdapterRegistry::with_builtin();

    let mut keys: Vec<&String> = config.languages.keys().collect();
    keys.sort();
    for key in keys {
        let over = &config.languages[key];
        if registry.get(key).map(|a| a.id()) != Some(key.as_str()) {
            result = result.with_warning(
                ValidationIssue::new(format!("languages.{}", key), "Not a language id; override is ignored")
                    .with_suggestion(format!("Known languages: {}", registry.ids().join(", "))),
            );
            continue;
        }
        if over.run_timeout.is_some_and(|t| t.is_zero()) {
            result = result.with_error(ValidationIssue::new(
                format!("languages.{}.run_timeout", key),
                "Run timeout must be greater than zero",
            ));
        }
        if over.compile_timeout.is_some_and(|t| t.is_zero()) {
            result = result.with_error(ValidationIssue::new(
                format!("languages.{}.compile_timeout", key),
                "Compile timeout must be greater than zero",
            ));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageOverride;
    use std::time::Duration;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = validate_config(&config);

        assert!(result.errors.is_empty());
        assert!(result.valid);
    }

    #[test]
    fn test_zero_concurrency_is_an_error() {
        let mut config = Config::default();
        config.execution.max_concurrency = 0;
        let result = validate_config(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "execution.max_concurrency");
    }

    #[test]
    fn test_unknown_language_override_warns() {
        let mut config = Config::default();
        config.languages.insert("cobol".to_string(), LanguageOverride::default());
        let result = validate_config(&config);

        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.path == "languages.cobol"));
    }

    #[test]
    fn test_budget_longer_than_watchdog_warns() {
        let mut config = Config::default();
        config.sandbox.time_budget = Duration::from_secs(60);
        let result = validate_config(&config);

        assert!(result.warnings.iter().any(|w| w.path == "sandbox.time_budget"));
    }
}
