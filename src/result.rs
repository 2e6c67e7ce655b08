//! Execution outcomes and the wire envelope
//!
//! Every stage reports through [`ExecutionOutcome`]; [`ExecutionReport`] adds
//! the language and wall-clock duration, and [`RunResponse`] is the flat shape
//! returned to callers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The stage a timeout happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Compile,
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Compile => write!(f, "compilation"),
            Phase::Run => write!(f, "execution"),
        }
    }
}

/// Terminal result of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Ran to completion with exit code 0
    Success {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The compiler rejected the source; nothing was run
    CompileFailure { log: String },
    /// Non-zero exit, signal, or an uncaught error in the sandbox
    RuntimeFailure {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// Killed after exceeding its limit; output is whatever was captured
    Timeout {
        stdout: String,
        stderr: String,
        phase: Phase,
        #[serde(with = "humantime_serde")]
        limit: Duration,
    },
    /// The compiler or interpreter is not installed
    ToolchainMissing { tool: String, hint: String },
    /// No adapter for the requested language
    Unsupported { language: String },
    /// A fault inside the engine itself
    InternalError { message: String },
}

impl ExecutionOutcome {
    pub fn internal(message: impl Into<String>) -> Self {
        ExecutionOutcome::InternalError {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, ExecutionOutcome::Timeout { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionOutcome::Success { exit_code, .. }
            | ExecutionOutcome::RuntimeFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Text for the `output` field
    pub fn output(&self) -> String {
        match self {
            ExecutionOutcome::Success { stdout, stderr, .. } => {
                let mut output = stdout.clone();
                if !stderr.is_empty() {
                    if !output.is_empty() && !output.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push_str(stderr);
                }
                output
            }
            ExecutionOutcome::RuntimeFailure { stdout, .. } | ExecutionOutcome::Timeout { stdout, .. } => {
                stdout.clone()
            }
            _ => String::new(),
        }
    }

    /// Text for the `error` field; `None` only for success
    pub fn error(&self) -> Option<String> {
        match self {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::CompileFailure { log } => Some(if log.trim().is_empty() {
                "Compilation failed".to_string()
            } else {
                log.clone()
            }),
            ExecutionOutcome::RuntimeFailure {
                stderr, exit_code, ..
            } => Some(if !stderr.is_empty() {
                stderr.clone()
            } else {
                match exit_code {
                    Some(code) => format!("Process exited with code {}", code),
                    None => "Process terminated abnormally".to_string(),
                }
            }),
            ExecutionOutcome::Timeout {
                stderr, phase, limit, ..
            } => {
                let mut message = format!(
                    "{} timed out after {}",
                    capitalize(&phase.to_string()),
                    humantime_serde::re::humantime::format_duration(*limit)
                );
                if !stderr.is_empty() {
                    message.push('\n');
                    message.push_str(stderr);
                }
                Some(message)
            }
            ExecutionOutcome::ToolchainMissing { tool, hint } => {
                Some(format!("'{}' was not found. {}", tool, hint))
            }
            ExecutionOutcome::Unsupported { language } => {
                Some(format!("cannot run this language: {}", language))
            }
            ExecutionOutcome::InternalError { message } => Some(format!("internal error: {}", message)),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// An outcome with its language and measured duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub language: String,
    pub outcome: ExecutionOutcome,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl ExecutionReport {
    pub fn new(language: impl Into<String>, outcome: ExecutionOutcome, duration: Duration) -> Self {
        Self {
            language: language.into(),
            outcome,
            duration,
        }
    }

    pub fn to_response(&self) -> RunResponse {
        RunResponse {
            output: self.outcome.output(),
            error: self.outcome.error(),
            execution_time: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: self.outcome.exit_code(),
            timed_out: self.outcome.timed_out().then_some(true),
        }
    }
}

/// Wire shape of a run result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub output: String,
    /// Always present; `null` on success
    pub error: Option<String>,
    /// Milliseconds
    pub execution_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
}

impl From<ExecutionReport> for RunResponse {
    fn from(report: ExecutionReport) -> Self {
        report.to_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let report = ExecutionReport::new(
            "javascript",
            ExecutionOutcome::Success {
                stdout: "2\n".into(),
                stderr: String::new(),
                exit_code: None,
            },
            Duration::from_millis(12),
        );
        let json = serde_json::to_value(report.to_response()).unwrap();
        assert_eq!(json, serde_json::json!({"output": "2\n", "error": null, "executionTime": 12}));
    }

    #[test]
    fn test_success_with_stderr_keeps_error_null() {
        let outcome = ExecutionOutcome::Success {
            stdout: "a".into(),
            stderr: "warn\n".into(),
            exit_code: Some(0),
        };
        assert_eq!(outcome.output(), "a\nwarn\n");
        assert_eq!(outcome.error(), None);
    }

    #[test]
    fn test_runtime_failure_surfaces_stderr() {
        let outcome = ExecutionOutcome::RuntimeFailure {
            stdout: "partial".into(),
            stderr: "Traceback...\n".into(),
            exit_code: Some(1),
        };
        let response = ExecutionReport::new("python", outcome, Duration::ZERO).to_response();
        assert_eq!(response.output, "partial");
        assert_eq!(response.error.as_deref(), Some("Traceback...\n"));
        assert_eq!(response.exit_code, Some(1));
        assert_eq!(response.timed_out, None);
    }

    #[test]
    fn test_runtime_failure_without_stderr() {
        let outcome = ExecutionOutcome::RuntimeFailure {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(2),
        };
        assert_eq!(outcome.error().as_deref(), Some("Process exited with code 2"));
    }

    #[test]
    fn test_timeout_envelope() {
        let outcome = ExecutionOutcome::Timeout {
            stdout: "tick\n".into(),
            stderr: String::new(),
            phase: Phase::Run,
            limit: Duration::from_secs(2),
        };
        let response = ExecutionReport::new("bash", outcome, Duration::from_millis(2003)).to_response();
        assert_eq!(response.timed_out, Some(true));
        assert_eq!(response.output, "tick\n");
        assert_eq!(response.error.as_deref(), Some("Execution timed out after 2s"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["timedOut"], true);
        assert_eq!(json["executionTime"], 2003);
    }

    #[test]
    fn test_error_texts() {
        let missing = ExecutionOutcome::ToolchainMissing {
            tool: "python3".into(),
            hint: "Install Python 3".into(),
        };
        assert_eq!(missing.error().as_deref(), Some("'python3' was not found. Install Python 3"));

        let unsupported = ExecutionOutcome::Unsupported {
            language: "cobol".into(),
        };
        assert_eq!(unsupported.error().as_deref(), Some("cannot run this language: cobol"));

        let compile = ExecutionOutcome::CompileFailure { log: String::new() };
        assert_eq!(compile.error().as_deref(), Some("Compilation failed"));
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(ExecutionOutcome::internal("boom")).unwrap();
        assert_eq!(json["kind"], "internal_error");
        assert_eq!(json["message"], "boom");
    }
}
