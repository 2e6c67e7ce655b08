//! Engine - the single entry point for running and checking code
//!
//! An [`Engine`] owns its [`Config`], the read-only adapter registry and a
//! semaphore capping concurrent runs. It is cheap to clone and safe to share
//! across tasks. `run` and `check` always return a result value; every failure
//! is converted into an outcome at the stage where it happened.

pub mod executor;
pub mod phase;
pub mod stopwatch;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::checker::CheckReport;
use crate::config::Config;
use crate::exec::SandboxLimits;
use crate::languages::{describe, AdapterRegistry, LanguageAdapter, LanguageInfo, PhaseTimeouts, Resolution, Runtime};
use crate::result::{ExecutionOutcome, ExecutionReport, Phase};

pub use executor::{ExecutionJob, Executed, Executor, ProcessLimits, SandboxExecutor, ToolchainExecutor};
pub use phase::{ExecutionPhase, PhaseTracker};
pub use stopwatch::Stopwatch;

/// Request to run code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Fed to the program's stdin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Request to statically check code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl CheckRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

struct Inner {
    config: Config,
    registry: AdapterRegistry,
    permits: Semaphore,
}

/// Code execution and static-check engine
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("languages", &self.inner.registry.ids())
            .field("max_concurrency", &self.inner.config.execution.max_concurrency)
            .finish()
    }
}

impl Engine {
    /// Engine with every built-in language
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, AdapterRegistry::with_builtin())
    }

    /// Engine with a custom set of adapters
    pub fn with_registry(config: Config, registry: AdapterRegistry) -> Self {
        let permits = Semaphore::new(config.execution.max_concurrency.max(1));
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                permits,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.inner.registry
    }

    /// Registered languages with toolchain availability on this host
    pub fn languages(&self) -> Vec<LanguageInfo> {
        self.inner
            .registry
            .iter()
            .map(|adapter| describe(adapter.as_ref(), self.inner.config.languages.get(adapter.id())))
            .collect()
    }

    /// Run code to completion
    pub async fn run(&self, request: ExecutionRequest) -> ExecutionReport {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run code, stopping early when `cancel` fires
    ///
    /// Cancellation is reported like a timeout. Dropping the returned future
    /// also cancels the run and removes its workspace.
    #[instrument(skip_all, fields(language = request.language.as_deref(), filename = request.filename.as_deref()))]
    pub async fn run_with_cancel(&self, request: ExecutionRequest, cancel: CancellationToken) -> ExecutionReport {
        let resolution = self.inner.registry.resolve(
            request.language.as_deref(),
            request.filename.as_deref(),
            &request.code,
        );
        let language = resolution.label();

        let guard = cancel.clone().drop_guard();
        let engine = self.clone();
        let task = tokio::spawn(async move { engine.execute(resolution, request, cancel).await });

        let report = match task.await {
            Ok(report) => report,
            Err(e) => {
                warn!(language = %language, error = %e, "Execution task failed");
                ExecutionReport::new(
                    language,
                    ExecutionOutcome::internal(format!("execution task failed: {}", e)),
                    Duration::ZERO,
                )
            }
        };
        guard.disarm();

        info!(
            language = %report.language,
            success = report.outcome.is_success(),
            timed_out = report.outcome.timed_out(),
            duration_ms = report.duration.as_millis() as u64,
            "Execution finished"
        );
        report
    }

    async fn execute(
        &self,
        resolution: Resolution,
        request: ExecutionRequest,
        cancel: CancellationToken,
    ) -> ExecutionReport {
        let adapter = match resolution {
            Resolution::Found(adapter) => adapter,
            Resolution::Unsupported(language) => {
                return ExecutionReport::new(
                    language.clone(),
                    ExecutionOutcome::Unsupported { language },
                    Duration::ZERO,
                )
            }
        };
        let language = adapter.id();

        let Some(executor) = self.executor_for(adapter.as_ref()) else {
            return ExecutionReport::new(
                language,
                ExecutionOutcome::Unsupported {
                    language: language.to_string(),
                },
                Duration::ZERO,
            );
        };

        let job = ExecutionJob {
            file_name: adapter.source_file_name(&request.code),
            code: request.code,
            input: request.input,
            timeouts: self.timeouts_for(adapter.as_ref()),
            install_hint: adapter.install_hint(),
        };

        let _permit = tokio::select! {
            permit = self.inner.permits.acquire() => match permit {
                Ok(permit) => permit,
                Err(e) => {
                    return ExecutionReport::new(language, ExecutionOutcome::internal(e.to_string()), Duration::ZERO)
                }
            },
            _ = cancel.cancelled() => {
                let outcome = ExecutionOutcome::Timeout {
                    stdout: String::new(),
                    stderr: String::new(),
                    phase: Phase::Run,
                    limit: job.timeouts.run,
                };
                return ExecutionReport::new(language, outcome, Duration::ZERO);
            }
        };

        let done = executor.execute(job, &cancel).await;
        ExecutionReport::new(language, done.outcome, done.duration)
    }

    fn executor_for(&self, adapter: &dyn LanguageAdapter) -> Option<Box<dyn Executor>> {
        let config = &self.inner.config;
        match adapter.runtime() {
            Runtime::Toolchain(toolchain) => {
                let toolchain = toolchain.with_override(config.languages.get(adapter.id()));
                Some(Box::new(ToolchainExecutor::new(
                    ProcessLimits::from(&config.execution),
                    toolchain,
                )))
            }
            Runtime::Embedded => Some(Box::new(SandboxExecutor::new(SandboxLimits::from_config(
                &config.sandbox,
                config.execution.max_output_bytes,
            )))),
            Runtime::CheckOnly => None,
        }
    }

    fn timeouts_for(&self, adapter: &dyn LanguageAdapter) -> PhaseTimeouts {
        adapter
            .timeouts()
            .with_override(self.inner.config.languages.get(adapter.id()))
    }

    /// Statically check code
    ///
    /// The analyzer runs on the blocking pool; if it panics the report carries
    /// a single diagnostic instead.
    #[instrument(skip_all, fields(language = request.language.as_deref(), filename = request.filename.as_deref()))]
    pub async fn check(&self, request: CheckRequest) -> CheckReport {
        let resolution = self.inner.registry.resolve(
            request.language.as_deref(),
            request.filename.as_deref(),
            &request.code,
        );
        let adapter = match resolution {
            Resolution::Found(adapter) => adapter,
            Resolution::Unsupported(language) => return CheckReport::unsupported(language),
        };
        let language = adapter.id();
        let code = request.code;

        match tokio::task::spawn_blocking(move || adapter.check(&code)).await {
            Ok(Some(diagnostics)) => CheckReport::from_diagnostics(language, diagnostics),
            Ok(None) => CheckReport::unsupported(language),
            Err(e) => {
                warn!(language, error = %e, "Checker failed");
                CheckReport::internal_failure(language, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{Diagnostic, Severity};
    use crate::config::LanguageOverride;
    use crate::languages::{CommandTemplate, Toolchain};
    use tempfile::tempdir;

    fn config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.execution.workspace_root = root.to_path_buf();
        config.execution.max_concurrency = 4;
        config.execution.kill_grace = Duration::from_millis(200);
        config
            .languages
            .insert("bash".into(), LanguageOverride {
                program: Some("sh".into()),
                ..Default::default()
            });
        config
    }

    fn workspace_count(root: &std::path::Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_javascript_console_log() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let report = engine
            .run(ExecutionRequest::new("console.log(1+1)").with_language("javascript"))
            .await;
        let response = report.to_response();
        assert_eq!(response.output, "2\n");
        assert_eq!(response.error, None);
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_workspace_removed_after_run() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let report = engine
            .run(ExecutionRequest::new("pwd; ls").with_language("bash"))
            .await;
        assert!(report.outcome.is_success(), "{:?}", report.outcome);
        assert!(report.outcome.output().contains("main.sh"));
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_isolated() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));

        let runs = (0..6).map(|i| {
            let engine = engine.clone();
            async move {
                let code = format!("echo {i} > mine.txt; sleep 0.2; ls | wc -l; cat mine.txt");
                let report = engine.run(ExecutionRequest::new(code).with_filename("job.sh")).await;
                (i, report)
            }
        });

        for (i, report) in futures::future::join_all(runs).await {
            let output = report.outcome.output();
            let lines: Vec<&str> = output.split_whitespace().collect();
            assert_eq!(lines, vec!["2".to_string(), i.to_string()], "run {}", i);
        }
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_same_code_different_inputs_are_isolated() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let code = "read line; echo \"$line\" > seen.txt; sleep 0.2; cat seen.txt; ls | wc -l";

        let runs = (0..6).map(|i| {
            let engine = engine.clone();
            async move {
                let request = ExecutionRequest::new(code)
                    .with_language("bash")
                    .with_input(format!("input-{i}\n"));
                (i, engine.run(request).await)
            }
        });

        for (i, report) in futures::future::join_all(runs).await {
            let response = report.to_response();
            assert_eq!(response.error, None, "run {}", i);
            let lines: Vec<&str> = response.output.split_whitespace().collect();
            assert_eq!(lines, vec![format!("input-{i}"), "2".to_string()], "run {}", i);
        }
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_infinite_loop_times_out() {
        let root = tempdir().unwrap();
        let mut config = config(root.path());
        if let Some(bash) = config.languages.get_mut("bash") {
            bash.run_timeout = Some(Duration::from_millis(300));
        }
        let engine = Engine::new(config);

        let started = std::time::Instant::now();
        let report = engine
            .run(ExecutionRequest::new("echo tick; while true; do :; done").with_language("sh"))
            .await;
        let response = report.to_response();
        assert_eq!(response.timed_out, Some(true));
        assert_eq!(response.output, "tick\n");
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_interpreter_has_install_hint() {
        let root = tempdir().unwrap();
        let mut config = config(root.path());
        config.languages.insert("python".into(), LanguageOverride {
            program: Some("polyrun-missing-python3".into()),
            ..Default::default()
        });
        let engine = Engine::new(config);

        let report = engine
            .run(ExecutionRequest::new("print('hi')").with_language("python"))
            .await;
        let response = report.to_response();
        let error = response.error.unwrap_or_default();
        assert!(error.contains("polyrun-missing-python3"));
        assert!(error.contains("Install"), "{}", error);
        assert!(report.duration >= Duration::ZERO);
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_compile_failure_with_stand_in_compiler() {
        let root = tempdir().unwrap();
        let mut config = config(root.path());
        config.languages.insert("c".into(), LanguageOverride {
            compiler: Some("false".into()),
            ..Default::default()
        });
        let engine = Engine::new(config);

        let report = engine
            .run(ExecutionRequest::new("int main(){return 0;}").with_language("c"))
            .await;
        assert!(matches!(report.outcome, ExecutionOutcome::CompileFailure { .. }));
        assert_eq!(report.to_response().error.as_deref(), Some("Compilation failed"));
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let report = engine
            .run(ExecutionRequest::new("DISPLAY 'HI'").with_language("cobol").with_filename("a.py"))
            .await;
        assert_eq!(report.language, "cobol");
        assert_eq!(
            report.to_response().error.as_deref(),
            Some("cannot run this language: cobol")
        );
    }

    #[tokio::test]
    async fn test_check_only_language_is_not_run() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let report = engine
            .run(ExecutionRequest::new("{}").with_filename("data.json"))
            .await;
        assert_eq!(
            report.outcome,
            ExecutionOutcome::Unsupported {
                language: "json".into()
            }
        );
    }

    #[tokio::test]
    async fn test_cancellation_is_a_timeout() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let report = engine
            .run_with_cancel(ExecutionRequest::new("sleep 30").with_language("bash"), cancel)
            .await;
        assert!(report.outcome.timed_out());
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_dropped_run_cleans_up() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let run = engine.run(ExecutionRequest::new("sleep 30").with_language("bash"));
        let _ = tokio::time::timeout(Duration::from_millis(200), run).await;
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(workspace_count(root.path()), 0);
    }

    #[tokio::test]
    async fn test_check_json_points_at_token() {
        let engine = Engine::new(Config::default());
        let report = engine
            .check(CheckRequest::new("{\"a\":}").with_language("json"))
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!((report.errors[0].line, report.errors[0].column), (1, 6));
    }

    #[tokio::test]
    async fn test_check_is_deterministic() {
        let engine = Engine::new(Config::default());
        let code = "int main() {\n  int x = 1\n  return x;\n";
        let first = engine.check(CheckRequest::new(code).with_filename("a.c")).await;
        let second = engine.check(CheckRequest::new(code).with_filename("a.c")).await;
        assert_eq!(first, second);
        assert!(!first.errors.is_empty());
    }

    #[tokio::test]
    async fn test_check_unsupported() {
        let engine = Engine::new(Config::default());
        let report = engine.check(CheckRequest::new("x").with_filename("notes.txt")).await;
        assert_eq!(report.language, "unknown");
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings[0].message, "unsupported language for checking");
    }

    #[test]
    fn test_languages_listing_applies_overrides() {
        let root = tempdir().unwrap();
        let engine = Engine::new(config(root.path()));
        let languages = engine.languages();
        assert_eq!(languages.len(), 9);
        let bash = languages.iter().find(|l| l.id == "bash").unwrap();
        assert_eq!(bash.programs, vec!["sh".to_string()]);
        assert!(bash.available);
    }

    struct Exploding;

    impl LanguageAdapter for Exploding {
        fn id(&self) -> &'static str {
            "boom"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &["boom"]
        }

        fn runtime(&self) -> Runtime {
            Runtime::Toolchain(Toolchain::interpreted(CommandTemplate::new("sh", ["{source}"])))
        }

        fn check(&self, _code: &str) -> Option<Vec<Diagnostic>> {
            panic!("analyzer bug")
        }
    }

    #[tokio::test]
    async fn test_checker_panic_becomes_diagnostic() {
        let mut registry = AdapterRegistry::new();
        registry.register(Exploding);
        let engine = Engine::with_registry(Config::default(), registry);
        let report = engine.check(CheckRequest::new("x").with_language("boom")).await;
        assert_eq!(report.language, "boom");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].severity, Severity::Warning);
        assert!(report.warnings[0].message.starts_with("checker failed internally"));
    }
}
