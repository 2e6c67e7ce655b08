//! Execution backends
//!
//! [`ToolchainExecutor`] materializes the source in a workspace and drives
//! external compilers and interpreters. [`SandboxExecutor`] evaluates code in
//! the embedded interpreter and never touches the filesystem.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ExecutionConfig;
use crate::engine::phase::{ExecutionPhase, PhaseTracker};
use crate::engine::stopwatch::Stopwatch;
use crate::error::{Error, Result};
use crate::exec::{
    compile, run_process, run_sandboxed, CompileJob, CompileStage, ProcessOutcome, ProcessSpec, ProcessStatus,
    SandboxLimits, SandboxStatus,
};
use crate::languages::{PhaseTimeouts, SourceUnit, Toolchain};
use crate::result::{ExecutionOutcome, Phase};
use crate::workspace::Workspace;

/// One resolved execution, ready for a backend
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    pub code: String,
    pub input: Option<String>,
    /// File name the source is written under (toolchain languages)
    pub file_name: String,
    pub timeouts: PhaseTimeouts,
    pub install_hint: &'static str,
}

/// Outcome plus measured wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub outcome: ExecutionOutcome,
    pub duration: Duration,
}

impl Executed {
    pub fn new(outcome: ExecutionOutcome, duration: Duration) -> Self {
        Self { outcome, duration }
    }
}

/// Trait for execution backends
///
/// Backends never fail: every problem, including their own, becomes an
/// [`ExecutionOutcome`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run `job` until it finishes, times out, or `cancel` fires
    async fn execute(&self, job: ExecutionJob, cancel: &CancellationToken) -> Executed;
}

/// Process-level limits shared by every toolchain run
#[derive(Debug, Clone)]
pub struct ProcessLimits {
    pub workspace_root: PathBuf,
    pub max_output_bytes: usize,
    pub kill_grace: Duration,
}

impl From<&ExecutionConfig> for ProcessLimits {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            workspace_root: config.workspace_root.clone(),
            max_output_bytes: config.max_output_bytes,
            kill_grace: config.kill_grace,
        }
    }
}

/// Compile (if needed) and run with external tools inside a fresh workspace
#[derive(Debug, Clone)]
pub struct ToolchainExecutor {
    limits: ProcessLimits,
    toolchain: Toolchain,
}

impl ToolchainExecutor {
    pub fn new(limits: ProcessLimits, toolchain: Toolchain) -> Self {
        Self { limits, toolchain }
    }

    async fn build_and_run(
        &self,
        workspace: &mut Workspace,
        job: &ExecutionJob,
        tracker: &mut PhaseTracker,
        watch: &mut Stopwatch,
        cancel: &CancellationToken,
    ) -> Result<(ExecutionOutcome, Instant)> {
        workspace.write_file(&job.file_name, &job.code).await?;
        let unit = SourceUnit::new(workspace.path(), &job.file_name);

        watch.start();

        if let Some(template) = &self.toolchain.compile {
            tracker.advance(ExecutionPhase::Compiling)?;
            let stage = compile(
                CompileJob {
                    unit: &unit,
                    template,
                    timeout: job.timeouts.compile,
                    max_output_bytes: self.limits.max_output_bytes,
                    kill_grace: self.limits.kill_grace,
                    install_hint: job.install_hint,
                },
                cancel,
            )
            .await?;

            match stage {
                CompileStage::Finished(outcome) => return Ok((outcome, Instant::now())),
                CompileStage::Compiled(artifact) => {
                    debug!(artifact = %artifact.artifact.display(), "Compiled");
                    tracker.advance(ExecutionPhase::Compiled)?;
                }
            }
        }

        tracker.advance(ExecutionPhase::Running)?;
        let command = self.toolchain.run.expand(&unit);
        let spec = ProcessSpec {
            command: &command,
            cwd: workspace.path(),
            stdin: job.input.as_deref(),
            timeout: job.timeouts.run,
            max_output_bytes: self.limits.max_output_bytes,
            kill_grace: self.limits.kill_grace,
        };

        match run_process(spec, cancel).await {
            Ok(done) => {
                let finished_at = done.finished_at;
                Ok((run_outcome(done, job.timeouts.run), finished_at))
            }
            Err(Error::ToolchainNotFound(tool)) => Ok((
                ExecutionOutcome::ToolchainMissing {
                    tool,
                    hint: job.install_hint.to_string(),
                },
                Instant::now(),
            )),
            Err(e) => Err(e),
        }
    }
}

fn run_outcome(done: ProcessOutcome, limit: Duration) -> ExecutionOutcome {
    match done.status {
        ProcessStatus::Exited { code: Some(0), .. } => ExecutionOutcome::Success {
            stdout: done.stdout,
            stderr: done.stderr,
            exit_code: Some(0),
        },
        ProcessStatus::Exited { code, signal } => {
            if let Some(signal) = signal {
                debug!(signal, "Process terminated by signal");
            }
            ExecutionOutcome::RuntimeFailure {
                stdout: done.stdout,
                stderr: done.stderr,
                exit_code: code,
            }
        }
        ProcessStatus::TimedOut | ProcessStatus::Cancelled => ExecutionOutcome::Timeout {
            stdout: done.stdout,
            stderr: done.stderr,
            phase: Phase::Run,
            limit,
        },
    }
}

#[async_trait]
impl Executor for ToolchainExecutor {
    fn name(&self) -> &str {
        "toolchain"
    }

    async fn execute(&self, job: ExecutionJob, cancel: &CancellationToken) -> Executed {
        let mut workspace = match Workspace::open(&self.limits.workspace_root).await {
            Ok(workspace) => workspace,
            Err(e) => return Executed::new(ExecutionOutcome::internal(e.to_string()), Duration::ZERO),
        };

        let mut tracker = PhaseTracker::new(workspace.id());
        let mut watch = Stopwatch::new();

        let (outcome, finished_at) = match self
            .build_and_run(&mut workspace, &job, &mut tracker, &mut watch, cancel)
            .await
        {
            Ok(done) => done,
            Err(e) => {
                warn!(workspace = %workspace.id(), error = %e, "Toolchain execution failed");
                (ExecutionOutcome::internal(e.to_string()), Instant::now())
            }
        };

        if let Err(e) = tracker.finish(&outcome) {
            warn!(error = %e, "Inconsistent execution lifecycle");
        }
        workspace.close().await;

        Executed::new(outcome, watch.until(finished_at))
    }
}

/// Evaluate JavaScript in the embedded interpreter
#[derive(Debug, Clone, Copy)]
pub struct SandboxExecutor {
    limits: SandboxLimits,
}

impl SandboxExecutor {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl Executor for SandboxExecutor {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn execute(&self, job: ExecutionJob, cancel: &CancellationToken) -> Executed {
        let mut tracker = PhaseTracker::new("sandbox");
        let mut watch = Stopwatch::new();
        let watchdog = job.timeouts.run;

        if let Err(e) = tracker.advance(ExecutionPhase::Running) {
            return Executed::new(ExecutionOutcome::internal(e.to_string()), Duration::ZERO);
        }
        watch.start();
        let done = run_sandboxed(job.code, job.input, self.limits, watchdog, cancel).await;

        let outcome = match done.status {
            SandboxStatus::Completed => ExecutionOutcome::Success {
                stdout: done.stdout,
                stderr: done.stderr,
                exit_code: None,
            },
            SandboxStatus::Threw(message) => {
                let mut stderr = done.stderr;
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&message);
                ExecutionOutcome::RuntimeFailure {
                    stdout: done.stdout,
                    stderr,
                    exit_code: None,
                }
            }
            SandboxStatus::TimedOut => ExecutionOutcome::Timeout {
                stdout: done.stdout,
                stderr: done.stderr,
                phase: Phase::Run,
                limit: self.limits.time_budget.min(watchdog),
            },
            SandboxStatus::Failed(message) => ExecutionOutcome::internal(message),
        };

        if let Err(e) = tracker.finish(&outcome) {
            warn!(error = %e, "Inconsistent execution lifecycle");
        }
        Executed::new(outcome, watch.until(done.finished_at))
    }
}
