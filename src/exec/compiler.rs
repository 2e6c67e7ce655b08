//! Compile phase for toolchain languages

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::exec::runner::{run_process, ProcessSpec, ProcessStatus};
use crate::languages::{CommandTemplate, SourceUnit};
use crate::result::{ExecutionOutcome, Phase};

/// A successful build; lives only as long as its workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub source: PathBuf,
    pub artifact: PathBuf,
    /// Raw compiler output (warnings may be present)
    pub log: String,
}

/// Result of the compile phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStage {
    /// Proceed to the run phase
    Compiled(CompiledArtifact),
    /// The execution ends here with this outcome
    Finished(ExecutionOutcome),
}

/// One compiler invocation
#[derive(Debug, Clone)]
pub struct CompileJob<'a> {
    pub unit: &'a SourceUnit,
    pub template: &'a CommandTemplate,
    pub timeout: Duration,
    pub max_output_bytes: usize,
    pub kill_grace: Duration,
    pub install_hint: &'a str,
}

fn combine(stderr: &str, stdout: &str) -> String {
    match (stderr.is_empty(), stdout.is_empty()) {
        (_, true) => stderr.to_string(),
        (true, false) => stdout.to_string(),
        (false, false) => format!("{}\n{}", stderr.trim_end(), stdout),
    }
}

/// Run the compiler for `job.unit`
///
/// Only unexpected spawn failures are returned as `Err`; everything the
/// compiler itself does maps to a [`CompileStage`].
pub async fn compile(job: CompileJob<'_>, cancel: &CancellationToken) -> Result<CompileStage> {
    let command = job.template.expand(job.unit);
    debug!(command = %command, "Compiling");

    let spec = ProcessSpec {
        command: &command,
        cwd: &job.unit.dir,
        stdin: None,
        timeout: job.timeout,
        max_output_bytes: job.max_output_bytes,
        kill_grace: job.kill_grace,
    };

    let outcome = match run_process(spec, cancel).await {
        Ok(outcome) => outcome,
        Err(Error::ToolchainNotFound(tool)) => {
            info!(tool = %tool, "Compiler not installed");
            return Ok(CompileStage::Finished(ExecutionOutcome::ToolchainMissing {
                tool,
                hint: job.install_hint.to_string(),
            }));
        }
        Err(e) => return Err(e),
    };

    let log = combine(&outcome.stderr, &outcome.stdout);
    let stage = match outcome.status {
        ProcessStatus::TimedOut | ProcessStatus::Cancelled => {
            CompileStage::Finished(ExecutionOutcome::Timeout {
                stdout: outcome.stdout,
                stderr: outcome.stderr,
                phase: Phase::Compile,
                limit: job.timeout,
            })
        }
        status if status.success() => CompileStage::Compiled(CompiledArtifact {
            source: job.unit.source.clone(),
            artifact: job.unit.artifact.clone(),
            log,
        }),
        _ => CompileStage::Finished(ExecutionOutcome::CompileFailure { log }),
    };

    Ok(stage)
}
