//! Child process execution with a watchdog
//!
//! Each child runs in its own process group so that a timeout can take down
//! everything it spawned, not just the direct child.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::exec::output::{drain, OutputBuffer};
use crate::languages::CommandSpec;

/// Everything needed to run one command
#[derive(Debug, Clone)]
pub struct ProcessSpec<'a> {
    pub command: &'a CommandSpec,
    pub cwd: &'a Path,
    pub stdin: Option<&'a str>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
    /// How long to wait for output pipes after the child is gone
    pub kill_grace: Duration,
}

/// How the process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Exited on its own (`code` is `None` when killed by a signal)
    Exited { code: Option<i32>, signal: Option<i32> },
    /// Killed by the watchdog
    TimedOut,
    /// Killed because the caller cancelled
    Cancelled,
}

impl ProcessStatus {
    pub fn success(&self) -> bool {
        matches!(self, ProcessStatus::Exited { code: Some(0), .. })
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
    /// When the terminal status was determined
    pub finished_at: Instant,
}

fn exit_status(status: ExitStatus) -> ProcessStatus {
    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
    #[cfg(not(unix))]
    let signal = None;

    ProcessStatus::Exited {
        code: status.code(),
        signal,
    }
}

/// Run a command to completion, timeout, or cancellation
///
/// A program that cannot be found yields [`Error::ToolchainNotFound`]; any
/// other spawn failure is [`Error::Spawn`]. Everything the child does after it
/// started is reported through [`ProcessOutcome`].
pub async fn run_process(spec: ProcessSpec<'_>, cancel: &CancellationToken) -> Result<ProcessOutcome> {
    let program = spec.command.program.as_str();

    let mut command = Command::new(program);
    command
        .args(&spec.command.args)
        .current_dir(spec.cwd)
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    command.process_group(0);

    debug!(command = %spec.command, cwd = %spec.cwd.display(), "Spawning process");

    let mut child = command.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ToolchainNotFound(program.to_string()),
        _ => Error::Spawn(format!("failed to start {}: {}", program, e)),
    })?;
    let pid = child.id();

    let stdout = OutputBuffer::new(spec.max_output_bytes);
    let stderr = OutputBuffer::new(spec.max_output_bytes);

    let mut readers = Vec::new();
    if let Some(out) = child.stdout.take() {
        readers.push(tokio::spawn(drain(out, stdout.clone())));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(tokio::spawn(drain(err, stderr.clone())));
    }

    if let (Some(data), Some(mut pipe)) = (spec.stdin, child.stdin.take()) {
        let data = data.as_bytes().to_vec();
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(&data).await {
                // The child may exit without reading its input.
                debug!(error = %e, "stdin write stopped");
            }
            let _ = pipe.shutdown().await;
        });
    }

    let status = tokio::select! {
        waited = child.wait() => match waited {
            Ok(status) => exit_status(status),
            Err(e) => {
                terminate(&mut child, pid).await;
                return Err(Error::Spawn(format!("failed to wait for {}: {}", program, e)));
            }
        },
        _ = tokio::time::sleep(spec.timeout) => {
            warn!(command = %spec.command, timeout = ?spec.timeout, "Process timed out; killing process group");
            ProcessStatus::TimedOut
        }
        _ = cancel.cancelled() => {
            debug!(command = %spec.command, "Process cancelled; killing process group");
            ProcessStatus::Cancelled
        }
    };
    let finished_at = Instant::now();

    if !matches!(status, ProcessStatus::Exited { .. }) {
        terminate(&mut child, pid).await;
    }

    let aborts: Vec<_> = readers.iter().map(|r| r.abort_handle()).collect();
    if tokio::time::timeout(spec.kill_grace, join_all(readers)).await.is_err() {
        // Something that outlived the child still holds the pipes.
        debug!(command = %spec.command, "Output pipes still open after exit; killing stragglers");
        kill_group(pid);
        aborts.iter().for_each(|a| a.abort());
    }

    Ok(ProcessOutcome {
        status,
        stdout: stdout.snapshot(),
        stderr: stderr.snapshot(),
        finished_at,
    })
}

/// SIGKILL the whole process group, then reap the direct child
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Child already gone");
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::CommandSpec;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    fn spec<'a>(command: &'a CommandSpec, cwd: &'a Path, stdin: Option<&'a str>, timeout: Duration) -> ProcessSpec<'a> {
        ProcessSpec {
            command,
            cwd,
            stdin,
            timeout,
            max_output_bytes: 1024 * 1024,
            kill_grace: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let dir = tempdir().unwrap();
        let cmd = sh("echo out; echo err >&2; exit 3");
        let outcome = run_process(spec(&cmd, dir.path(), None, Duration::from_secs(5)), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.status, ProcessStatus::Exited { code: Some(3), signal: None });
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_stdin_is_delivered_and_closed() {
        let dir = tempdir().unwrap();
        let cmd = sh("cat");
        let outcome = run_process(spec(&cmd, dir.path(), Some("a\nb\n"), Duration::from_secs(5)), &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.status.success());
        assert_eq!(outcome.stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("survived");
        let script = format!("echo started; (sleep 2; touch {}) & sleep 30", marker.display());
        let cmd = sh(&script);

        let started = Instant::now();
        let outcome = run_process(spec(&cmd, dir.path(), None, Duration::from_millis(300)), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, ProcessStatus::TimedOut);
        assert_eq!(outcome.stdout, "started\n");
        assert!(started.elapsed() < Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists(), "background child outlived the timeout");
    }

    #[tokio::test]
    async fn test_cancellation_stops_process() {
        let dir = tempdir().unwrap();
        let cmd = sh("sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let outcome = run_process(spec(&cmd, dir.path(), None, Duration::from_secs(30)), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.status, ProcessStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempdir().unwrap();
        let cmd = CommandSpec {
            program: "polyrun-definitely-not-installed".to_string(),
            args: Vec::new(),
        };
        let err = run_process(spec(&cmd, dir.path(), None, Duration::from_secs(1)), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolchainNotFound(p) if p == "polyrun-definitely-not-installed"));
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let dir = tempdir().unwrap();
        let cmd = sh("i=0; while [ $i -lt 200 ]; do echo 0123456789; i=$((i+1)); done");
        let mut process = spec(&cmd, dir.path(), None, Duration::from_secs(5));
        process.max_output_bytes = 100;
        let outcome = run_process(process, &CancellationToken::new()).await.unwrap();
        assert!(outcome.status.success());
        assert!(outcome.stdout.starts_with("0123456789\n"));
        assert!(outcome.stdout.contains("[output truncated: 2100 more bytes not shown]"));
    }
}
