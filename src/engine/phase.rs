//! Execution lifecycle
//!
//! `Queued → [Compiling → CompileFailed | Compiled] → Running →
//! {Completed | RuntimeError | TimedOut}`. A run can also be `Aborted` from
//! any non-terminal phase (missing toolchain, engine fault).

use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};
use crate::result::ExecutionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Queued,
    Compiling,
    Compiled,
    CompileFailed,
    Running,
    Completed,
    RuntimeError,
    TimedOut,
    Aborted,
}

impl ExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionPhase::CompileFailed
                | ExecutionPhase::Completed
                | ExecutionPhase::RuntimeError
                | ExecutionPhase::TimedOut
                | ExecutionPhase::Aborted
        )
    }

    pub fn can_transition_to(&self, next: ExecutionPhase) -> bool {
        use ExecutionPhase::*;
        match (*self, next) {
            (Queued, Compiling | Running) => true,
            (Compiling, Compiled | CompileFailed | TimedOut) => true,
            (Compiled, Running) => true,
            (Running, Completed | RuntimeError | TimedOut) => true,
            (from, Aborted) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Terminal phase an outcome corresponds to
    pub fn for_outcome(outcome: &ExecutionOutcome) -> ExecutionPhase {
        match outcome {
            ExecutionOutcome::Success { .. } => ExecutionPhase::Completed,
            ExecutionOutcome::CompileFailure { .. } => ExecutionPhase::CompileFailed,
            ExecutionOutcome::RuntimeFailure { .. } => ExecutionPhase::RuntimeError,
            ExecutionOutcome::Timeout { .. } => ExecutionPhase::TimedOut,
            ExecutionOutcome::ToolchainMissing { .. }
            | ExecutionOutcome::Unsupported { .. }
            | ExecutionOutcome::InternalError { .. } => ExecutionPhase::Aborted,
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionPhase::Queued => "queued",
            ExecutionPhase::Compiling => "compiling",
            ExecutionPhase::Compiled => "compiled",
            ExecutionPhase::CompileFailed => "compile_failed",
            ExecutionPhase::Running => "running",
            ExecutionPhase::Completed => "completed",
            ExecutionPhase::RuntimeError => "runtime_error",
            ExecutionPhase::TimedOut => "timed_out",
            ExecutionPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Tracks the phase of one execution and rejects illegal moves
#[derive(Debug)]
pub struct PhaseTracker {
    run: String,
    current: ExecutionPhase,
}

impl PhaseTracker {
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            current: ExecutionPhase::Queued,
        }
    }

    pub fn current(&self) -> ExecutionPhase {
        self.current
    }

    pub fn advance(&mut self, next: ExecutionPhase) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(Error::Internal(format!(
                "illegal phase transition {} -> {} for {}",
                self.current, next, self.run
            )));
        }
        debug!(run = %self.run, from = %self.current, to = %next, "Phase transition");
        self.current = next;
        Ok(())
    }

    /// Move to the terminal phase matching `outcome`
    pub fn finish(&mut self, outcome: &ExecutionOutcome) -> Result<()> {
        self.advance(ExecutionPhase::for_outcome(outcome))
    }
}
