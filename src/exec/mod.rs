//! Execution stages
//!
//! - compiler.rs: compile phase for toolchain languages
//! - runner.rs: child processes with a watchdog and process-group kill
//! - interpreter.rs: embedded QuickJS sandbox
//! - output.rs: bounded stdout/stderr capture

pub mod compiler;
pub mod interpreter;
pub mod output;
pub mod runner;

pub use compiler::{compile, CompileJob, CompileStage, CompiledArtifact};
pub use interpreter::{run_sandboxed, syntax_check, SandboxLimits, SandboxOutcome, SandboxStatus, SyntaxCheck};
pub use output::OutputBuffer;
pub use runner::{run_process, ProcessOutcome, ProcessSpec, ProcessStatus};
