//! # Polyrun
//!
//! Multi-language code execution and static-check engine.
//!
//! ## Features
//!
//! - **Isolated runs:** every execution gets its own workspace directory,
//!   removed on every exit path
//! - **Compile-then-run:** C, C++, Java, Go and Rust via the host toolchain,
//!   with typed stage results
//! - **Bounded:** per-phase timeouts, process-group kill, output caps and a
//!   concurrency limit
//! - **Embedded JavaScript:** QuickJS sandbox with time, memory and stack limits
//! - **Static checks:** fast heuristic diagnostics for nine languages
//!
//! ## Example
//!
//! ```no_run
//! use polyrun::{Config, Engine, ExecutionRequest};
//!
//! # async fn demo() {
//! let engine = Engine::new(Config::default());
//! let report = engine
//!     .run(ExecutionRequest::new("console.log(1+1)").with_language("javascript"))
//!     .await;
//! assert_eq!(report.to_response().output, "2\n");
//! # }
//! ```

pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod gateway;
pub mod languages;
pub mod logging;
pub mod result;
pub mod workspace;

pub use checker::{CheckReport, Diagnostic, Severity};
pub use config::Config;
pub use engine::{CheckRequest, Engine, ExecutionRequest};
pub use error::{Error, Result};
pub use result::{ExecutionOutcome, ExecutionReport, RunResponse};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
