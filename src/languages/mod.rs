//! Language adapters and the registry that dispatches to them.
//!
//! Adding a language means writing an adapter and registering it in
//! [`AdapterRegistry::with_builtin`].

pub mod adapter;
pub mod availability;
pub mod c_family;
pub mod go;
pub mod java;
pub mod javascript;
pub mod json;
pub mod python;
pub mod registry;
pub mod rust;
pub mod shell;

pub use adapter::{CommandSpec, CommandTemplate, LanguageAdapter, PhaseTimeouts, Runtime, SourceUnit, Toolchain};
pub use availability::{describe, LanguageInfo};
pub use registry::{AdapterRegistry, Resolution};
