use std::time::Duration;

use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, PhaseTimeouts, Runtime, Toolchain};

#[derive(Debug, Clone, Default)]
pub struct RustAdapter;

impl LanguageAdapter for RustAdapter {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::compiled(
            CommandTemplate::new("rustc", ["--edition", "2021", "-O", "-o", "{artifact}", "{source}"]),
            CommandTemplate::new("{artifact}", Vec::<String>::new()),
        ))
    }

    fn timeouts(&self) -> PhaseTimeouts {
        PhaseTimeouts {
            compile: Duration::from_secs(60),
            run: Duration::from_secs(10),
        }
    }

    fn install_hint(&self) -> &'static str {
        "The Rust compiler is not installed. Install it with rustup (https://rustup.rs) and make sure `rustc` is on PATH"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::rust::check(code))
    }
}
