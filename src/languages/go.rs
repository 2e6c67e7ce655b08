use std::time::Duration;

use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, PhaseTimeouts, Runtime, Toolchain};

#[derive(Debug, Clone, Default)]
pub struct GoAdapter;

impl LanguageAdapter for GoAdapter {
    fn id(&self) -> &'static str {
        "go"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["golang"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::compiled(
            CommandTemplate::new("go", ["build", "-o", "{artifact}", "{source}"]),
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
        "The Go toolchain is not installed. Install it from https://go.dev/dl/ and make sure `go` is on PATH"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::go::check(code))
    }
}
