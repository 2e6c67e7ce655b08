use std::time::Duration;

use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{LanguageAdapter, PhaseTimeouts, Runtime};

/// JavaScript runs in the embedded interpreter, never as a child process.
#[derive(Debug, Clone, Default)]
pub struct JavaScriptAdapter;

impl LanguageAdapter for JavaScriptAdapter {
    fn id(&self) -> &'static str {
        "javascript"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["js", "node", "nodejs", "mjs"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Embedded
    }

    fn timeouts(&self) -> PhaseTimeouts {
        // Backstop for the interpreter's own budget.
        PhaseTimeouts {
            compile: Duration::ZERO,
            run: Duration::from_secs(10),
        }
    }

    fn install_hint(&self) -> &'static str {
        "JavaScript runs in the built-in interpreter; no installation is needed"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::javascript::check(code))
    }
}
