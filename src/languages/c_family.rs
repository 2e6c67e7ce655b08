use std::time::Duration;

use crate::checker::{self, Diagnostic};
use crate::checker::c_family::Dialect;
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, PhaseTimeouts, Runtime, Toolchain};

fn timeouts() -> PhaseTimeouts {
    PhaseTimeouts {
        compile: Duration::from_secs(30),
        run: Duration::from_secs(10),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CAdapter;

impl LanguageAdapter for CAdapter {
    fn id(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::compiled(
            CommandTemplate::new("gcc", ["-std=c11", "-O2", "-pipe", "-o", "{artifact}", "{source}", "-lm"]),
            CommandTemplate::new("{artifact}", Vec::<String>::new()),
        ))
    }

    fn timeouts(&self) -> PhaseTimeouts {
        timeouts()
    }

    fn install_hint(&self) -> &'static str {
        "The C compiler `gcc` is not installed. Install it (e.g. `apt install build-essential` or Xcode command line tools) or set languages.c.compiler"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::c_family::check(code, Dialect::C))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CppAdapter;

impl LanguageAdapter for CppAdapter {
    fn id(&self) -> &'static str {
        "cpp"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["c++", "cxx", "cc"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "h"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::compiled(
            CommandTemplate::new("g++", ["-std=c++17", "-O2", "-pipe", "-o", "{artifact}", "{source}"]),
            CommandTemplate::new("{artifact}", Vec::<String>::new()),
        ))
    }

    fn timeouts(&self) -> PhaseTimeouts {
        timeouts()
    }

    fn install_hint(&self) -> &'static str {
        "The C++ compiler `g++` is not installed. Install it (e.g. `apt install g++` or Xcode command line tools) or set languages.cpp.compiler"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::c_family::check(code, Dialect::Cpp))
    }
}
