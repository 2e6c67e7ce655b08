use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, Runtime, Toolchain};

#[derive(Debug, Clone, Default)]
pub struct PythonAdapter;

impl LanguageAdapter for PythonAdapter {
    fn id(&self) -> &'static str {
        "python"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["py", "python3"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn runtime(&self) -> Runtime {
        // -u keeps stdout unbuffered so partial output survives a timeout kill.
        Runtime::Toolchain(Toolchain::interpreted(CommandTemplate::new(
            "python3",
            ["-u", "-B", "{source}"],
        )))
    }

    fn install_hint(&self) -> &'static str {
        "Python 3 is not installed. Install it (e.g. `apt install python3` or https://www.python.org/downloads/) and make sure `python3` is on PATH"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::python::check(code))
    }
}
