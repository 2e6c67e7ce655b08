use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, Runtime, Toolchain};

#[derive(Debug, Clone, Default)]
pub struct ShellAdapter;

impl LanguageAdapter for ShellAdapter {
    fn id(&self) -> &'static str {
        "bash"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sh", "shell", "zsh"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["sh", "bash"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::interpreted(CommandTemplate::new("bash", ["{source}"])))
    }

    fn install_hint(&self) -> &'static str {
        "`bash` is not installed. Install it with your system package manager or set languages.bash.program to another shell"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::shell::check(code))
    }
}
