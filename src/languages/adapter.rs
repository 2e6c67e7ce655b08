//! Language adapter contract
//!
//! Core execution stays language-agnostic. An adapter declares how one
//! language is checked, whether it needs a compile phase, and which command
//! templates compile and run it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checker::Diagnostic;
use crate::config::LanguageOverride;

/// How code in a language is executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runtime {
    /// External toolchain invoked as child processes
    Toolchain(Toolchain),
    /// In-process embedded interpreter
    Embedded,
    /// The language can be checked but not run
    CheckOnly,
}

/// Compile and run command templates for a toolchain language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Compile phase, if the language has one
    pub compile: Option<CommandTemplate>,
    /// Run phase
    pub run: CommandTemplate,
}

impl Toolchain {
    /// Interpreted toolchain (no compile phase)
    pub fn interpreted(run: CommandTemplate) -> Self {
        Toolchain { compile: None, run }
    }

    /// Compiled toolchain
    pub fn compiled(compile: CommandTemplate, run: CommandTemplate) -> Self {
        Toolchain {
            compile: Some(compile),
            run,
        }
    }

    /// Apply configured binary overrides
    ///
    /// `compiler` replaces the compile program; `program` replaces the run
    /// program unless the run program is the compiled artifact itself.
    pub fn with_override(mut self, over: Option<&LanguageOverride>) -> Self {
        let Some(over) = over else {
            return self;
        };
        if let (Some(compile), Some(compiler)) = (self.compile.as_mut(), over.compiler.as_ref()) {
            compile.program = compiler.clone();
        }
        if let Some(program) = over.program.as_ref() {
            if !self.run.program.contains('{') {
                self.run.program = program.clone();
            }
        }
        self
    }
}

/// A command with `{source}`, `{artifact}`, `{dir}` and `{stem}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Program (may itself be a placeholder, e.g. `{artifact}`)
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl CommandTemplate {
    /// Create a template
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandTemplate {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitute placeholders for a concrete source unit
    pub fn expand(&self, unit: &SourceUnit) -> CommandSpec {
        CommandSpec {
            program: unit.substitute(&self.program),
            args: self.args.iter().map(|a| unit.substitute(a)).collect(),
        }
    }
}

/// A fully expanded command ready to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Paths of one materialized source file inside a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Workspace directory
    pub dir: PathBuf,
    /// Source file path
    pub source: PathBuf,
    /// File name without extension
    pub stem: String,
    /// Path of the compiled output
    pub artifact: PathBuf,
}

impl SourceUnit {
    /// Describe a source file `file_name` inside `dir`
    pub fn new(dir: &Path, file_name: &str) -> Self {
        let source = dir.join(file_name);
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());
        let artifact = dir.join(format!("{}{}", stem, std::env::consts::EXE_SUFFIX));
        SourceUnit {
            dir: dir.to_path_buf(),
            source,
            stem,
            artifact,
        }
    }

    fn substitute(&self, template: &str) -> String {
        template
            .replace("{source}", &self.source.to_string_lossy())
            .replace("{artifact}", &self.artifact.to_string_lossy())
            .replace("{dir}", &self.dir.to_string_lossy())
            .replace("{stem}", &self.stem)
    }
}

/// Per-phase wall-clock limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimeouts {
    /// Compile phase limit
    pub compile: Duration,
    /// Run phase limit
    pub run: Duration,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        PhaseTimeouts {
            compile: Duration::from_secs(30),
            run: Duration::from_secs(10),
        }
    }
}

impl PhaseTimeouts {
    /// Apply configured timeout overrides
    pub fn with_override(self, over: Option<&LanguageOverride>) -> Self {
        let Some(over) = over else {
            return self;
        };
        PhaseTimeouts {
            compile: over.compile_timeout.unwrap_or(self.compile),
            run: over.run_timeout.unwrap_or(self.run),
        }
    }
}

/// Language adapter contract
///
/// Adapters are registered once at startup and shared read-only across
/// concurrent requests.
pub trait LanguageAdapter: Send + Sync {
    /// Canonical language id (e.g. `python`)
    fn id(&self) -> &'static str;

    /// Alternative identifiers accepted from callers
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// File extensions (without dot); the first one is used for source files
    fn extensions(&self) -> &'static [&'static str];

    /// How code is executed
    fn runtime(&self) -> Runtime;

    /// Phase timeouts before configuration overrides
    fn timeouts(&self) -> PhaseTimeouts {
        PhaseTimeouts::default()
    }

    /// File name the source is written under
    fn source_file_name(&self, _code: &str) -> String {
        format!("main.{}", self.extensions().first().copied().unwrap_or("txt"))
    }

    /// Human-readable install hint shown when the toolchain is missing
    fn install_hint(&self) -> &'static str {
        "Install the language toolchain and make sure it is on PATH"
    }

    /// Heuristic static check; `None` means checking is unsupported
    fn check(&self, _code: &str) -> Option<Vec<Diagnostic>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unit_paths() {
        let unit = SourceUnit::new(Path::new("/tmp/ws"), "Main.java");
        assert_eq!(unit.source, PathBuf::from("/tmp/ws/Main.java"));
        assert_eq!(unit.stem, "Main");
        assert!(unit.artifact.starts_with("/tmp/ws"));
    }

    #[test]
    fn test_template_expansion() {
        let unit = SourceUnit::new(Path::new("/w"), "main.c");
        let template = CommandTemplate::new("cc", ["-o", "{artifact}", "{source}"]);
        let spec = template.expand(&unit);
        assert_eq!(spec.program, "cc");
        assert_eq!(spec.args[2], "/w/main.c");
        assert!(spec.args[1].starts_with("/w/main"));
    }

    #[test]
    fn test_override_keeps_artifact_program() {
        let toolchain = Toolchain::compiled(
            CommandTemplate::new("gcc", ["{source}"]),
            CommandTemplate::new("{artifact}", Vec::<String>::new()),
        );
        let over = LanguageOverride {
            program: Some("ignored".into()),
            compiler: Some("clang".into()),
            ..Default::default()
        };
        let toolchain = toolchain.with_override(Some(&over));
        assert_eq!(toolchain.compile.unwrap().program, "clang");
        assert_eq!(toolchain.run.program, "{artifact}");
    }

    #[test]
    fn test_timeout_override() {
        let over = LanguageOverride {
            run_timeout: Some(Duration::from_millis(300)),
            ..Default::default()
        };
        let timeouts = PhaseTimeouts::default().with_override(Some(&over));
        assert_eq!(timeouts.run, Duration::from_millis(300));
        assert_eq!(timeouts.compile, Duration::from_secs(30));
    }
}
