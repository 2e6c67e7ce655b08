use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{CommandTemplate, LanguageAdapter, PhaseTimeouts, Runtime, Toolchain};

#[derive(Debug, Clone, Default)]
pub struct JavaAdapter;

fn public_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*public\s+(?:final\s+|abstract\s+)*class\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("static pattern is valid")
    })
}

/// javac requires a public class to live in a file of the same name.
pub(crate) fn detect_class_name(code: &str) -> String {
    public_class_pattern()
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "Main".to_string())
}

impl LanguageAdapter for JavaAdapter {
    fn id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::Toolchain(Toolchain::compiled(
            CommandTemplate::new("javac", ["-encoding", "UTF-8", "-d", "{dir}", "{source}"]),
            CommandTemplate::new(
                "java",
                ["-Xmx256m", "-Xss8m", "-XX:+UseSerialGC", "-Dfile.encoding=UTF-8", "-cp", "{dir}", "{stem}"],
            ),
        ))
    }

    fn timeouts(&self) -> PhaseTimeouts {
        PhaseTimeouts {
            compile: Duration::from_secs(45),
            run: Duration::from_secs(15),
        }
    }

    fn source_file_name(&self, code: &str) -> String {
        format!("{}.java", detect_class_name(code))
    }

    fn install_hint(&self) -> &'static str {
        "A Java JDK (javac + java) is not installed. Install one (e.g. `apt install default-jdk` or https://adoptium.net) and make sure it is on PATH"
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::java::check(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_detection() {
        assert_eq!(detect_class_name("public class Hello {\n}"), "Hello");
        assert_eq!(detect_class_name("  public final class Solver{}"), "Solver");
        assert_eq!(detect_class_name("class Hidden {}"), "Main");
    }

    #[test]
    fn test_source_file_matches_class() {
        let adapter = JavaAdapter;
        assert_eq!(adapter.source_file_name("public class Demo {}"), "Demo.java");
    }
}
