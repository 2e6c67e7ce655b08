//! Java heuristics

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{logical_lines, scan, C_LIKE};
use super::terminators::{missing_semicolons, TerminatorRules};
use super::{column_of, pattern, Diagnostic, Severity};

const RULES: TerminatorRules = TerminatorRules {
    control_keywords: &[
        "if", "else", "for", "while", "do", "switch", "try", "catch", "finally", "case", "default",
        "synchronized",
    ],
    severity: Severity::Error,
    lenient_before_close: false,
};

static TYPE_NAME: OnceLock<Regex> = OnceLock::new();
static METHOD_NAME: OnceLock<Regex> = OnceLock::new();
static MAIN_METHOD: OnceLock<Regex> = OnceLock::new();
static TOP_LEVEL_PUBLIC: OnceLock<Regex> = OnceLock::new();
static STRING_EQUALITY: OnceLock<Regex> = OnceLock::new();

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &C_LIKE);
    let logical = logical_lines(&scanned, false);

    let mut diagnostics = scanned.issues.clone();
    diagnostics.extend(missing_semicolons(&scanned, &logical, &RULES));

    let type_name = pattern(&TYPE_NAME, r"\b(?:class|interface|enum|record)\s+([A-Za-z_$][\w$]*)");
    let method_name = pattern(
        &METHOD_NAME,
        r"^\s*(?:(?:public|private|protected|static|final|abstract|synchronized)\s+)+(?:<[^>]+>\s+)?[\w<>\[\],?.]+\s+([A-Za-z_$][\w$]*)\s*\(",
    );
    let top_level_public = pattern(&TOP_LEVEL_PUBLIC, r"^public\s+(?:final\s+|abstract\s+)*class\b");
    let string_equality = pattern(&STRING_EQUALITY, r#"[=!]=\s*"|"\s*[=!]="#);

    let mut saw_type = false;
    let mut public_classes = 0usize;

    for (idx, text) in scanned.lines.iter().enumerate() {
        let lineno = idx + 1;

        for caps in type_name.captures_iter(text) {
            saw_type = true;
            if let Some(name) = caps.get(1) {
                if name.as_str().starts_with(|c: char| c.is_lowercase()) {
                    diagnostics.push(Diagnostic::warning(
                        lineno,
                        column_of(text, name.start()),
                        format!("type name '{}' should be PascalCase", name.as_str()),
                    ));
                }
            }
        }

        if let Some(name) = method_name.captures(text).and_then(|c| c.get(1)) {
            if name.as_str().starts_with(|c: char| c.is_uppercase()) {
                diagnostics.push(Diagnostic::warning(
                    lineno,
                    column_of(text, name.start()),
                    format!("method name '{}' should be camelCase", name.as_str()),
                ));
            }
        }

        if top_level_public.is_match(text) {
            public_classes += 1;
            if public_classes > 1 {
                diagnostics.push(Diagnostic::error(
                    lineno,
                    1,
                    "only one public top-level class is allowed per file",
                ));
            }
        }

        for found in string_equality.find_iter(text) {
            diagnostics.push(Diagnostic::warning(
                lineno,
                column_of(text, found.start()),
                "compare strings with equals(), not == or !=",
            ));
        }
    }

    let has_main = scanned
        .lines
        .iter()
        .any(|l| pattern(&MAIN_METHOD, r"\bstatic\s+void\s+main\s*\(").is_match(l));
    if saw_type && !has_main {
        diagnostics.push(Diagnostic::info(
            1,
            1,
            "no 'public static void main(String[] args)' method; the program has no entry point",
        ));
    }

    diagnostics
}
