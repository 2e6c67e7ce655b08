//! JavaScript: a compile-only QuickJS parse plus style heuristics
//!
//! The parse is authoritative for syntax. A parse that fails for any reason
//! other than a `SyntaxError` (engine start-up, memory limit, time budget) is
//! reported as a single informational diagnostic, and the scanner's bracket
//! and literal checks stand in for it.

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{logical_lines, scan, JAVASCRIPT};
use super::terminators::{missing_semicolons, TerminatorRules};
use super::{column_of, pattern, Diagnostic, Severity};
use crate::exec::interpreter::{syntax_check, SyntaxCheck};

const RULES: TerminatorRules = TerminatorRules {
    control_keywords: &[
        "if", "else", "for", "while", "do", "switch", "try", "catch", "finally", "case", "default",
        "function", "class", "with",
    ],
    severity: Severity::Info,
    lenient_before_close: true,
};

static VAR_DECLARATION: OnceLock<Regex> = OnceLock::new();
static CLASS_NAME: OnceLock<Regex> = OnceLock::new();

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &JAVASCRIPT);
    let mut diagnostics = Vec::new();

    match syntax_check(code) {
        SyntaxCheck::Valid => {}
        SyntaxCheck::SyntaxError { line, column, message } => {
            diagnostics.push(Diagnostic::error(line, column, message));
        }
        SyntaxCheck::Unavailable(detail) => {
            diagnostics.push(Diagnostic::info(1, 1, format!("syntax pre-check unavailable: {}", detail)));
            diagnostics.extend(scanned.issues.iter().cloned());
        }
    }

    let var_declaration = pattern(&VAR_DECLARATION, r"\bvar\s+");
    let class_name = pattern(&CLASS_NAME, r"\bclass\s+([A-Za-z_$][\w$]*)");

    for (idx, text) in scanned.lines.iter().enumerate() {
        let lineno = idx + 1;

        for found in var_declaration.find_iter(text) {
            diagnostics.push(Diagnostic::warning(
                lineno,
                column_of(text, found.start()),
                "prefer 'let' or 'const' over 'var'",
            ));
        }

        for (pos, op) in loose_equality(text) {
            diagnostics.push(Diagnostic::warning(
                lineno,
                column_of(text, pos),
                format!("use '{}=' instead of '{}'", op, op),
            ));
        }

        if let Some(name) = class_name.captures(text).and_then(|c| c.get(1)) {
            if name.as_str().starts_with(|c: char| c.is_lowercase()) {
                diagnostics.push(Diagnostic::warning(
                    lineno,
                    column_of(text, name.start()),
                    format!("class name '{}' should be PascalCase", name.as_str()),
                ));
            }
        }
    }

    let logical = logical_lines(&scanned, false);
    diagnostics.extend(missing_semicolons(&scanned, &logical, &RULES));

    diagnostics
}

/// Byte offsets of `==`/`!=` that are not part of `===`/`!==`
fn loose_equality(text: &str) -> Vec<(usize, &'static str)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    for i in 0..bytes.len().saturating_sub(1) {
        let op = match (bytes[i], bytes[i + 1]) {
            (b'=', b'=') => "==",
            (b'!', b'=') => "!=",
            _ => continue,
        };
        let before = i.checked_sub(1).map(|p| bytes[p]);
        let after = bytes.get(i + 2).copied();
        if after == Some(b'=') || matches!(before, Some(b'=' | b'!' | b'<' | b'>')) {
            continue;
        }
        found.push((i, op));
    }
    found
}
