//! Static checkers
//!
//! Best-effort, per-language heuristics that report diagnostics without
//! compiling or running anything. Each language module exposes
//! `check(code) -> Vec<Diagnostic>`; adapters wire them up through
//! [`crate::languages::LanguageAdapter::check`].

pub mod c_family;
pub mod go;
pub mod java;
pub mod javascript;
pub mod json;
pub mod python;
pub mod rust;
pub mod scan;
pub mod shell;
mod terminators;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Compile a constant pattern once
pub(crate) fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static pattern is valid"))
}

/// 1-based column of a byte offset within a line
pub(crate) fn column_of(line: &str, byte_offset: usize) -> usize {
    line.get(..byte_offset).map(|prefix| prefix.chars().count()).unwrap_or(0) + 1
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single checker finding. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(line: usize, column: usize, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            line: line.max(1),
            column: column.max(1),
            message: message.into(),
            severity,
        }
    }

    pub fn error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(line, column, message, Severity::Error)
    }

    pub fn warning(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(line, column, message, Severity::Warning)
    }

    pub fn info(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(line, column, message, Severity::Info)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Checker output: errors, and everything else grouped as warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub language: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl CheckReport {
    /// Split diagnostics by severity, keeping emission order within each list
    pub fn from_diagnostics(language: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        let (errors, warnings) = diagnostics.into_iter().partition(Diagnostic::is_error);
        Self {
            language: language.into(),
            errors,
            warnings,
        }
    }

    /// Report for a language with no checker
    pub fn unsupported(language: impl Into<String>) -> Self {
        Self::from_diagnostics(
            language,
            vec![Diagnostic::warning(1, 1, "unsupported language for checking")],
        )
    }

    /// Report for a checker that failed internally
    pub fn internal_failure(language: impl Into<String>, detail: &str) -> Self {
        Self::from_diagnostics(
            language,
            vec![Diagnostic::warning(1, 1, format!("checker failed internally: {}", detail))],
        )
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let d = Diagnostic::error(0, 0, "x");
        assert_eq!((d.line, d.column), (1, 1));
    }

    #[test]
    fn test_report_partitions_and_keeps_order() {
        let report = CheckReport::from_diagnostics(
            "python",
            vec![
                Diagnostic::info(3, 1, "c"),
                Diagnostic::error(2, 1, "b"),
                Diagnostic::warning(1, 1, "a"),
                Diagnostic::error(1, 1, "d"),
            ],
        );
        assert_eq!(report.errors.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(), ["b", "d"]);
        assert_eq!(report.warnings.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(), ["c", "a"]);
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_unsupported_report() {
        let report = CheckReport::unsupported("cobol");
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].message, "unsupported language for checking");
        assert_eq!(report.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_value(Diagnostic::info(1, 2, "m")).unwrap();
        assert_eq!(json["severity"], "info");
        assert_eq!(json["line"], 1);
        assert_eq!(json["column"], 2);
    }
}
