//! Missing `;` detection for brace languages

use super::scan::{LogicalLine, Scan};
use super::{Diagnostic, Severity};

pub(crate) struct TerminatorRules {
    /// Statements introduced by these words never need a terminator on the header line
    pub control_keywords: &'static [&'static str],
    pub severity: Severity,
    /// A statement directly before a closing `}` may omit its terminator
    pub lenient_before_close: bool,
}

/// Tokens that continue the previous statement when they start a line
const CONTINUATIONS: &[&str] = &[
    "{", ".", "?", ":", "+", "-", "*", "/", "%", "&", "|", "^", "=", "<", ">", ")", "]", ",",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceKind {
    Block,
    Initializer,
}

fn first_word(text: &str) -> &str {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("")
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|w| w == word)
}

fn opens_initializer(prefix: &str, previous: Option<&str>) -> bool {
    let prefix = prefix.trim_end();
    let owner = if prefix.is_empty() {
        previous.unwrap_or("").trim_end()
    } else {
        prefix
    };
    owner.ends_with('=')
        || owner.ends_with(']')
        || owner.ends_with(',')
        || owner.ends_with('(')
        || owner.ends_with('{')
        || owner.ends_with("return")
        || has_word(owner, "enum")
}

fn needs_terminator(text: &str) -> bool {
    match text.chars().last() {
        Some(c) if c.is_alphanumeric() || matches!(c, '_' | ')' | ']' | '"' | '\'') => true,
        _ => text.ends_with("++") || text.ends_with("--"),
    }
}

pub(crate) fn missing_semicolons(
    scan: &Scan,
    logical: &[LogicalLine],
    rules: &TerminatorRules,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut braces: Vec<BraceKind> = Vec::new();

    for (idx, line) in logical.iter().enumerate() {
        let text = line.text.trim();
        let in_initializer = braces.last() == Some(&BraceKind::Initializer);

        let previous = idx.checked_sub(1).map(|p| logical[p].text.as_str());
        for (pos, c) in text.char_indices() {
            match c {
                '{' => {
                    let kind = if opens_initializer(&text[..pos], previous) {
                        BraceKind::Initializer
                    } else {
                        BraceKind::Block
                    };
                    braces.push(kind);
                }
                '}' => {
                    braces.pop();
                }
                _ => {}
            }
        }

        if text.is_empty() || text.starts_with('#') || text.starts_with('@') {
            continue;
        }
        if in_initializer || !needs_terminator(text) {
            continue;
        }

        let head = text.trim_start_matches(|c: char| c == '}' || c.is_whitespace());
        if rules.control_keywords.contains(&first_word(head)) {
            continue;
        }

        if let Some(next) = logical.get(idx + 1) {
            let next = next.text.trim_start();
            if CONTINUATIONS.iter().any(|t| next.starts_with(t)) {
                continue;
            }
            if rules.lenient_before_close && next.starts_with('}') {
                continue;
            }
        }

        diagnostics.push(Diagnostic::new(
            line.end + 1,
            line.end_column(scan),
            "missing ';' at end of statement",
            rules.severity,
        ));
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::scan::{logical_lines, scan, C_LIKE};

    const RULES: TerminatorRules = TerminatorRules {
        control_keywords: &["if", "else", "for", "while", "do", "switch", "case", "default"],
        severity: Severity::Error,
        lenient_before_close: false,
    };

    fn run(source: &str) -> Vec<Diagnostic> {
        let scanned = scan(source, &C_LIKE);
        let logical = logical_lines(&scanned, false);
        missing_semicolons(&scanned, &logical, &RULES)
    }

    #[test]
    fn test_flags_statement_without_semicolon() {
        let found = run("int main() {\n  int x = 1\n  return x;\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (2, 12));
    }

    #[test]
    fn test_headers_and_continuations_are_not_flagged() {
        let source = "int main()\n{\n  if (x)\n    y();\n  int z = a\n    + b;\n  return 0;\n}\n";
        assert!(run(source).is_empty());
    }

    #[test]
    fn test_initializer_lists_are_not_flagged() {
        let source = "int a[] = {\n  1,\n  2\n};\nenum Color {\n  RED,\n  GREEN\n};\n";
        assert!(run(source).is_empty());
    }

    #[test]
    fn test_multiline_call_is_one_statement() {
        let found = run("void f() {\n  g(1,\n    2)\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
    }
}
