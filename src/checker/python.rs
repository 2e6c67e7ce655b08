//! Python heuristics: brackets, block colons, indentation, naming

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{logical_lines, scan, LogicalLine, Scan, PYTHON};
use super::{column_of, pattern, Diagnostic};

const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "def", "class", "try", "except", "finally", "with",
];

static DEF_NAME: OnceLock<Regex> = OnceLock::new();
static CLASS_NAME: OnceLock<Regex> = OnceLock::new();
static PRINT_STATEMENT: OnceLock<Regex> = OnceLock::new();
static NONE_COMPARISON: OnceLock<Regex> = OnceLock::new();

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &PYTHON);
    let logical = logical_lines(&scanned, true);

    let mut diagnostics = scanned.issues.clone();
    let mut indentation = Indentation::new();

    for line in &logical {
        check_statement(line, &scanned, &mut diagnostics);
        indentation.visit(line, &mut diagnostics);
    }
    indentation.finish(&mut diagnostics);

    let none_comparison = pattern(&NONE_COMPARISON, r"[=!]=\s*None\b");
    for (idx, text) in scanned.lines.iter().enumerate() {
        for found in none_comparison.find_iter(text) {
            diagnostics.push(Diagnostic::warning(
                idx + 1,
                column_of(text, found.start()),
                "comparison to None should use 'is' or 'is not'",
            ));
        }
    }

    diagnostics
}

/// Block keyword of a statement, looking through `async`
fn block_keyword(text: &str) -> Option<&'static str> {
    let mut words = text.split(|c: char| !(c.is_alphanumeric() || c == '_'));
    let mut first = words.next().unwrap_or("");
    if first == "async" {
        first = words.find(|w| !w.is_empty()).unwrap_or("");
    }
    BLOCK_KEYWORDS.iter().copied().find(|kw| *kw == first)
}

fn has_top_level_colon(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn check_statement(line: &LogicalLine, scanned: &Scan, out: &mut Vec<Diagnostic>) {
    let text = line.text.as_str();
    let lineno = line.start + 1;
    let column = line.start_column();

    if let Some(keyword) = block_keyword(text) {
        if !has_top_level_colon(text) {
            out.push(Diagnostic::error(
                line.end + 1,
                line.end_column(scanned),
                format!("expected ':' after '{}' statement", keyword),
            ));
        }
    }

    if pattern(&PRINT_STATEMENT, r#"^print\s+["'\w]"#).is_match(text) {
        out.push(Diagnostic::error(
            lineno,
            column,
            "missing parentheses in call to 'print'; use print(...)",
        ));
    }

    if let Some(caps) = pattern(&DEF_NAME, r"^(?:async\s+)?def\s+([A-Za-z_]\w*)").captures(text) {
        let name = &caps[1];
        if !name.starts_with("__") && name.chars().any(|c| c.is_uppercase()) {
            out.push(Diagnostic::warning(
                lineno,
                column,
                format!("function name '{}' should be snake_case", name),
            ));
        }
    }

    if let Some(caps) = pattern(&CLASS_NAME, r"^class\s+([A-Za-z_]\w*)").captures(text) {
        let name = &caps[1];
        if name.starts_with(|c: char| c.is_lowercase()) {
            out.push(Diagnostic::warning(
                lineno,
                column,
                format!("class name '{}' should use CapWords", name),
            ));
        }
    }

    if text.ends_with(';') {
        out.push(Diagnostic::info(
            line.end + 1,
            line.end_column(scanned) - 1,
            "unnecessary semicolon",
        ));
    }
}

fn indent_width(indent: &str) -> usize {
    indent.chars().fold(0, |width, c| match c {
        '\t' => (width / 8 + 1) * 8,
        _ => width + 1,
    })
}

/// Tracks the indentation stack across logical lines
#[derive(Debug)]
struct Indentation {
    levels: Vec<usize>,
    expecting: Option<usize>,
}

impl Indentation {
    fn new() -> Self {
        Self {
            levels: vec![0],
            expecting: None,
        }
    }

    fn top(&self) -> usize {
        self.levels.last().copied().unwrap_or(0)
    }

    fn visit(&mut self, line: &LogicalLine, out: &mut Vec<Diagnostic>) {
        let lineno = line.start + 1;
        let width = indent_width(&line.indent);
        let top = self.top();

        if line.indent.contains(' ') && line.indent.contains('\t') {
            out.push(Diagnostic::warning(lineno, 1, "indentation mixes tabs and spaces"));
        }

        let mut dedent = false;
        if let Some(opener) = self.expecting.take() {
            if width > top {
                self.levels.push(width);
            } else {
                out.push(Diagnostic::error(
                    lineno,
                    line.start_column(),
                    format!("expected an indented block after line {}", opener),
                ));
                dedent = width < top;
            }
        } else if width > top {
            out.push(Diagnostic::error(lineno, line.start_column(), "unexpected indent"));
        } else {
            dedent = width < top;
        }

        if dedent {
            while self.levels.len() > 1 && self.top() > width {
                self.levels.pop();
            }
            if self.top() != width {
                out.push(Diagnostic::error(
                    lineno,
                    line.start_column(),
                    "unindent does not match any outer indentation level",
                ));
            }
        }

        if line.text.ends_with(':') {
            self.expecting = Some(lineno);
        }
    }

    fn finish(self, out: &mut Vec<Diagnostic>) {
        if let Some(opener) = self.expecting {
            out.push(Diagnostic::error(
                opener,
                1,
                format!("expected an indented block after line {}", opener),
            ));
        }
    }
}
