//! Comment- and string-aware line scanner shared by the checkers
//!
//! The scanner blanks out comments and string contents so that later
//! heuristics can pattern-match on code only, tracks bracket nesting, and
//! reports unterminated strings/comments and unbalanced brackets. Columns in
//! the sanitized lines line up with the original source (per `char`).

use super::Diagnostic;

/// Lexical conventions of a language family
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    /// Line comment introducers
    pub line_comments: &'static [&'static str],
    /// Block comment delimiters
    pub block_comment: Option<(&'static str, &'static str)>,
    /// String/char quote characters
    pub quotes: &'static [char],
    /// Quotes whose literals may span lines
    pub multiline_quotes: &'static [char],
    /// Quotes whose literals have no escape sequences
    pub raw_quotes: &'static [char],
    /// Python-style `"""` / `'''` strings
    pub triple_quotes: bool,
    /// Rust-style `'a'` chars that coexist with `'a` lifetimes
    pub rust_chars: bool,
    /// A line comment marker only counts at line start or after whitespace
    pub comment_needs_space: bool,
    /// Track `()[]{}` balance
    pub brackets: bool,
}

/// C, C++ and Java
pub const C_LIKE: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\''],
    multiline_quotes: &[],
    raw_quotes: &[],
    triple_quotes: false,
    rust_chars: false,
    comment_needs_space: false,
    brackets: true,
};

/// JavaScript (template literals span lines)
pub const JAVASCRIPT: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\'', '`'],
    multiline_quotes: &['`'],
    raw_quotes: &[],
    triple_quotes: false,
    rust_chars: false,
    comment_needs_space: false,
    brackets: true,
};

/// Go (backtick raw strings span lines)
pub const GO: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\'', '`'],
    multiline_quotes: &['`'],
    raw_quotes: &['`'],
    triple_quotes: false,
    rust_chars: false,
    comment_needs_space: false,
    brackets: true,
};

/// Rust
pub const RUST: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"'],
    multiline_quotes: &['"'],
    raw_quotes: &[],
    triple_quotes: false,
    rust_chars: true,
    comment_needs_space: false,
    brackets: true,
};

/// Python
pub const PYTHON: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    multiline_quotes: &[],
    raw_quotes: &[],
    triple_quotes: true,
    rust_chars: false,
    comment_needs_space: false,
    brackets: true,
};

/// POSIX shells; `case` patterns make bracket balance meaningless
pub const SHELL: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    multiline_quotes: &['"', '\''],
    raw_quotes: &['\''],
    triple_quotes: false,
    rust_chars: false,
    comment_needs_space: true,
    brackets: false,
};

/// Result of scanning a source text
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Source lines with comments and string contents replaced by spaces
    pub lines: Vec<String>,
    /// Bracket nesting depth at the end of each line
    pub depth_after: Vec<usize>,
    /// Same, counting only `(` and `[`
    pub paren_depth_after: Vec<usize>,
    /// Whether each line starts inside a multi-line string or block comment
    pub continued: Vec<bool>,
    /// Lexical problems (unterminated literals, unbalanced brackets)
    pub issues: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Code,
    BlockComment { line: usize, column: usize },
    Str { quote: char, triple: bool, line: usize, column: usize },
}

fn starts_at(chars: &[char], i: usize, token: &str) -> bool {
    let mut j = i;
    for t in token.chars() {
        if chars.get(j) != Some(&t) {
            return false;
        }
        j += 1;
    }
    !token.is_empty()
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn opener_for(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

/// Scan `source` under the given lexical conventions
pub fn scan(source: &str, syntax: &Syntax) -> Scan {
    let mut out = Scan::default();
    let mut stack: Vec<(char, usize, usize)> = Vec::new();
    let mut state = State::Code;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let chars: Vec<char> = raw.chars().collect();
        let mut text = String::with_capacity(raw.len());
        let mut i = 0;
        out.continued.push(!matches!(state, State::Code));

        while i < chars.len() {
            match state {
                State::BlockComment { .. } => {
                    let close = syntax.block_comment.map(|(_, c)| c).unwrap_or("");
                    if starts_at(&chars, i, close) {
                        let n = close.chars().count();
                        text.extend(std::iter::repeat(' ').take(n));
                        i += n;
                        state = State::Code;
                    } else {
                        text.push(' ');
                        i += 1;
                    }
                }
                State::Str { quote, triple, .. } => {
                    let c = chars[i];
                    if c == '\\' && !syntax.raw_quotes.contains(&quote) {
                        text.push(' ');
                        if i + 1 < chars.len() {
                            text.push(' ');
                        }
                        i += 2;
                        continue;
                    }
                    if triple && c == quote && chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                        text.extend([quote, quote, quote]);
                        i += 3;
                        state = State::Code;
                    } else if !triple && c == quote {
                        text.push(quote);
                        i += 1;
                        state = State::Code;
                    } else {
                        text.push(' ');
                        i += 1;
                    }
                }
                State::Code => {
                    let c = chars[i];

                    let comment_allowed = !syntax.comment_needs_space || i == 0 || chars[i - 1].is_whitespace();
                    if comment_allowed && syntax.line_comments.iter().any(|t| starts_at(&chars, i, t)) {
                        break;
                    }

                    if let Some((open, _)) = syntax.block_comment {
                        if starts_at(&chars, i, open) {
                            let n = open.chars().count();
                            text.extend(std::iter::repeat(' ').take(n));
                            state = State::BlockComment { line: line_no, column: i + 1 };
                            i += n;
                            continue;
                        }
                    }

                    if syntax.rust_chars && c == '\'' {
                        if chars.get(i + 1) == Some(&'\\') {
                            // Escaped char literal: blank through the closing quote.
                            let end = (i + 3..chars.len()).find(|&j| chars[j] == '\'').unwrap_or(chars.len() - 1);
                            text.push('\'');
                            text.extend(std::iter::repeat(' ').take(end.saturating_sub(i + 1)));
                            if end > i {
                                text.push('\'');
                            }
                            i = end + 1;
                            continue;
                        }
                        if chars.get(i + 2) == Some(&'\'') {
                            text.push_str("' '");
                            i += 3;
                            continue;
                        }
                        // Lifetime or label.
                        text.push(c);
                        i += 1;
                        continue;
                    }

                    if syntax.quotes.contains(&c) {
                        if syntax.triple_quotes && chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                            text.extend([c, c, c]);
                            state = State::Str { quote: c, triple: true, line: line_no, column: i + 1 };
                            i += 3;
                        } else {
                            text.push(c);
                            state = State::Str { quote: c, triple: false, line: line_no, column: i + 1 };
                            i += 1;
                        }
                        continue;
                    }

                    if syntax.brackets {
                        match c {
                            '(' | '[' | '{' => stack.push((c, line_no, i + 1)),
                            ')' | ']' | '}' => close_bracket(&mut stack, c, line_no, i + 1, &mut out.issues),
                            _ => {}
                        }
                    }

                    text.push(c);
                    i += 1;
                }
            }
        }

        if let State::Str { quote, triple: false, line, column } = state {
            let continued = raw.ends_with('\\');
            if !syntax.multiline_quotes.contains(&quote) && !continued {
                out.issues.push(Diagnostic::error(line, column, "unterminated string literal"));
                state = State::Code;
            }
        }

        out.lines.push(text);
        out.depth_after.push(stack.len());
        out.paren_depth_after
            .push(stack.iter().filter(|&&(open, _, _)| open != '{').count());
    }

    match state {
        State::Code => {}
        State::BlockComment { line, column } => {
            out.issues.push(Diagnostic::error(line, column, "unterminated block comment"));
        }
        State::Str { line, column, .. } => {
            out.issues.push(Diagnostic::error(line, column, "unterminated string literal"));
        }
    }

    for (open, line, column) in stack {
        out.issues.push(Diagnostic::error(
            line,
            column,
            format!("unclosed '{}' (missing '{}')", open, closer_for(open)),
        ));
    }

    out
}

fn close_bracket(
    stack: &mut Vec<(char, usize, usize)>,
    close: char,
    line: usize,
    column: usize,
    issues: &mut Vec<Diagnostic>,
) {
    let open = opener_for(close);
    match stack.last().copied() {
        Some((top, _, _)) if top == open => {
            stack.pop();
        }
        Some((top, top_line, _)) => {
            issues.push(Diagnostic::error(
                line,
                column,
                format!(
                    "mismatched '{}': expected '{}' to close '{}' from line {}",
                    close,
                    closer_for(top),
                    top,
                    top_line
                ),
            ));
            if let Some(pos) = stack.iter().rposition(|&(o, _, _)| o == open) {
                stack.truncate(pos);
            }
        }
        None => {
            issues.push(Diagnostic::error(
                line,
                column,
                format!("unexpected '{}' with no matching '{}'", close, open),
            ));
        }
    }
}

/// A statement that may span several physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 0-based index of the first physical line
    pub start: usize,
    /// 0-based index of the last physical line
    pub end: usize,
    /// Sanitized, trimmed text of all physical lines joined by a space
    pub text: String,
    /// Leading whitespace of the first physical line
    pub indent: String,
}

impl LogicalLine {
    /// 1-based column just past the last code character of the last line
    pub fn end_column(&self, scan: &Scan) -> usize {
        scan.lines
            .get(self.end)
            .map(|l| l.trim_end().chars().count() + 1)
            .unwrap_or(1)
    }

    /// 1-based column of the first code character of the first line
    pub fn start_column(&self) -> usize {
        self.indent.chars().count() + 1
    }
}

/// Join physical lines into logical lines
///
/// A logical line continues while brackets are open or the physical line ends
/// in a backslash. With `join_braces` unset only `(` and `[` keep a line open,
/// so block bodies stay separate statements. Blank (or comment-only) lines are
/// dropped.
pub fn logical_lines(scan: &Scan, join_braces: bool) -> Vec<LogicalLine> {
    let depths = if join_braces {
        &scan.depth_after
    } else {
        &scan.paren_depth_after
    };

    let mut result = Vec::new();
    let mut current: Option<LogicalLine> = None;

    for (idx, line) in scan.lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() && current.is_none() {
            continue;
        }

        let piece = trimmed.trim_end_matches('\\').trim_end();
        if current.is_none() && scan.continued.get(idx).copied().unwrap_or(false) {
            current = result.pop();
        }
        match current.as_mut() {
            Some(logical) => {
                if !piece.is_empty() {
                    logical.text.push(' ');
                    logical.text.push_str(piece);
                }
                logical.end = idx;
            }
            None => {
                let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                current = Some(LogicalLine {
                    start: idx,
                    end: idx,
                    text: piece.to_string(),
                    indent,
                });
            }
        }

        let depth = depths.get(idx).copied().unwrap_or(0);
        if depth == 0 && !trimmed.ends_with('\\') {
            if let Some(done) = current.take() {
                result.push(done);
            }
        }
    }

    if let Some(done) = current.take() {
        result.push(done);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_strings_are_blanked() {
        let scan = scan("int a = 1; // brace {\nchar *s = \"{ not code }\";", &C_LIKE);
        assert!(scan.issues.is_empty());
        assert!(!scan.lines[0].contains('{'));
        assert!(!scan.lines[1].contains('{'));
        assert_eq!(scan.lines[1].chars().count(), "char *s = \"{ not code }\";".chars().count());
    }

    #[test]
    fn test_unclosed_brace_reported_at_opener() {
        let scan = scan("int main() {\n  return 0;\n", &C_LIKE);
        assert_eq!(scan.issues.len(), 1);
        assert_eq!((scan.issues[0].line, scan.issues[0].column), (1, 12));
        assert!(scan.issues[0].message.contains("unclosed '{'"));
    }

    #[test]
    fn test_unexpected_closer() {
        let scan = scan("x = 1)\n", &PYTHON);
        assert_eq!(scan.issues.len(), 1);
        assert!(scan.issues[0].message.starts_with("unexpected ')'"));
    }

    #[test]
    fn test_mismatched_closer_recovers() {
        let scan = scan("f(a[1)]\n", &C_LIKE);
        assert!(scan.issues[0].message.starts_with("mismatched ')'"));
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let scan = scan("/* {\n } */ int x;\n", &C_LIKE);
        assert!(scan.issues.is_empty());
        assert_eq!(scan.lines[1].trim(), "int x;");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let scan = scan("int x; /* oops\n", &C_LIKE);
        assert_eq!(scan.issues[0].message, "unterminated block comment");
        assert_eq!(scan.issues[0].column, 8);
    }

    #[test]
    fn test_unterminated_string_on_line() {
        let scan = scan("print(\"hello)\nx = 1\n", &PYTHON);
        assert!(scan.issues.iter().any(|d| d.message == "unterminated string literal" && d.line == 1));
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let scan = scan("s = \"\"\"a {\nb\n\"\"\"\nx = 1\n", &PYTHON);
        assert!(scan.issues.is_empty());
    }

    #[test]
    fn test_rust_lifetimes_are_not_chars() {
        let scan = scan("fn f<'a>(x: &'a str) -> char { 'x' }\n", &RUST);
        assert!(scan.issues.is_empty());
    }

    #[test]
    fn test_shell_hash_in_word_is_not_comment() {
        let scan = scan("echo $# args # trailing\n", &SHELL);
        assert!(scan.lines[0].contains("$#"));
        assert!(!scan.lines[0].contains("trailing"));
    }

    #[test]
    fn test_logical_lines_join_open_brackets() {
        let scan = scan("foo(1,\n    2)\nbar()\n", &C_LIKE);
        let logical = logical_lines(&scan, false);
        assert_eq!(logical.len(), 2);
        assert_eq!(logical[0].text, "foo(1, 2)");
        assert_eq!((logical[0].start, logical[0].end), (0, 1));
    }

    #[test]
    fn test_multiline_string_tail_joins_previous_statement() {
        let source = "def f():\n    s = \"\"\"a\nb\n\"\"\"\n    return s\n";
        let scan = scan(source, &PYTHON);
        let logical = logical_lines(&scan, true);
        assert_eq!(logical.len(), 3);
        assert_eq!((logical[1].start, logical[1].end), (1, 3));
        assert_eq!(logical[2].indent, "    ");
    }

    #[test]
    fn test_logical_lines_keep_block_bodies_apart() {
        let source = "int main() {\n  int x = 1;\n  return x;\n}\n";
        let scan = scan(source, &C_LIKE);
        assert_eq!(logical_lines(&scan, false).len(), 4);
        assert_eq!(logical_lines(&scan, true).len(), 1);
    }
}
