//! Shell (bash/sh) heuristics: keyword pairing, test brackets, assignments

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{scan, SHELL};
use super::{pattern, Diagnostic};

static SPACED_ASSIGNMENT: OnceLock<Regex> = OnceLock::new();

/// Words that leave the following word in command position
const PREFIX_WORDS: &[&str] = &["then", "do", "else", "if", "elif", "while", "until", "!", "{", "time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    If,
    Case,
    Do,
}

impl Opener {
    fn word(self) -> &'static str {
        match self {
            Opener::If => "if",
            Opener::Case => "case",
            Opener::Do => "do",
        }
    }

    fn closer(self) -> &'static str {
        match self {
            Opener::If => "fi",
            Opener::Case => "esac",
            Opener::Do => "done",
        }
    }
}

/// A word in command position with its 1-based column
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    column: usize,
}

/// Words of a line with char columns
fn words(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (pos, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &line[s..pos]));
            }
        } else if start.is_none() {
            start = Some(pos);
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

/// Words that start a command (first of each `;`/`&`/`|` segment, plus after keywords)
fn command_words(line: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut offset = 0;
    for segment in line.split([';', '&', '|']) {
        for (pos, word) in words(segment) {
            let column = super::column_of(line, offset + pos);
            out.push(Word { text: word, column });
            if !PREFIX_WORDS.contains(&word) {
                break;
            }
        }
        offset += segment.len() + 1;
    }
    out
}

fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &SHELL);
    let mut diagnostics = scanned.issues.clone();
    let mut stack: Vec<(Opener, usize, usize)> = Vec::new();
    let assignment = pattern(&SPACED_ASSIGNMENT, r"^\s*([A-Za-z_]\w*)\s+=(\s|$)");

    for (idx, text) in scanned.lines.iter().enumerate() {
        let lineno = idx + 1;
        let line_words = words(text);
        let next_first = scanned.lines[idx + 1..]
            .iter()
            .map(|l| first_word(l))
            .find(|w| !w.is_empty())
            .unwrap_or("");

        if let Some(caps) = assignment.captures(text) {
            if let Some(name) = caps.get(1) {
                diagnostics.push(Diagnostic::error(
                    lineno,
                    super::column_of(text, name.start()),
                    format!("no spaces allowed around '=' when assigning '{}'", name.as_str()),
                ));
            }
        }

        for word in command_words(text) {
            match word.text {
                "if" | "elif" => {
                    if word.text == "if" {
                        stack.push((Opener::If, lineno, word.column));
                    }
                    let has_then = line_words.iter().any(|(_, w)| *w == "then") || next_first == "then";
                    if !has_then {
                        diagnostics.push(Diagnostic::error(
                            lineno,
                            word.column,
                            format!("'{}' without 'then'", word.text),
                        ));
                    }
                }
                "for" | "while" | "until" | "select" => {
                    let has_do = line_words.iter().any(|(_, w)| *w == "do") || next_first == "do";
                    if !has_do {
                        diagnostics.push(Diagnostic::error(
                            lineno,
                            word.column,
                            format!("'{}' loop without 'do'", word.text),
                        ));
                    }
                }
                "do" => stack.push((Opener::Do, lineno, word.column)),
                "case" => stack.push((Opener::Case, lineno, word.column)),
                "fi" | "done" | "esac" => close(&mut stack, word, lineno, &mut diagnostics),
                "[" | "[[" => {
                    let closing = if word.text == "[" { "]" } else { "]]" };
                    let closed = line_words.iter().any(|(_, w)| {
                        let w = w.trim_end_matches([';', '&', '|']);
                        w == closing || (w.ends_with(closing) && w != word.text)
                    });
                    if !closed {
                        diagnostics.push(Diagnostic::error(
                            lineno,
                            word.column,
                            format!("'{}' without matching '{}'", word.text, closing),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    for (opener, line, column) in stack {
        diagnostics.push(Diagnostic::error(
            line,
            column,
            format!("'{}' is never closed; expected '{}'", opener.word(), opener.closer()),
        ));
    }

    diagnostics
}

fn close(stack: &mut Vec<(Opener, usize, usize)>, word: Word<'_>, lineno: usize, out: &mut Vec<Diagnostic>) {
    match stack.last() {
        Some((opener, _, _)) if opener.closer() == word.text => {
            stack.pop();
        }
        Some((opener, open_line, _)) => out.push(Diagnostic::error(
            lineno,
            word.column,
            format!(
                "unexpected '{}'; '{}' from line {} needs '{}' first",
                word.text,
                opener.word(),
                open_line,
                opener.closer()
            ),
        )),
        None => out.push(Diagnostic::error(
            lineno,
            word.column,
            format!("unexpected '{}' with nothing to close", word.text),
        )),
    }
}
