//! Rust heuristics

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{logical_lines, scan, RUST};
use super::{column_of, pattern, Diagnostic};

static MACRO_WITHOUT_BANG: OnceLock<Regex> = OnceLock::new();
static FN_NAME: OnceLock<Regex> = OnceLock::new();
static TYPE_NAME: OnceLock<Regex> = OnceLock::new();
static MAIN_FN: OnceLock<Regex> = OnceLock::new();

const CONTINUATIONS: &[&str] = &[".", "?", "+", "-", "*", "/", "%", "&", "|", "=", "<", ">", ")", "]", ",", "{", "as "];

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &RUST);
    let mut diagnostics = scanned.issues.clone();

    let macros = pattern(
        &MACRO_WITHOUT_BANG,
        r"(^|[^\w.:!])(println|print|eprintln|eprint|format|vec|panic|assert|assert_eq|write|writeln)\s*[(\[]",
    );
    let fn_name = pattern(&FN_NAME, r"\bfn\s+([A-Za-z_]\w*)");
    let type_name = pattern(&TYPE_NAME, r"\b(?:struct|enum|trait)\s+([A-Za-z_]\w*)");

    for (idx, text) in scanned.lines.iter().enumerate() {
        let lineno = idx + 1;
        let declares_fn = fn_name.is_match(text);

        for caps in macros.captures_iter(text) {
            let Some(name) = caps.get(2) else { continue };
            if declares_fn {
                continue;
            }
            diagnostics.push(Diagnostic::error(
                lineno,
                column_of(text, name.start()),
                format!("'{}' is a macro; call it as {}!(...)", name.as_str(), name.as_str()),
            ));
        }

        if let Some(name) = fn_name.captures(text).and_then(|c| c.get(1)) {
            if name.as_str().chars().any(|c| c.is_uppercase()) {
                diagnostics.push(Diagnostic::warning(
                    lineno,
                    column_of(text, name.start()),
                    format!("function '{}' should have a snake_case name", name.as_str()),
                ));
            }
        }

        if let Some(name) = type_name.captures(text).and_then(|c| c.get(1)) {
            if name.as_str().starts_with(|c: char| c.is_lowercase()) || name.as_str().contains('_') {
                diagnostics.push(Diagnostic::warning(
                    lineno,
                    column_of(text, name.start()),
                    format!("type '{}' should have an upper camel case name", name.as_str()),
                ));
            }
        }
    }

    let logical = logical_lines(&scanned, false);
    for (idx, line) in logical.iter().enumerate() {
        let text = line.text.as_str();
        if !text.starts_with("let ") || text.ends_with(';') || text.ends_with('{') || text.ends_with('=') {
            continue;
        }
        let continued = logical
            .get(idx + 1)
            .map(|next| CONTINUATIONS.iter().any(|t| next.text.starts_with(t)))
            .unwrap_or(false);
        if !continued {
            diagnostics.push(Diagnostic::error(
                line.end + 1,
                line.end_column(&scanned),
                "expected ';' after 'let' statement",
            ));
        }
    }

    if !scanned
        .lines
        .iter()
        .any(|l| pattern(&MAIN_FN, r"\bfn\s+main\s*\(").is_match(l))
    {
        diagnostics.push(Diagnostic::info(
            1,
            1,
            "no `fn main()`; the crate cannot be built as a binary",
        ));
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "fn main() {\n    let name = \"world\";\n    let v = vec![1, 2];\n    println!(\"hello {} {:?}\", name, v);\n}\n";

    #[test]
    fn test_clean_program() {
        assert!(check(HELLO).is_empty(), "{:?}", check(HELLO));
    }

    #[test]
    fn test_macro_without_bang() {
        let found = check("fn main() {\n    println(\"hi\");\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (2, 5));
        assert!(found[0].message.contains("println!"));
    }

    #[test]
    fn test_method_named_like_macro_is_fine() {
        let code = "fn main() {\n    let mut s = String::new();\n    s.write(1);\n}\n";
        assert!(check(code).is_empty());
    }

    #[test]
    fn test_let_without_semicolon() {
        let found = check("fn main() {\n    let x = 5\n    let y = x\n        + 1;\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].column, 14);
    }

    #[test]
    fn test_naming_and_missing_main() {
        let found = check("struct my_point;\nfn DoIt() {}\n");
        assert_eq!(found.len(), 3);
        assert!(found[0].message.contains("upper camel case"));
        assert!(found[1].message.contains("snake_case"));
        assert!(!found[2].is_error());
    }

    #[test]
    fn test_lifetimes_do_not_break_balance() {
        let code = "fn first<'a>(s: &'a str) -> &'a str {\n    &s[..1]\n}\nfn main() {\n    let c = '{';\n    println!(\"{}\", first(\"x\"));\n}\n";
        assert!(check(code).is_empty(), "{:?}", check(code));
    }
}
