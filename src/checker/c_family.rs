//! C and C++ heuristics

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{logical_lines, scan, Scan, C_LIKE};
use super::terminators::{missing_semicolons, TerminatorRules};
use super::{column_of, pattern, Diagnostic, Severity};

/// Which language of the family the snippet is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    C,
    Cpp,
}

const RULES: TerminatorRules = TerminatorRules {
    control_keywords: &["if", "else", "for", "while", "do", "switch", "try", "catch", "case", "default"],
    severity: Severity::Error,
    lenient_before_close: false,
};

const CPP_ONLY_HEADERS: &[&str] = &[
    "iostream", "vector", "string", "map", "set", "algorithm", "memory", "unordered_map", "sstream",
];

static INCLUDE: OnceLock<Regex> = OnceLock::new();
static TYPE_DEFINITION: OnceLock<Regex> = OnceLock::new();
static MAIN_FUNCTION: OnceLock<Regex> = OnceLock::new();
static GETS_CALL: OnceLock<Regex> = OnceLock::new();

pub fn check(code: &str, dialect: Dialect) -> Vec<Diagnostic> {
    let scanned = scan(code, &C_LIKE);
    let logical = logical_lines(&scanned, false);

    let mut diagnostics = scanned.issues.clone();
    diagnostics.extend(missing_semicolons(&scanned, &logical, &RULES));
    diagnostics.extend(check_includes(code, dialect));
    diagnostics.extend(check_type_terminators(&scanned));

    let gets = pattern(&GETS_CALL, r"\bgets\s*\(");
    for (idx, text) in scanned.lines.iter().enumerate() {
        if let Some(found) = gets.find(text) {
            diagnostics.push(Diagnostic::warning(
                idx + 1,
                column_of(text, found.start()),
                "gets() is unsafe and removed from the standard; use fgets()",
            ));
        }
    }

    let has_main = scanned
        .lines
        .iter()
        .any(|l| pattern(&MAIN_FUNCTION, r"\bmain\s*\(").is_match(l));
    if !has_main {
        diagnostics.push(Diagnostic::info(
            1,
            1,
            "no main() function; the program cannot be linked into an executable",
        ));
    }

    diagnostics
}

/// `#include` lines, read from the raw source since the scanner blanks strings
fn check_includes(code: &str, dialect: Dialect) -> Vec<Diagnostic> {
    let include = pattern(&INCLUDE, r#"^\s*#\s*include\s*(?:<([^>]+)>|"([^"]+)")"#);
    let mut out = Vec::new();

    for (idx, line) in code.lines().enumerate() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with('#') || !trimmed[1..].trim_start().starts_with("include") {
            continue;
        }
        let column = column_of(line, line.len() - trimmed.len());
        match include.captures(line) {
            None => out.push(Diagnostic::error(
                idx + 1,
                column,
                "malformed #include; expected <header> or \"header\"",
            )),
            Some(caps) => {
                let header = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
                if dialect == Dialect::C && CPP_ONLY_HEADERS.contains(&header) {
                    out.push(Diagnostic::error(
                        idx + 1,
                        column,
                        format!("<{}> is a C++ header; this file is compiled as C", header),
                    ));
                }
                if dialect == Dialect::Cpp && header == "bits/stdc++.h" {
                    out.push(Diagnostic::info(
                        idx + 1,
                        column,
                        "<bits/stdc++.h> is a GCC-only header",
                    ));
                }
            }
        }
    }

    out
}

/// `struct`/`class`/`enum`/`union` definitions must end with `};`
fn check_type_terminators(scanned: &Scan) -> Vec<Diagnostic> {
    let definition = pattern(&TYPE_DEFINITION, r"\b(?:struct|class|enum|union)\b[^;()=]*$");
    let mut out = Vec::new();
    let mut braces: Vec<bool> = Vec::new();
    let mut previous = String::new();

    for (idx, text) in scanned.lines.iter().enumerate() {
        for (pos, c) in text.char_indices() {
            match c {
                '{' => {
                    let prefix = text[..pos].trim();
                    let owner = if prefix.is_empty() { previous.as_str() } else { prefix };
                    braces.push(definition.is_match(owner));
                }
                '}' => {
                    if braces.pop() == Some(true) {
                        let rest = text[pos + 1..].trim_start();
                        if rest.is_empty() || !(rest.starts_with(';') || rest.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '*')) {
                            let next = scanned.lines[idx + 1..]
                                .iter()
                                .map(|l| l.trim())
                                .find(|l| !l.is_empty())
                                .unwrap_or("");
                            if rest.is_empty() && next.starts_with(';') {
                                continue;
                            }
                            out.push(Diagnostic::error(
                                idx + 1,
                                column_of(text, pos) + 1,
                                "missing ';' after type definition",
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            previous = trimmed.to_string();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_C: &str = "#include <stdio.h>\n\nint main(void) {\n    int n = 2;\n    printf(\"%d\\n\", n);\n    return 0;\n}\n";

    #[test]
    fn test_clean_c_program() {
        assert!(check(HELLO_C, Dialect::C).is_empty(), "{:?}", check(HELLO_C, Dialect::C));
    }

    #[test]
    fn test_missing_semicolon_in_c() {
        let code = HELLO_C.replace("return 0;", "return 0");
        let found = check(&code, Dialect::C);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (6, 13));
    }

    #[test]
    fn test_cpp_header_in_c() {
        let found = check("#include <iostream>\nint main() { return 0; }\n", Dialect::C);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("C++ header"));
        assert!(check("#include <iostream>\nint main() { return 0; }\n", Dialect::Cpp).is_empty());
    }

    #[test]
    fn test_malformed_include() {
        let found = check("#include stdio.h\nint main() { return 0; }\n", Dialect::C);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.starts_with("malformed #include"));
    }

    #[test]
    fn test_struct_without_semicolon() {
        let code = "struct Point {\n    int x;\n    int y;\n}\n\nint main() { return 0; }\n";
        let found = check(code, Dialect::C);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "missing ';' after type definition");
        assert_eq!((found[0].line, found[0].column), (4, 2));
    }

    #[test]
    fn test_struct_with_declarator_is_fine() {
        let code = "struct Point {\n    int x;\n} origin;\n\nclass A {\npublic:\n    int v;\n};\nint main() { return 0; }\n";
        assert!(check(code, Dialect::Cpp).is_empty());
    }

    #[test]
    fn test_unbalanced_brace() {
        let found = check("int main() {\n    return 0;\n", Dialect::Cpp);
        assert!(found.iter().any(|d| d.is_error() && d.line == 1 && d.message.starts_with("unclosed")));
    }

    #[test]
    fn test_gets_and_missing_main() {
        let found = check("void read(char *b) {\n    gets(b);\n}\n", Dialect::C);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[1].severity, Severity::Info);
    }
}
