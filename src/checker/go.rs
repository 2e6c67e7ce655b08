//! Go heuristics

use std::sync::OnceLock;

use regex::Regex;

use super::scan::{scan, GO};
use super::{column_of, pattern, Diagnostic};

const BRACE_OWNERS: &[&str] = &["func", "if", "for", "else", "switch", "select", "type", "struct"];

static PACKAGE: OnceLock<Regex> = OnceLock::new();
static MAIN_FUNC: OnceLock<Regex> = OnceLock::new();
static PACKAGE_USE: OnceLock<Regex> = OnceLock::new();
static IMPORT_PATH: OnceLock<Regex> = OnceLock::new();

pub fn check(code: &str) -> Vec<Diagnostic> {
    let scanned = scan(code, &GO);
    let mut diagnostics = scanned.issues.clone();

    let first_code = scanned
        .lines
        .iter()
        .enumerate()
        .find(|(_, l)| !l.trim().is_empty());
    let package = pattern(&PACKAGE, r"^\s*package\s+([A-Za-z_]\w*)\s*$");
    let package_name = match first_code {
        Some((idx, text)) => match package.captures(text) {
            Some(caps) => caps.get(1).map(|m| m.as_str().to_string()),
            None => {
                diagnostics.push(Diagnostic::error(
                    idx + 1,
                    1,
                    "expected 'package' declaration as the first statement",
                ));
                None
            }
        },
        None => None,
    };

    let mut previous: Option<&str> = None;
    for (idx, text) in scanned.lines.iter().enumerate() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed == "{" {
            let owner = previous
                .and_then(|p| p.split_whitespace().next())
                .map(|w| w.trim_start_matches('}'))
                .unwrap_or("");
            if BRACE_OWNERS.contains(&owner) {
                diagnostics.push(Diagnostic::error(
                    idx + 1,
                    column_of(text, text.len() - text.trim_start().len()),
                    "unexpected newline before '{'; the opening brace must be on the same line",
                ));
            }
        }

        if trimmed.ends_with(';') && !trimmed.starts_with("for ") {
            diagnostics.push(Diagnostic::info(
                idx + 1,
                text.trim_end().chars().count(),
                "unnecessary semicolon; gofmt removes it",
            ));
        }

        previous = Some(trimmed);
    }

    diagnostics.extend(check_imports(code, &scanned.lines));

    if package_name.as_deref() == Some("main")
        && !scanned
            .lines
            .iter()
            .any(|l| pattern(&MAIN_FUNC, r"^\s*func\s+main\s*\(\s*\)").is_match(l))
    {
        diagnostics.push(Diagnostic::error(1, 1, "function main is undeclared in the main package"));
    }

    diagnostics
}

/// Standard packages referenced as `pkg.Name` but never imported
fn check_imports(code: &str, lines: &[String]) -> Vec<Diagnostic> {
    let import_path = pattern(&IMPORT_PATH, r#""([\w./-]+)""#);
    let imported: Vec<String> = import_section(code)
        .iter()
        .flat_map(|l| import_path.captures_iter(l).filter_map(|c| c.get(1)))
        .map(|m| m.as_str().rsplit('/').next().unwrap_or(m.as_str()).to_string())
        .collect();

    let usage = pattern(&PACKAGE_USE, r"\b(fmt|strings|strconv|os|math|sort|bufio|time|errors)\.[A-Z]");
    let mut out = Vec::new();
    let mut reported: Vec<&str> = Vec::new();

    for (idx, text) in lines.iter().enumerate() {
        for caps in usage.captures_iter(text) {
            let Some(name) = caps.get(1) else { continue };
            if imported.iter().any(|i| i == name.as_str()) || reported.contains(&name.as_str()) {
                continue;
            }
            reported.push(name.as_str());
            out.push(Diagnostic::error(
                idx + 1,
                column_of(text, name.start()),
                format!("undefined: {} (package \"{}\" is not imported)", name.as_str(), name.as_str()),
            ));
        }
    }

    out
}

/// Raw source lines that belong to `import` declarations
fn import_section(code: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_group = false;
    for line in code.lines() {
        let trimmed = line.trim();
        if in_group {
            if trimmed.starts_with(')') {
                in_group = false;
            } else {
                out.push(line);
            }
        } else if let Some(rest) = trimmed.strip_prefix("import") {
            let rest = rest.trim_start();
            if rest.starts_with('(') {
                in_group = !rest.contains(')');
                out.push(rest);
            } else {
                out.push(rest);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "package main\n\nimport (\n    \"fmt\"\n    \"strings\"\n)\n\nfunc main() {\n    fmt.Println(strings.ToUpper(\"hi\"))\n}\n";

    #[test]
    fn test_clean_program() {
        assert!(check(HELLO).is_empty(), "{:?}", check(HELLO));
    }

    #[test]
    fn test_single_import_form() {
        let code = "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(1)\n}\n";
        assert!(check(code).is_empty());
    }

    #[test]
    fn test_missing_package() {
        let found = check("func main() {\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
        assert!(found[0].message.contains("package"));
    }

    #[test]
    fn test_brace_on_next_line() {
        let found = check("package main\n\nfunc main()\n{\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 4);
    }

    #[test]
    fn test_missing_import_reported_once() {
        let found = check("package main\n\nfunc main() {\n    fmt.Println(1)\n    fmt.Println(2)\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (4, 5));
    }

    #[test]
    fn test_missing_main_and_semicolon() {
        let found = check("package main\n\nfunc helper() int {\n    return 1;\n}\n");
        assert_eq!(found.len(), 2);
        assert!(!found[0].is_error());
        assert!(found[1].message.contains("function main"));
    }
}
