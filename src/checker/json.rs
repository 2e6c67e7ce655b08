//! JSON validation with the real parser

use super::Diagnostic;

/// Parse the document; at most one error, positioned at the offending token
pub fn check(code: &str) -> Vec<Diagnostic> {
    match serde_json::from_str::<serde_json::Value>(code) {
        Ok(_) => Vec::new(),
        Err(err) => {
            let full = err.to_string();
            let message = full
                .rsplit_once(" at line ")
                .map(|(head, _)| head)
                .unwrap_or(&full);
            vec![Diagnostic::error(err.line(), err.column(), message)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document() {
        assert!(check(r#"{"a": [1, 2, {"b": null}]}"#).is_empty());
    }

    #[test]
    fn test_missing_value_points_at_token() {
        let found = check(r#"{"a":}"#);
        assert_eq!(found.len(), 1);
        assert!(found[0].is_error());
        assert_eq!((found[0].line, found[0].column), (1, 6));
        assert_eq!(found[0].message, "expected value");
    }

    #[test]
    fn test_error_on_later_line() {
        let found = check("{\n  \"a\": 1,\n  \"b\": tru\n}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
    }

    #[test]
    fn test_empty_document_has_valid_position() {
        let found = check("");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (1, 1));
    }
}
