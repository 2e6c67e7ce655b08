use crate::checker::{self, Diagnostic};
use crate::languages::adapter::{LanguageAdapter, Runtime};

/// JSON is data: it can be checked but there is nothing to run.
#[derive(Debug, Clone, Default)]
pub struct JsonAdapter;

impl LanguageAdapter for JsonAdapter {
    fn id(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn runtime(&self) -> Runtime {
        Runtime::CheckOnly
    }

    fn check(&self, code: &str) -> Option<Vec<Diagnostic>> {
        Some(checker::json::check(code))
    }
}
