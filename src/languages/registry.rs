//! Adapter registry - resolves a request to a language adapter

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::adapter::LanguageAdapter;
use super::{
    c_family::{CAdapter, CppAdapter},
    go::GoAdapter,
    java::JavaAdapter,
    javascript::JavaScriptAdapter,
    json::JsonAdapter,
    python::PythonAdapter,
    rust::RustAdapter,
    shell::ShellAdapter,
};

/// Outcome of resolving a language for a request
#[derive(Clone)]
pub enum Resolution {
    /// A registered adapter handles the request
    Found(Arc<dyn LanguageAdapter>),
    /// Nothing matched; carries what the caller asked for (or `unknown`)
    Unsupported(String),
}

impl Resolution {
    /// Language label for reports
    pub fn label(&self) -> String {
        match self {
            Resolution::Found(adapter) => adapter.id().to_string(),
            Resolution::Unsupported(requested) => requested.clone(),
        }
    }

    /// The adapter, if one was found
    pub fn adapter(&self) -> Option<&Arc<dyn LanguageAdapter>> {
        match self {
            Resolution::Found(adapter) => Some(adapter),
            Resolution::Unsupported(_) => None,
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Found(adapter) => f.debug_tuple("Found").field(&adapter.id()).finish(),
            Resolution::Unsupported(requested) => f.debug_tuple("Unsupported").field(requested).finish(),
        }
    }
}

/// Registry of language adapters
///
/// Built once at startup and only read afterwards, so it is shared across
/// concurrent requests without locking.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn LanguageAdapter>>,
    by_name: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry").field("languages", &self.ids()).finish()
    }
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: Vec::new(),
            by_name: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Registry with every built-in language
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PythonAdapter);
        registry.register(JavaScriptAdapter);
        registry.register(CAdapter);
        registry.register(CppAdapter);
        registry.register(JavaAdapter);
        registry.register(GoAdapter);
        registry.register(RustAdapter);
        registry.register(ShellAdapter);
        registry.register(JsonAdapter);
        registry
    }

    /// Register an adapter
    ///
    /// A later registration takes over any id, alias or extension an earlier
    /// one claimed.
    pub fn register<A: LanguageAdapter + 'static>(&mut self, adapter: A) {
        let index = self.adapters.len();
        self.by_name.insert(adapter.id().to_string(), index);
        for alias in adapter.aliases() {
            self.by_name.insert(alias.to_lowercase(), index);
        }
        for ext in adapter.extensions() {
            self.by_extension.insert(ext.to_lowercase(), index);
        }
        self.adapters.push(Arc::new(adapter));
    }

    /// Get an adapter by id or alias (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn LanguageAdapter>> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&i| Arc::clone(&self.adapters[i]))
    }

    /// Get an adapter by file extension (with or without leading dot)
    pub fn for_extension(&self, ext: &str) -> Option<Arc<dyn LanguageAdapter>> {
        self.by_extension
            .get(&ext.trim_start_matches('.').to_lowercase())
            .map(|&i| Arc::clone(&self.adapters[i]))
    }

    /// Resolve the adapter for a request
    ///
    /// An explicit identifier wins, even when it is unknown. Otherwise the
    /// filename extension is tried, then a `#!` line in the code.
    pub fn resolve(&self, language: Option<&str>, filename: Option<&str>, code: &str) -> Resolution {
        if let Some(language) = language.map(str::trim).filter(|l| !l.is_empty()) {
            return match self.get(language) {
                Some(adapter) => Resolution::Found(adapter),
                None => Resolution::Unsupported(language.to_lowercase()),
            };
        }

        if let Some(adapter) = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| self.for_extension(&ext.to_string_lossy()))
        {
            return Resolution::Found(adapter);
        }

        if let Some(adapter) = shebang_interpreter(code).and_then(|name| self.get(&name)) {
            return Resolution::Found(adapter);
        }

        Resolution::Unsupported("unknown".to_string())
    }

    /// Canonical ids in registration order
    pub fn ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// Iterate over registered adapters
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn LanguageAdapter>> {
        self.adapters.iter()
    }

    /// Get adapter count
    pub fn count(&self) -> usize {
        self.adapters.len()
    }
}

/// Interpreter named by a `#!` line, with version suffixes stripped
/// (`#!/usr/bin/env python3.11` -> `python`).
fn shebang_interpreter(code: &str) -> Option<String> {
    let line = code.lines().next()?.strip_prefix("#!")?;
    let mut parts = line.split_whitespace();
    let mut program = parts.next()?.rsplit('/').next()?;
    if program == "env" {
        program = parts.find(|p| !p.starts_with('-'))?;
    }
    let name = program.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_language_wins() {
        let registry = AdapterRegistry::with_builtin();
        let resolved = registry.resolve(Some("Python"), Some("main.js"), "");
        assert_eq!(resolved.label(), "python");
    }

    #[test]
    fn test_unknown_explicit_language_is_unsupported() {
        let registry = AdapterRegistry::with_builtin();
        let resolved = registry.resolve(Some("cobol"), Some("main.py"), "");
        assert!(resolved.adapter().is_none());
        assert_eq!(resolved.label(), "cobol");
    }

    #[test]
    fn test_extension_inference() {
        let registry = AdapterRegistry::with_builtin();
        assert_eq!(registry.resolve(None, Some("src/a.CPP"), "").label(), "cpp");
        assert_eq!(registry.resolve(None, Some("include/a.h"), "").label(), "cpp");
        assert_eq!(registry.resolve(None, Some("run.sh"), "").label(), "bash");
        assert_eq!(registry.resolve(Some(""), Some("data.json"), "").label(), "json");
    }

    #[test]
    fn test_shebang_inference() {
        let registry = AdapterRegistry::with_builtin();
        let code = "#!/usr/bin/env python3.11\nprint('x')\n";
        assert_eq!(registry.resolve(None, Some("script"), code).label(), "python");
        assert_eq!(registry.resolve(None, None, "#!/bin/sh\necho hi").label(), "bash");
        assert_eq!(registry.resolve(None, None, "#!/usr/bin/env -S node --flag\n").label(), "javascript");
    }

    #[test]
    fn test_nothing_matches() {
        let registry = AdapterRegistry::with_builtin();
        let resolved = registry.resolve(None, Some("notes.txt"), "hello");
        assert_eq!(resolved.label(), "unknown");
    }

    #[test]
    fn test_aliases() {
        let registry = AdapterRegistry::with_builtin();
        assert_eq!(registry.get("js").map(|a| a.id()), Some("javascript"));
        assert_eq!(registry.get("c++").map(|a| a.id()), Some("cpp"));
        assert_eq!(registry.get("golang").map(|a| a.id()), Some("go"));
        assert_eq!(registry.count(), 9);
    }
}
