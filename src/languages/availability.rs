//! Toolchain availability probing

use serde::Serialize;

use crate::config::LanguageOverride;
use crate::languages::adapter::{LanguageAdapter, Runtime};

/// Summary of one registered language and whether it can run on this host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub id: String,
    pub aliases: Vec<String>,
    pub extensions: Vec<String>,
    /// `toolchain`, `embedded` or `check-only`
    pub runtime: &'static str,
    pub compiled: bool,
    /// Programs the toolchain needs
    pub programs: Vec<String>,
    /// Programs from `programs` that are not on PATH
    pub missing: Vec<String>,
    /// Every needed program is present (always true for embedded languages)
    pub available: bool,
}

/// Describe `adapter`, probing PATH for its toolchain after overrides
pub fn describe(adapter: &dyn LanguageAdapter, over: Option<&LanguageOverride>) -> LanguageInfo {
    let (runtime, compiled, programs) = match adapter.runtime() {
        Runtime::Toolchain(toolchain) => {
            let toolchain = toolchain.with_override(over);
            let compiled = toolchain.compile.is_some();
            let mut programs: Vec<String> = toolchain
                .compile
                .iter()
                .chain(std::iter::once(&toolchain.run))
                .map(|t| t.program.clone())
                .filter(|p| !p.contains('{'))
                .collect();
            programs.dedup();
            ("toolchain", compiled, programs)
        }
        Runtime::Embedded => ("embedded", false, Vec::new()),
        Runtime::CheckOnly => ("check-only", false, Vec::new()),
    };

    let missing: Vec<String> = programs
        .iter()
        .filter(|p| which::which(p.as_str()).is_err())
        .cloned()
        .collect();

    LanguageInfo {
        id: adapter.id().to_string(),
        aliases: adapter.aliases().iter().map(|a| a.to_string()).collect(),
        extensions: adapter.extensions().iter().map(|e| e.to_string()).collect(),
        runtime,
        compiled,
        available: missing.is_empty() && runtime != "check-only",
        programs,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{javascript::JavaScriptAdapter, json::JsonAdapter, python::PythonAdapter, c_family::CAdapter};

    #[test]
    fn test_embedded_language_is_always_available() {
        let info = describe(&JavaScriptAdapter, None);
        assert_eq!(info.runtime, "embedded");
        assert!(info.available);
        assert!(info.programs.is_empty());
    }

    #[test]
    fn test_check_only_language_cannot_run() {
        let info = describe(&JsonAdapter, None);
        assert_eq!(info.runtime, "check-only");
        assert!(!info.available);
    }

    #[test]
    fn test_override_is_probed() {
        let over = LanguageOverride {
            program: Some("polyrun-no-such-python".into()),
            ..Default::default()
        };
        let info = describe(&PythonAdapter, Some(&over));
        assert_eq!(info.programs, vec!["polyrun-no-such-python".to_string()]);
        assert_eq!(info.missing, info.programs);
        assert!(!info.available);
    }

    #[test]
    fn test_artifact_runner_is_not_probed() {
        let over = LanguageOverride {
            compiler: Some("sh".into()),
            ..Default::default()
        };
        let info = describe(&CAdapter, Some(&over));
        assert!(info.compiled);
        assert_eq!(info.programs, vec!["sh".to_string()]);
        assert!(info.available);
    }
}
