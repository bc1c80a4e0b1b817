//! Structured errors for module loading, import resolution, and linking
//! (§4.1, §4.5, §7).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};

#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// A module couldn't be found on any search path. Carries the ordered
    /// list of paths actually tried, in search order (§4.1).
    ModuleNotFound { module: String, search_trace: Vec<String> },
    /// A module's declared path doesn't match its canonical ID (§4.1).
    ModulePathMismatch { declared: String, canonical: String },
    /// `topo-sort` found a dependency cycle among modules.
    Cycle { path: Vec<String> },
    /// A bare `import P` namespace import, which this module system
    /// doesn't support -- imports are selective-only (§4.1).
    NamespaceImportRejected { module: String, span: Span },
    /// Two selective imports introduced the same name into one scope.
    ImportConflict { name: String, first_source: String, second_source: String, span: Span },
    /// An imported name isn't exported by the target module. Carries the
    /// target's actual exports, sorted, for the suggestion list (§4.5).
    UnknownSymbol { module: String, name: String, available: Vec<String>, span: Span },
    /// A module's source failed to parse; the loader surfaces it rather
    /// than swallowing it, since a module graph can't be built around a
    /// file with no AST.
    ParseFailed { module: String, source: ailang_syntax::ParseError },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::ModuleNotFound { module, search_trace } => {
                write!(f, "module '{module}' not found (searched: {})", search_trace.join(", "))
            }
            LinkError::ModulePathMismatch { declared, canonical } => {
                write!(f, "module path '{declared}' does not match its canonical id '{canonical}'")
            }
            LinkError::Cycle { path } => write!(f, "module cycle: {}", path.join(" -> ")),
            LinkError::NamespaceImportRejected { module, .. } => {
                write!(f, "namespace import of '{module}' is not supported; use `import {module} (n1, n2)`")
            }
            LinkError::ImportConflict { name, first_source, second_source, .. } => {
                write!(f, "'{name}' is imported from both '{first_source}' and '{second_source}'")
            }
            LinkError::UnknownSymbol { module, name, available, .. } => {
                write!(f, "'{name}' is not exported by '{module}' (exports: {})", available.join(", "))
            }
            LinkError::ParseFailed { module, source } => write!(f, "'{module}' failed to parse: {source}"),
        }
    }
}

impl ToDiagnostic for LinkError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LinkError::ModuleNotFound { module, search_trace } => {
                Diagnostic::error("LDR001", self.to_string())
                    .with_context("module", serde_json::json!(module))
                    .with_context("searchTrace", serde_json::json!(search_trace))
            }
            LinkError::ModulePathMismatch { declared, canonical } => {
                Diagnostic::error("MOD010_MODULE_PATH_MISMATCH", self.to_string())
                    .with_context("declared", serde_json::json!(declared))
                    .with_context("canonical", serde_json::json!(canonical))
            }
            LinkError::Cycle { path } => {
                Diagnostic::error("MOD_CYCLE", self.to_string()).with_context("path", serde_json::json!(path))
            }
            LinkError::NamespaceImportRejected { module, span } => {
                Diagnostic::error("IMP012", self.to_string())
                    .with_context("module", serde_json::json!(module))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            LinkError::ImportConflict { name, first_source, second_source, span } => {
                Diagnostic::error("IMP011", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
                    .with_trace(vec![
                        Diagnostic::error("IMP011", format!("first introduced by '{first_source}'")),
                        Diagnostic::error("IMP011", format!("then reintroduced by '{second_source}'")),
                    ])
            }
            LinkError::UnknownSymbol { module, name, available, span } => {
                let mut d = Diagnostic::error("IMP010", self.to_string())
                    .with_context("module", serde_json::json!(module))
                    .with_context("name", serde_json::json!(name))
                    .with_context("available", serde_json::json!(available))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}));
                if let Some(nearest) = available.iter().find(|a| a.eq_ignore_ascii_case(name)) {
                    d = d.with_suggestion(format!("did you mean '{nearest}'?"));
                }
                d
            }
            LinkError::ParseFailed { module, source } => {
                source.to_diagnostic().with_context("module", serde_json::json!(module))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_symbol_suggests_a_case_insensitive_match() {
        let err = LinkError::UnknownSymbol {
            module: "Math".to_string(),
            name: "sqrt".to_string(),
            available: vec!["Sqrt".to_string(), "abs".to_string()],
            span: Span::dummy(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "IMP010");
        assert_eq!(diag.suggestions, vec!["did you mean 'Sqrt'?"]);
    }

    #[test]
    fn module_not_found_carries_the_full_search_trace() {
        let err = LinkError::ModuleNotFound {
            module: "Missing".to_string(),
            search_trace: vec!["./Missing.ail".to_string(), "std/Missing.ail".to_string()],
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "LDR001");
        assert_eq!(diag.context["searchTrace"].as_array().unwrap().len(), 2);
    }
}
