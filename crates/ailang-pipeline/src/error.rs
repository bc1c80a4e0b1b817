//! `PipelineError`: the union of every phase's error type, plus the two
//! failure modes [`crate::call_entrypoint`] and the JSON-Arg Decoder add on
//! top (§6.1, §7).
//!
//! Per the propagation policy (§7), the first hard error in a phase
//! short-circuits that phase; [`crate::run`] never runs a later phase once
//! an earlier one has failed.

use std::fmt;

use ailang_common::{Diagnostic, ToDiagnostic};

#[derive(Debug, Clone)]
pub enum PipelineError {
    Parse(ailang_syntax::ParseError),
    Link(ailang_link::LinkError),
    Elaborate(Vec<ailang_core::ElabError>),
    Type(Vec<ailang_types::TypeError>),
    Lower(Vec<ailang_lower::LowerError>),
    Runtime(Vec<ailang_eval::RuntimeError>),
    /// A REPL snippet ([`crate::Source::Snippet`]) declared an import; a
    /// snippet has no project root to resolve one against (§6.1 Open
    /// Question, see DESIGN.md).
    SnippetImportsUnsupported { module: String },
    /// [`crate::call_entrypoint`] couldn't find an exported function by
    /// that name in the root module's interface.
    UnknownEntrypoint { name: String, available: Vec<String> },
    /// [`crate::call_entrypoint`] only accepts 0 or 1 argument; multi-arg
    /// functions must be wrapped (§6.1).
    TooManyArguments { name: String, count: usize },
    /// The JSON-Arg Decoder couldn't reconcile a JSON value with the
    /// parameter's inferred type.
    ArgDecode { expected: String, found: &'static str },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Parse(e) => write!(f, "{e}"),
            PipelineError::Link(e) => write!(f, "{e}"),
            PipelineError::Elaborate(errs) => write!(f, "{} elaboration error(s)", errs.len()),
            PipelineError::Type(errs) => write!(f, "{} type error(s)", errs.len()),
            PipelineError::Lower(errs) => write!(f, "{} lowering error(s)", errs.len()),
            PipelineError::Runtime(errs) => write!(f, "{} runtime error(s)", errs.len()),
            PipelineError::SnippetImportsUnsupported { module } => {
                write!(f, "a REPL snippet cannot import '{module}'")
            }
            PipelineError::UnknownEntrypoint { name, available } => {
                write!(f, "no exported function named '{name}' (available: {})", available.join(", "))
            }
            PipelineError::TooManyArguments { name, count } => {
                write!(f, "'{name}' accepts at most one argument, got {count}")
            }
            PipelineError::ArgDecode { expected, found } => {
                write!(f, "cannot decode a JSON {found} as {expected}")
            }
        }
    }
}

impl ToDiagnostic for PipelineError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PipelineError::Parse(e) => e.to_diagnostic(),
            PipelineError::Link(e) => e.to_diagnostic(),
            PipelineError::Elaborate(errs) => first_or_internal(errs.iter().map(ToDiagnostic::to_diagnostic)),
            PipelineError::Type(errs) => first_or_internal(errs.iter().map(ToDiagnostic::to_diagnostic)),
            PipelineError::Lower(errs) => first_or_internal(errs.iter().map(ToDiagnostic::to_diagnostic)),
            PipelineError::Runtime(errs) => first_or_internal(errs.iter().map(ToDiagnostic::to_diagnostic)),
            PipelineError::SnippetImportsUnsupported { module } => {
                Diagnostic::error("PIPE_SNIPPET_IMPORT", self.to_string()).with_context("module", serde_json::json!(module))
            }
            PipelineError::UnknownEntrypoint { name, available } => {
                let mut d = Diagnostic::error("PIPE_NO_ENTRYPOINT", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("available", serde_json::json!(available));
                if let Some(nearest) = available.iter().find(|a| a.eq_ignore_ascii_case(name)) {
                    d = d.with_suggestion(format!("did you mean '{nearest}'?"));
                }
                d
            }
            PipelineError::TooManyArguments { name, count } => Diagnostic::error("PIPE_ARITY", self.to_string())
                .with_context("name", serde_json::json!(name))
                .with_context("count", serde_json::json!(count)),
            PipelineError::ArgDecode { expected, found } => Diagnostic::error("PIPE_ARG_DECODE", self.to_string())
                .with_context("expected", serde_json::json!(expected))
                .with_context("found", serde_json::json!(found)),
        }
    }
}

/// Every error collection in this enum is guaranteed non-empty by
/// construction (§7: a phase only fails when it produced at least one
/// error), but a defensive fallback keeps this total rather than panicking.
fn first_or_internal(mut diags: impl Iterator<Item = Diagnostic>) -> Diagnostic {
    diags.next().unwrap_or_else(|| Diagnostic::error("PAR999_INTERNAL_ERROR", "an error phase reported no diagnostics"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entrypoint_suggests_a_case_insensitive_match() {
        let err = PipelineError::UnknownEntrypoint { name: "Main".to_string(), available: vec!["main".to_string()] };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "PIPE_NO_ENTRYPOINT");
        assert_eq!(diag.suggestions, vec!["did you mean 'main'?"]);
    }
}
