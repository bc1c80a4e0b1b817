//! Elaboration errors and warnings (§4.2, §7).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};

#[derive(Debug, Clone, PartialEq)]
pub enum ElabError {
    /// An effect label appears more than once in one annotation.
    DuplicateEffect { label: String, span: Span },
    /// An effect label is not in the canonical alphabet (§6.5).
    UnknownEffect {
        label: String,
        suggestion: Option<&'static str>,
        span: Span,
    },
    /// Two or more variable patterns in one match arm bind the same name.
    DuplicateBinding { name: String, span: Span },
}

impl fmt::Display for ElabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElabError::DuplicateEffect { label, .. } => {
                write!(f, "duplicate effect label `{label}` in annotation")
            }
            ElabError::UnknownEffect { label, .. } => {
                write!(f, "unknown effect label `{label}`")
            }
            ElabError::DuplicateBinding { name, .. } => {
                write!(f, "variable `{name}` is bound more than once in this pattern")
            }
        }
    }
}

impl ToDiagnostic for ElabError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ElabError::DuplicateEffect { label, span } => {
                Diagnostic::error("PAR_EFF001_DUP", self.to_string())
                    .with_context("label", serde_json::json!(label))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            ElabError::UnknownEffect { label, suggestion, span } => {
                let mut diag = Diagnostic::error("PAR_EFF002_UNKNOWN", self.to_string())
                    .with_context("label", serde_json::json!(label))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}));
                if let Some(s) = suggestion {
                    diag = diag.with_suggestion(format!("did you mean `{s}`?"));
                }
                diag
            }
            ElabError::DuplicateBinding { name, span } => {
                Diagnostic::error("PAT_DUP_BINDING", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
        }
    }
}

/// A non-fatal elaboration warning (§4.2, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum ElabWarning {
    /// A `match` does not cover every shape of its scrutinee's constructors.
    NonExhaustiveMatch {
        missing: Vec<String>,
        span: Span,
    },
}

impl fmt::Display for ElabWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElabWarning::NonExhaustiveMatch { missing, .. } => {
                write!(f, "non-exhaustive match, missing: {}", missing.join(", "))
            }
        }
    }
}

impl ToDiagnostic for ElabWarning {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ElabWarning::NonExhaustiveMatch { missing, span } => {
                Diagnostic::warning("PAT_NONEXHAUSTIVE", self.to_string())
                    .with_context("missing", serde_json::json!(missing))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
        }
    }
}
