//! Parse error types.
//!
//! Mirrors the teacher's `ParseError` shape (message + primary span + an
//! optional related span for "opened here"-style context).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub related: Option<(String, Span)>,
    /// Set when the error was synthesized from a caught panic rather than
    /// a recognized syntax error (see `parse`'s `catch_unwind` boundary).
    pub internal: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
            related: None,
            internal: false,
        }
    }

    pub fn with_related(
        message: impl Into<String>,
        span: Span,
        related_message: impl Into<String>,
        related_span: Span,
    ) -> Self {
        ParseError {
            message: message.into(),
            span,
            related: Some((related_message.into(), related_span)),
            internal: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            span: Span::dummy(),
            related: None,
            internal: true,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let code = if self.internal { "PAR999_INTERNAL_ERROR" } else { "PAR001" };
        let mut diag = Diagnostic::error(code, &self.message);
        if let Some((msg, span)) = &self.related {
            diag = diag.with_trace(vec![Diagnostic::error("PAR001_RELATED", msg.clone())
                .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))]);
        }
        diag.with_context(
            "span",
            serde_json::json!({"start": self.span.start, "end": self.span.end}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message_only() {
        let err = ParseError::new("expected expression", Span::new(5, 10));
        assert_eq!(err.to_string(), "expected expression");
    }

    #[test]
    fn internal_error_uses_par999_code() {
        let err = ParseError::internal("panicked while parsing");
        assert_eq!(err.to_diagnostic().code, "PAR999_INTERNAL_ERROR");
    }
}
