//! The structured error envelope (§6.4) every phase error converts into.
//!
//! Phase crates keep their own typed error enums for internal pattern
//! matching (tests assert on error *kinds*, not rendered strings); each
//! implements [`ToDiagnostic`] to produce the envelope below at the
//! tooling boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::{Location, Span};

pub const SCHEMA_VERSION: &str = "v1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The wire format for every diagnostic the core emits.
///
/// `context` carries typed key/values specific to the error kind (e.g. the
/// two mismatched types); `trace` carries an ordered list of related
/// sub-diagnostics (e.g. one entry per cycle-forming import, one per
/// conflicting provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
    pub context: BTreeMap<String, serde_json::Value>,
    pub suggestions: Vec<String>,
    pub trace: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            schema_version: SCHEMA_VERSION.to_string(),
            code: code.into(),
            severity,
            message: message.into(),
            location: None,
            context: BTreeMap::new(),
            suggestions: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_span(mut self, file: impl Into<String>, source: &str, span: Span) -> Self {
        self.location = Some(Location::from_span(file, source, span));
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_trace(mut self, trace: Vec<Diagnostic>) -> Self {
        self.trace = trace;
        self
    }

    /// Render as the JSON envelope described in §6.4.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Diagnostic always serializes")
    }
}

/// Implemented by every phase's error type to produce the wire-format
/// envelope. Kept separate from `Display` so phase errors can still have a
/// terse internal `Display` used in `assert!` failure messages and `tracing`
/// events.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_through_json() {
        let diag = Diagnostic::error("TYP001", "type mismatch")
            .with_context("expected", serde_json::json!("Int"))
            .with_suggestion("did you mean `Float`?");
        let json = diag.to_json();
        assert_eq!(json["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(json["code"], "TYP001");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["suggestions"][0], "did you mean `Float`?");
    }
}
