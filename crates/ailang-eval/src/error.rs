//! Runtime errors (§4.6, §7).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};
use ailang_core::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A `LetRec` thunk was forced while it was still being forced -- a
    /// genuine recursive-value cycle, not a re-entrant call (§4.6).
    Cycle { name: String, node: NodeId, span: Span },
    /// No `Match` arm matched the scrutinee (§4.6).
    NonExhaustive { node: NodeId, span: Span, scrutinee: String },
    /// A name wasn't bound in the local environment or resolvable globally.
    UnboundName { name: String, node: NodeId, span: Span },
    /// A value was applied, indexed, or destructured as a shape it isn't.
    TypeMismatch { expected: &'static str, found: &'static str, node: NodeId, span: Span },
    /// A builtin or closure was called with the wrong number of arguments.
    ArityMismatch { name: String, expected: usize, found: usize, node: NodeId, span: Span },
    /// `$builtin`/`$adt` or another module's export name has no runtime
    /// binding -- a linker/evaluator drift (§4.5 `IMP010`/`LDR001` analog
    /// at runtime).
    UnresolvedGlobal { module: String, name: String, node: NodeId, span: Span },
    /// A record field access named a field the record doesn't have.
    MissingField { field: String, node: NodeId, span: Span },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Cycle { name, .. } => write!(f, "cycle detected while evaluating `{name}`"),
            RuntimeError::NonExhaustive { scrutinee, .. } => {
                write!(f, "no match arm covers the value {scrutinee}")
            }
            RuntimeError::UnboundName { name, .. } => write!(f, "unbound name `{name}`"),
            RuntimeError::TypeMismatch { expected, found, .. } => {
                write!(f, "expected a {expected}, found a {found}")
            }
            RuntimeError::ArityMismatch { name, expected, found, .. } => {
                write!(f, "`{name}` expects {expected} argument(s), got {found}")
            }
            RuntimeError::UnresolvedGlobal { module, name, .. } => {
                write!(f, "unresolved global `{module}.{name}`")
            }
            RuntimeError::MissingField { field, .. } => write!(f, "no such field `{field}`"),
        }
    }
}

impl ToDiagnostic for RuntimeError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RuntimeError::Cycle { name, node, span } => Diagnostic::error("RT_CYCLE", self.to_string())
                .with_context("name", serde_json::json!(name))
                .with_context("node", serde_json::json!(node))
                .with_context("span", serde_json::json!({"start": span.start, "end": span.end})),
            RuntimeError::NonExhaustive { node, span, scrutinee } => {
                Diagnostic::error("RT_NON_EXHAUSTIVE", self.to_string())
                    .with_context("scrutinee", serde_json::json!(scrutinee))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            RuntimeError::UnboundName { name, node, span } => {
                Diagnostic::error("RT_UNBOUND", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            RuntimeError::TypeMismatch { expected, found, node, span } => {
                Diagnostic::error("RT_TYPE_MISMATCH", self.to_string())
                    .with_context("expected", serde_json::json!(expected))
                    .with_context("found", serde_json::json!(found))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            RuntimeError::ArityMismatch { name, expected, found, node, span } => {
                Diagnostic::error("RT_ARITY", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("expected", serde_json::json!(expected))
                    .with_context("found", serde_json::json!(found))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            RuntimeError::UnresolvedGlobal { module, name, node, span } => {
                Diagnostic::error("RT_UNRESOLVED_GLOBAL", self.to_string())
                    .with_context("module", serde_json::json!(module))
                    .with_context("name", serde_json::json!(name))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            RuntimeError::MissingField { field, node, span } => {
                Diagnostic::error("RT_MISSING_FIELD", self.to_string())
                    .with_context("field", serde_json::json!(field))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
        }
    }
}
