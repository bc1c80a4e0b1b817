//! Type errors with provenance tracking (§4.3).
//!
//! Every error carries a `ConstraintOrigin` recording where the constraint
//! that failed was generated, plus the node ID it is attached to so callers
//! can correlate errors with Core IR positions (§3.5 invariant 1).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};
use ailang_core::NodeId;

use crate::ty::{Ty, TyVar};

#[derive(Clone, Debug)]
pub enum ConstraintOrigin {
    FnArg { call_span: Span, param_idx: usize },
    BinOp { op_span: Span },
    IfBranches { if_span: Span },
    LetBinding { binding_span: Span },
    Return { return_span: Span },
    PatternMatch { span: Span },
    RecordField { span: Span, field: String },
    Builtin,
}

impl ConstraintOrigin {
    pub fn span(&self) -> Option<Span> {
        match self {
            ConstraintOrigin::FnArg { call_span, .. } => Some(*call_span),
            ConstraintOrigin::BinOp { op_span } => Some(*op_span),
            ConstraintOrigin::IfBranches { if_span } => Some(*if_span),
            ConstraintOrigin::LetBinding { binding_span } => Some(*binding_span),
            ConstraintOrigin::Return { return_span } => Some(*return_span),
            ConstraintOrigin::PatternMatch { span } => Some(*span),
            ConstraintOrigin::RecordField { span, .. } => Some(*span),
            ConstraintOrigin::Builtin => None,
        }
    }
}

/// §4.3's error kinds, verbatim.
#[derive(Clone, Debug)]
pub enum TypeError {
    Mismatch { expected: Ty, found: Ty, origin: ConstraintOrigin, node: NodeId },
    OccursCheck { var: TyVar, ty: Ty, origin: ConstraintOrigin, node: NodeId },
    RowMismatch { missing_left: Vec<String>, missing_right: Vec<String>, origin: ConstraintOrigin, node: NodeId },
    MissingInstance { class: String, ty: Ty, node: NodeId, span: Span },
    TypeArity { expected: usize, found: usize, origin: ConstraintOrigin, node: NodeId },
    UnboundName { name: String, span: Span },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch { expected, found, .. } => {
                write!(f, "type mismatch: expected `{expected}`, found `{found}`")
            }
            TypeError::OccursCheck { ty, .. } => {
                write!(f, "infinite type: variable occurs in `{ty}`")
            }
            TypeError::RowMismatch { missing_left, missing_right, .. } => {
                write!(
                    f,
                    "effect row mismatch: missing on left {missing_left:?}, missing on right {missing_right:?}"
                )
            }
            TypeError::MissingInstance { class, ty, .. } => {
                write!(f, "no instance of `{class}` for `{ty}`")
            }
            TypeError::TypeArity { expected, found, .. } => {
                write!(f, "expected {expected} type argument(s), found {found}")
            }
            TypeError::UnboundName { name, .. } => write!(f, "unbound name `{name}`"),
        }
    }
}

fn with_span_context(diag: Diagnostic, span: Span) -> Diagnostic {
    diag.with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
}

impl ToDiagnostic for TypeError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TypeError::Mismatch { expected, found, origin, node } => {
                let mut diag = Diagnostic::error("TYPE_MISMATCH", self.to_string())
                    .with_context("expected", serde_json::json!(expected.to_string()))
                    .with_context("found", serde_json::json!(found.to_string()))
                    .with_context("node", serde_json::json!(node));
                if let Some(span) = origin.span() {
                    diag = with_span_context(diag, span);
                }
                diag
            }
            TypeError::OccursCheck { ty, origin, node, .. } => {
                let mut diag = Diagnostic::error("OCCURS_CHECK", self.to_string())
                    .with_context("ty", serde_json::json!(ty.to_string()))
                    .with_context("node", serde_json::json!(node));
                if let Some(span) = origin.span() {
                    diag = with_span_context(diag, span);
                }
                diag
            }
            TypeError::RowMismatch { missing_left, missing_right, origin, node } => {
                let mut diag = Diagnostic::error("ROW_MISMATCH", self.to_string())
                    .with_context("missing_left", serde_json::json!(missing_left))
                    .with_context("missing_right", serde_json::json!(missing_right))
                    .with_context("node", serde_json::json!(node));
                if let Some(span) = origin.span() {
                    diag = with_span_context(diag, span);
                }
                diag
            }
            TypeError::MissingInstance { class, ty, node, span } => {
                let diag = Diagnostic::error("MISSING_INSTANCE", self.to_string())
                    .with_context("class", serde_json::json!(class))
                    .with_context("ty", serde_json::json!(ty.to_string()))
                    .with_context("node", serde_json::json!(node));
                with_span_context(diag, *span)
            }
            TypeError::TypeArity { expected, found, origin, node } => {
                let mut diag = Diagnostic::error("TYPE_ARITY", self.to_string())
                    .with_context("expected", serde_json::json!(expected))
                    .with_context("found", serde_json::json!(found))
                    .with_context("node", serde_json::json!(node));
                if let Some(span) = origin.span() {
                    diag = with_span_context(diag, span);
                }
                diag
            }
            TypeError::UnboundName { name, span } => {
                let diag = Diagnostic::error("UNBOUND_NAME", self.to_string())
                    .with_context("name", serde_json::json!(name));
                with_span_context(diag, *span)
            }
        }
    }
}
