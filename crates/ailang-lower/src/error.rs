//! Lowering errors (§4.4, §7).

use std::fmt;

use ailang_common::{Diagnostic, Span, ToDiagnostic};
use ailang_core::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum LowerError {
    /// An intrinsic operator's operand type never resolved to a concrete
    /// head type (e.g. it stayed an unconstrained type variable through
    /// inference), so the method name to dispatch to can't be computed.
    UnresolvedOperandType { op: &'static str, node: NodeId, span: Span },
    /// The method name the operator resolves to isn't in the builtin spec
    /// registry -- a registry/lowering drift (§4.7).
    UnknownBuiltin { name: String, node: NodeId, span: Span },
    /// Internal invariant: an `Intrinsic`/`BinOp`/`UnOp` node survived the
    /// lowering pass (§8.1 invariant 2). Reachable only as a consequence of
    /// an already-reported `UnresolvedOperandType`/`UnknownBuiltin`.
    ResidualIntrinsic { node: NodeId, span: Span },
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LowerError::UnresolvedOperandType { op, .. } => {
                write!(f, "operator `{op}` has no resolved operand type to dispatch on")
            }
            LowerError::UnknownBuiltin { name, .. } => {
                write!(f, "no builtin named `{name}` is registered")
            }
            LowerError::ResidualIntrinsic { .. } => {
                write!(f, "an intrinsic operator node survived lowering")
            }
        }
    }
}

impl ToDiagnostic for LowerError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LowerError::UnresolvedOperandType { op, node, span } => {
                Diagnostic::error("ELB_OP001", self.to_string())
                    .with_context("op", serde_json::json!(op))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            LowerError::UnknownBuiltin { name, node, span } => {
                Diagnostic::error("LNK_BUILTIN404", self.to_string())
                    .with_context("name", serde_json::json!(name))
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
            LowerError::ResidualIntrinsic { node, span } => {
                Diagnostic::error("ELB_OP002", self.to_string())
                    .with_context("node", serde_json::json!(node))
                    .with_context("span", serde_json::json!({"start": span.start, "end": span.end}))
            }
        }
    }
}
