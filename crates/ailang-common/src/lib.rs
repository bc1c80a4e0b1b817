//! Shared types used by every AILANG compiler core crate: source spans,
//! the structured diagnostic envelope, and the canonical effect alphabet.

pub mod diagnostics;
pub mod effects;
pub mod span;

pub use diagnostics::{Diagnostic, Severity, ToDiagnostic};
pub use effects::EffectRow;
pub use span::{Location, Span};

/// Monotonic ID allocator shared by every pass that needs stable, per-run
/// identifiers (Core `NodeId`s, module IDs). Mirrors the teacher's
/// sequential `ModuleId` assignment in `module_graph.rs`.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn new() -> Self {
        IdGen { next: 0 }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}
