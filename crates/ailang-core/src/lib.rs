//! The Core ANF IR and the Surface-to-Core elaborator (§3.2, §4.2).

pub mod elab;
pub mod error;
pub mod ir;

pub use elab::{elaborate, ElabResult, Elaborator, TypeInfo};
pub use error::{ElabError, ElabWarning};
pub use ir::*;
