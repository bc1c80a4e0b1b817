//! Row-polymorphic Hindley-Milner type inference over the Core ANF IR,
//! with class constraints resolved by dictionary passing (§3.1, §4.3).

pub mod classes;
pub mod error;
pub mod infer;
pub mod ty;
pub mod unify;

pub use classes::{ClassInstance, ClassRegistry};
pub use error::{ConstraintOrigin, TypeError};
pub use infer::{infer_program, InferOutput, NoopResolver, TypeResolver};
pub use ty::{ClassConstraint, Kind, RecordRow, Scheme, Ty, TyCon, TyVar};
pub use unify::InferCtx;
