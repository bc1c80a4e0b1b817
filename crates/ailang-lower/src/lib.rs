//! The Operator/Constraint Resolver: the lowering pass between type
//! inference and linking (§4.4).

pub mod error;
pub mod lower;

pub use error::LowerError;
pub use lower::{lower_program, LowerResult};
