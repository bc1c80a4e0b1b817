//! The Pattern-Match Evaluator: runtime values and the tree-walking
//! interpreter that runs over lowered Core IR (§3.4, §4.6).

pub mod builtins;
pub mod error;
pub mod eval;
pub mod value;

pub use error::RuntimeError;
pub use eval::{eval_program, EvalOutput, Evaluator, NoopResolver, ValueResolver};
pub use value::{Closure, Dictionary, Env, TaggedValue, ThunkSlot, Value};
