//! The Pipeline entrypoint (§6.1): wires every other crate in this
//! workspace into one `run` call plus the `CallEntrypoint`/JSON-Arg
//! Decoder a CLI or REPL sits on top of.

pub mod config;
pub mod decode;
pub mod entrypoint;
pub mod error;
pub mod pipeline;

pub use config::{Mode, PipelineConfig};
pub use decode::decode_json_arg;
pub use entrypoint::call_entrypoint;
pub use error::PipelineError;
pub use pipeline::{run, PipelineResult, Source};
