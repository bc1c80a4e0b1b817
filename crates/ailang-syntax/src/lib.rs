//! Minimal lexer, parser, and surface AST for the AILANG normative source
//! subset (§6.2). The real, production-grade lexer/parser (incremental
//! reparsing, full error recovery, editor services) is out of this core's
//! scope; this crate is the smallest thing that lets "source text -> AST"
//! be a real function the rest of the pipeline can be tested against.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::SourceFile;
pub use error::ParseError;
pub use parser::parse;
