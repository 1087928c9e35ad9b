//! Shared types for the halo interpreter.
//!
//! This crate defines the AST node types, source spans, construct tags and
//! parse errors used by the parser and the evaluator, plus the structural
//! expression printer and the stack-growth helper shared by every
//! recursive stage.

mod error;
mod span;
pub mod ast;
pub mod printer;
pub mod stack;

pub use error::{Construct, ParseError};
pub use span::{SourceFile, Span};

/// Result type used throughout the parser.
pub type Result<T> = std::result::Result<T, ParseError>;
