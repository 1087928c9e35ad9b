//! halo evaluator: walks the AST against a scoped environment and a
//! garbage-collected object heap.
//!
//! ```text
//! let stmts = halo_parser::parse(halo_lexer::scan(source)).into_result()?;
//! let mut out = Vec::new();
//! Interpreter::with_io(&b""[..], &mut out).execute(&stmts)?;
//! ```

mod builtins;
mod call;
pub mod class;
pub mod config;
pub mod env;
pub mod error;
pub mod heap;
mod interpreter;
pub mod object;
mod ops;
pub mod value;

pub use config::InterpreterConfig;
pub use error::{ErrorKind, ExecError, ExecResult, TraceFrame};
pub use heap::{Heap, HeapStats, ObjRef};
pub use interpreter::{ControlFlow, Interpreter};
pub use value::Value;
