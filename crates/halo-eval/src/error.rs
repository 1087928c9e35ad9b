//! Runtime error types for the halo evaluator.

use halo_types::Construct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of an execution error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Undefined, unresolved or duplicate names.
    Name,
    /// Operand types, non-callables, non-iterables.
    Type,
    /// Wrong number of arguments to a callable.
    Arity,
    /// Division by zero, integer overflow.
    Arithmetic,
    /// Index type or range violations.
    Index,
    /// Unknown fields and methods.
    Attribute,
    /// The call-depth ceiling was exceeded.
    Recursion,
    /// Bad arguments to a native function or method.
    Value,
    /// Writing to the output sink failed.
    Io,
}

/// One call expression an error propagated through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub line: u32,
    /// The callee as written at the call site, e.g. `p.move`.
    pub callee: String,
}

/// An error raised while executing a program.
///
/// Renders as
///
/// ```text
/// Execution error
/// line 3: <binary expression> division by zero
///   at line 7: f
/// ```
///
/// The `line N: ` prefix is omitted when `line` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", render(.line, .construct, .message, .trace))]
pub struct ExecError {
    pub kind: ErrorKind,
    pub line: Option<u32>,
    pub construct: Construct,
    pub message: String,
    /// Innermost call first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceFrame>,
}

impl ExecError {
    pub fn new(
        kind: ErrorKind,
        line: u32,
        construct: Construct,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            line: Some(line),
            construct,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// An error with no source line, as raised by native code.
    pub fn native(kind: ErrorKind, construct: Construct, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            construct,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Fill in `line` unless the error already has one.
    pub fn or_line(mut self, line: u32) -> Self {
        self.line.get_or_insert(line);
        self
    }

    /// Record that the error left a call made at `line`.
    pub fn push_frame(mut self, line: u32, callee: impl Into<String>) -> Self {
        self.trace.push(TraceFrame {
            line,
            callee: callee.into(),
        });
        self
    }
}

fn render(
    line: &Option<u32>,
    construct: &Construct,
    message: &str,
    trace: &[TraceFrame],
) -> String {
    let mut out = String::from("Execution error\n");
    if let Some(line) = line {
        out.push_str(&format!("line {line}: "));
    }
    out.push_str(&format!("{construct} {message}"));
    for frame in trace {
        out.push_str(&format!("\n  at line {}: {}", frame.line, frame.callee));
    }
    out
}

/// Result alias for evaluator operations.
pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let err = ExecError::new(
            ErrorKind::Name,
            6,
            Construct::CallExpression,
            "'foo' is not defined",
        );
        assert_eq!(
            err.to_string(),
            "Execution error\nline 6: <call expression> 'foo' is not defined"
        );
    }

    #[test]
    fn test_display_without_line() {
        let err = ExecError::native(
            ErrorKind::Value,
            Construct::NativeFun,
            "invalid depth value in 'set_recursion_depth'",
        );
        assert_eq!(
            err.to_string(),
            "Execution error\n<native fun> invalid depth value in 'set_recursion_depth'"
        );
    }

    #[test]
    fn test_or_line_keeps_existing_line() {
        let err = ExecError::new(ErrorKind::Index, 2, Construct::CallExpression, "invalid index");
        assert_eq!(err.or_line(9).line, Some(2));
        let err = ExecError::native(ErrorKind::Index, Construct::CallExpression, "invalid index");
        assert_eq!(err.or_line(9).line, Some(9));
    }

    #[test]
    fn test_trace_lines() {
        let err = ExecError::new(
            ErrorKind::Arithmetic,
            2,
            Construct::BinaryExpression,
            "division by zero",
        )
        .push_frame(5, "inner")
        .push_frame(8, "outer");
        assert_eq!(
            err.to_string(),
            "Execution error\nline 2: <binary expression> division by zero\n  at line 5: inner\n  at line 8: outer"
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let err = ExecError::new(ErrorKind::Type, 1, Construct::UnaryExpression, "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "type");
        assert_eq!(json["line"], 1);
        assert!(json.get("trace").is_none());
    }
}
