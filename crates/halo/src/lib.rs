//! halo front end: a [`Session`] ties the scanner, parser and evaluator
//! together for script runs and REPL lines.
//!
//! ```text
//! let mut out = Vec::new();
//! let mut session = Session::with_io(InterpreterConfig::default(), &b""[..], &mut out);
//! session.run_source("println(2 + 2);")?;
//! ```

use std::io::{self, BufRead, Write};

use halo_lexer::scan;
use halo_parser::{parse, parse_expr};
use halo_types::ast::Stmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use halo_eval::{ExecError, Interpreter, InterpreterConfig, Value};
pub use halo_types::{ParseError, SourceFile};

/// Any error a halo program can produce.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum HaloError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl HaloError {
    /// The source line the error points at, if it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            HaloError::Parse(err) => Some(err.line),
            HaloError::Exec(err) => err.line,
        }
    }

    /// The rendered error followed by the offending line of `file`:
    ///
    /// ```text
    /// Execution error
    /// line 2: <call expression> 'foo' is not defined
    ///  --> demo.halo:2
    ///   | foo();
    /// ```
    pub fn render_with_source(&self, file: &SourceFile) -> String {
        let mut out = self.to_string();
        if let Some(line) = self.line() {
            if let Some(text) = file.line(line) {
                out.push_str(&format!("\n --> {}:{line}\n  | {text}", file.name));
            }
        }
        out
    }
}

/// Scan and parse `source` without running it.
pub fn check(source: &str) -> Result<Vec<Stmt>, ParseError> {
    parse(scan(source)).into_result()
}

/// One interpreter whose definitions persist across runs and lines.
pub struct Session<'io> {
    interp: Interpreter<'io>,
}

impl Session<'static> {
    /// A session reading stdin and writing stdout.
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_io(config, io::stdin().lock(), io::stdout())
    }
}

impl<'io> Session<'io> {
    pub fn with_io(
        config: InterpreterConfig,
        input: impl BufRead + 'io,
        output: impl Write + 'io,
    ) -> Self {
        Self {
            interp: Interpreter::with_config(config, input, output),
        }
    }

    /// Parse and run a whole program.
    pub fn run_source(&mut self, source: &str) -> Result<(), HaloError> {
        let stmts = check(source)?;
        self.interp.execute(&stmts)?;
        Ok(())
    }

    /// Run one REPL line. The line is parsed as statements first; when
    /// that fails it is retried as a bare expression, whose rendered value
    /// is returned. A line that is neither reports the statement error.
    pub fn eval_line(&mut self, line: &str) -> Result<Option<String>, HaloError> {
        let tokens = scan(line);
        let stmt_err = match parse(tokens.clone()).into_result() {
            Ok(stmts) => {
                self.interp.execute(&stmts)?;
                return Ok(None);
            }
            Err(err) => err,
        };
        let Ok(expr) = parse_expr(tokens) else {
            return Err(stmt_err.into());
        };
        debug!("line evaluated as an expression");
        let value = self.interp.evaluate(&expr)?;
        Ok(Some(self.interp.to_str(value)))
    }

    /// Read the next line of input, sharing the stream with `readln()`.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.interp.read_line(buf)
    }

    pub fn interpreter(&self) -> &Interpreter<'io> {
        &self.interp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_parse_errors() {
        assert!(check("var x = 1;").is_ok());
        let err = check("var = 1;").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_render_with_source_quotes_the_line() {
        let file = SourceFile::new("demo.halo", "var x = 1;\nbreak;\n");
        let err: HaloError = check(&file.source).unwrap_err().into();
        assert_eq!(err.line(), Some(2));
        assert_eq!(
            err.render_with_source(&file),
            "Parse error\nline 2: <break statement> out of loop\n --> demo.halo:2\n  | break;"
        );
    }

    #[test]
    fn test_error_display_is_transparent() {
        let err: HaloError = check("break;").unwrap_err().into();
        assert!(err.to_string().starts_with("Parse error\nline 1: <break statement>"));
    }
}
