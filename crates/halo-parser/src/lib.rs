//! halo parser: converts a token stream into an AST.
//!
//! Statement mode ([`parse`]) stops at the first error. Expression mode
//! ([`parse_expr`]) is the REPL fallback for input that is not a statement.

mod parse_expr;
mod parse_stmt;
mod parser;

use halo_lexer::Token;
use halo_types::ast::Expr;

pub use parser::{ParseResult, Parser};

/// Parse a program.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens).parse()
}

/// Parse a single expression, optionally terminated by `;`.
pub fn parse_expr(tokens: Vec<Token>) -> halo_types::Result<Expr> {
    Parser::new(tokens).parse_expr()
}
