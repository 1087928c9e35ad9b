//! halo scanner: converts source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, ALL_KEYWORDS};

/// Scan `source` into tokens, terminated by an `Eof` token.
///
/// Never fails: malformed input shows up as [`TokenKind::Bad`] tokens for
/// the parser to reject.
pub fn scan(source: &str) -> Vec<Token> {
    Lexer::new(source).scan()
}
