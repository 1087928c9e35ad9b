//! Core halo scanner: converts source text to a token stream.
//!
//! Features:
//! - Whitespace (including newlines) and `#` line comments are skipped
//! - Two-character operators recognised with one character of lookahead
//! - String literals keep their raw content; there are no escape sequences
//! - Malformed input becomes [`TokenKind::Bad`] tokens, so scanning never fails

use halo_types::Span;

use crate::token::{Token, TokenKind};

/// The halo scanner.
///
/// Walks the source once, left to right, tracking line and column. Columns
/// count characters, not bytes.
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan the whole source. The result always ends with [`TokenKind::Eof`].
    pub fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if !is_continuation(ch) {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(
            start.line,
            start.col,
            self.line,
            self.col.saturating_sub(1).max(start.col),
        )
    }

    /// Build a token whose lexeme is everything consumed since `start`.
    fn token(&self, kind: TokenKind, start: Start) -> Token {
        Token::new(kind, &self.source[start.pos..self.pos], self.span_from(start))
    }

    /// Build `long` if the next character is `=`, else `short`.
    fn with_equal(&mut self, long: TokenKind, short: TokenKind, start: Start) -> Token {
        if self.peek() == Some(b'=') {
            self.advance();
            self.token(long, start)
        } else {
            self.token(short, start)
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'#' => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token dispatch
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        if self.at_end() {
            return Token::new(TokenKind::Eof, "eof", Span::point(self.line, self.col));
        }

        let start = Start {
            pos: self.pos,
            line: self.line,
            col: self.col,
        };
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, "eof", Span::point(self.line, self.col));
        };

        match ch {
            b'.' => self.token(TokenKind::Dot, start),
            b',' => self.token(TokenKind::Comma, start),
            b':' => self.token(TokenKind::Colon, start),
            b';' => self.token(TokenKind::Semicolon, start),
            b'(' => self.token(TokenKind::OpenPar, start),
            b')' => self.token(TokenKind::ClosePar, start),
            b'[' => self.token(TokenKind::OpenBracket, start),
            b']' => self.token(TokenKind::CloseBracket, start),

            b'+' => self.with_equal(TokenKind::PlusEqual, TokenKind::Plus, start),
            b'-' => self.with_equal(TokenKind::MinusEqual, TokenKind::Minus, start),
            b'*' => self.with_equal(TokenKind::MulEqual, TokenKind::Mul, start),
            b'/' => self.with_equal(TokenKind::DivEqual, TokenKind::Div, start),
            b'%' => self.with_equal(TokenKind::ModEqual, TokenKind::Mod, start),
            b'<' => self.with_equal(TokenKind::LessEqual, TokenKind::Less, start),
            b'>' => self.with_equal(TokenKind::GreaterEqual, TokenKind::Greater, start),
            b'=' => self.with_equal(TokenKind::EqualEqual, TokenKind::Equal, start),
            // There is no standalone `!`; negation is spelled `not`.
            b'!' => self.with_equal(TokenKind::BangEqual, TokenKind::Bad, start),

            b'"' => self.scan_string(start),
            b'0'..=b'9' => self.scan_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start),

            _ => {
                // Keep a multi-byte character together in one Bad token.
                while self.peek().is_some_and(is_continuation) {
                    self.advance();
                }
                self.token(TokenKind::Bad, start)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Literals & identifiers
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: Start) -> Token {
        self.skip_digits();

        if self.peek() != Some(b'.') {
            return self.token(TokenKind::IntLiteral, start);
        }

        if matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            self.skip_digits();
            self.token(TokenKind::FloatLiteral, start)
        } else {
            // `123.` is malformed; the dot belongs to the bad token.
            self.advance();
            self.token(TokenKind::Bad, start)
        }
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }
    }

    fn scan_identifier(&mut self, start: Start) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start.pos..self.pos];
        let kind = TokenKind::from_keyword(text).unwrap_or(TokenKind::Identifier);
        self.token(kind, start)
    }

    /// Scan a string literal; the opening `"` is already consumed.
    fn scan_string(&mut self, start: Start) -> Token {
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    // Unterminated: the partial text, opening quote included.
                    return self.token(TokenKind::Bad, start);
                }
                Some(b'"') => {
                    self.advance();
                    let content = &self.source[start.pos + 1..self.pos - 1];
                    return Token::new(TokenKind::StrLiteral, content, self.span_from(start));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

/// Where the token being scanned began.
#[derive(Debug, Clone, Copy)]
struct Start {
    pos: usize,
    line: u32,
    col: u32,
}

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}
