//! Core parser infrastructure: token cursor, construct-context stack, errors.

use halo_lexer::token::{Token, TokenKind};
use halo_types::ast::{Expr, Ident, Stmt};
use halo_types::{Construct, ParseError, Span};
use tracing::debug;

/// An enclosing construct, as tracked on the parser's context stack.
///
/// What is legal at a given point (`break`, `return`, `fun`, `lambda`,
/// `class`) depends on which of these enclose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    If,
    While,
    For,
    Fun,
    /// The body of a class's `_init_` method.
    Init,
    Lambda,
    Class,
}

/// The halo parser.
///
/// Consumes a token stream produced by the scanner and builds an AST.
/// Stops at the first error.
pub struct Parser {
    /// The token stream, always ending with `Eof`.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Enclosing constructs, innermost last.
    contexts: Vec<Context>,
}

/// Result of parsing a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// The parsed statements; empty when parsing failed.
    pub stmts: Vec<Stmt>,
    /// The error that aborted parsing, if any.
    pub error: Option<ParseError>,
}

impl ParseResult {
    pub fn had_errors(&self) -> bool {
        self.error.is_some()
    }

    /// The statements, or the error that stopped parsing.
    pub fn into_result(self) -> halo_types::Result<Vec<Stmt>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stmts),
        }
    }
}

impl Parser {
    /// Create a parser over a token stream. A missing `Eof` is appended.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| Span::point(t.span.end_line, t.span.end_col + 1))
                .unwrap_or(Span::point(1, 1));
            tokens.push(Token::new(TokenKind::Eof, "eof", span));
        }
        Self {
            tokens,
            pos: 0,
            contexts: Vec::new(),
        }
    }

    /// Parse a whole program.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> ParseResult {
        let mut stmts = Vec::new();
        while !self.at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    debug!(line = err.line, construct = %err.construct, "parse aborted");
                    return ParseResult {
                        stmts: Vec::new(),
                        error: Some(err),
                    };
                }
            }
        }
        ParseResult { stmts, error: None }
    }

    /// Parse the whole stream as one expression, optionally followed by `;`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse_expr(mut self) -> halo_types::Result<Expr> {
        let expr = self.parse_expression()?;
        self.eat(TokenKind::Semicolon);
        if !self.at_end() {
            let lexeme = self.peek().lexeme.clone();
            return Err(self.error_at_current(
                Construct::Expression,
                format!("unexpected '{lexeme}' after expression"),
            ));
        }
        Ok(expr)
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should end with Eof")
        })
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The kind of the token `n` positions ahead.
    pub(crate) fn look_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind, reporting `missing '<kind>'` otherwise.
    pub(crate) fn expect(
        &mut self,
        expected: TokenKind,
        construct: Construct,
    ) -> halo_types::Result<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(construct, format!("missing '{expected}'")))
        }
    }

    /// Expect the `;` that ends a simple statement.
    pub(crate) fn expect_semicolon(&mut self, construct: Construct) -> halo_types::Result<()> {
        self.expect(TokenKind::Semicolon, construct).map(|_| ())
    }

    /// Expect the `end` that closes a block construct.
    pub(crate) fn expect_end(&mut self, construct: Construct) -> halo_types::Result<()> {
        if self.eat(TokenKind::End) {
            Ok(())
        } else {
            Err(self.error_at_current(construct, "missing end of statement"))
        }
    }

    pub(crate) fn expect_identifier(&mut self, construct: Construct) -> halo_types::Result<Ident> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok(Ident::new(token.lexeme, token.span))
        } else {
            let lexeme = self.peek().lexeme.clone();
            Err(self.error_at_current(construct, format!("expected a name, found '{lexeme}'")))
        }
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    pub(crate) fn error_at_current(
        &self,
        construct: Construct,
        message: impl Into<String>,
    ) -> ParseError {
        ParseError::new(self.peek().line(), construct, message)
    }

    // ── Context Stack ─────────────────────────────────────────────────────────

    /// Run `f` with `context` pushed; it is popped again on every path.
    pub(crate) fn with_context<T>(
        &mut self,
        context: Context,
        f: impl FnOnce(&mut Self) -> halo_types::Result<T>,
    ) -> halo_types::Result<T> {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    /// A loop encloses this point without an intervening callable or class.
    pub(crate) fn in_loop(&self) -> bool {
        for context in self.contexts.iter().rev() {
            match context {
                Context::If => continue,
                Context::While | Context::For => return true,
                Context::Fun | Context::Init | Context::Lambda | Context::Class => return false,
            }
        }
        false
    }

    /// The nearest enclosing callable, if no class body intervenes.
    pub(crate) fn enclosing_callable(&self) -> Option<Context> {
        for context in self.contexts.iter().rev() {
            match context {
                Context::If | Context::While | Context::For => continue,
                Context::Fun | Context::Init | Context::Lambda => return Some(*context),
                Context::Class => return None,
            }
        }
        None
    }

    /// `fun` may appear at global scope or directly in a class body.
    pub(crate) fn fun_allowed(&self) -> bool {
        matches!(self.contexts.last(), None | Some(Context::Class))
    }

    pub(crate) fn in_class_body(&self) -> bool {
        self.contexts.last() == Some(&Context::Class)
    }

    /// `lambda` is rejected inside another lambda or a class body unless a
    /// named function lies between.
    pub(crate) fn lambda_allowed(&self) -> bool {
        for context in self.contexts.iter().rev() {
            match context {
                Context::Fun | Context::Init => return true,
                Context::Lambda | Context::Class => return false,
                Context::If | Context::While | Context::For => continue,
            }
        }
        true
    }

    pub(crate) fn at_global_scope(&self) -> bool {
        self.contexts.is_empty()
    }
}
