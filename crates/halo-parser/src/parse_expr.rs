//! Expression parsing with precedence climbing.
//!
//! Precedence (lowest to highest):
//! 1. `or`
//! 2. `and`
//! 3. `==` `!=`
//! 4. `<` `>` `<=` `>=`
//! 5. `+` `-`
//! 6. `*` `/` `%`
//! 7. unary `-` `not`
//! 8. postfix: call `()`, member `.name`, subscript `[]`
//! 9. primary: literals, names, `( expr )`, lists, lambdas

use std::rc::Rc;

use crate::parser::{Context, Parser};
use halo_lexer::token::TokenKind;
use halo_types::ast::*;
use halo_types::stack::ensure_sufficient_stack;
use halo_types::{Construct, ParseError};

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_expression(&mut self) -> halo_types::Result<Expr> {
        ensure_sufficient_stack(|| self.parse_or())
    }

    // ── Binary Levels ─────────────────────────────────────────────────────────

    fn parse_or(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = logical(left, LogicalOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqualEqual => BinOp::Eq,
                TokenKind::BangEqual => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEqual => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEqual => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> halo_types::Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Mul => BinOp::Mul,
                TokenKind::Div => BinOp::Div,
                TokenKind::Mod => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    // ── Unary & Postfix ───────────────────────────────────────────────────────

    fn parse_unary(&mut self) -> halo_types::Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            start,
        ))
    }

    fn parse_postfix(&mut self) -> halo_types::Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let span = expr.span;
            let kind = match self.peek_kind() {
                TokenKind::OpenPar => {
                    self.advance();
                    let args = self.parse_expr_list(TokenKind::ClosePar, Construct::CallExpression)?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    }
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier(Construct::DotExpression)?;
                    ExprKind::Dot {
                        object: Box::new(expr),
                        name,
                    }
                }
                TokenKind::OpenBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::CloseBracket, Construct::SubscriptExpression)?;
                    ExprKind::Subscript {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                _ => break,
            };
            expr = Expr::new(kind, span);
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`; the opening
    /// bracket is already consumed.
    fn parse_expr_list(
        &mut self,
        close: TokenKind,
        construct: Construct,
    ) -> halo_types::Result<Vec<Expr>> {
        let mut items = Vec::new();
        if !self.check(close) {
            loop {
                items.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(close, construct)?;
        Ok(items)
    }

    // ── Primary ───────────────────────────────────────────────────────────────

    fn parse_primary(&mut self) -> halo_types::Result<Expr> {
        let token = self.peek().clone();
        let literal = |value| {
            Expr::new(
                ExprKind::Literal(Literal {
                    value,
                    lexeme: token.lexeme.clone(),
                }),
                token.span,
            )
        };

        let expr = match token.kind {
            TokenKind::IntLiteral => {
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::new(token.line(), Construct::Literal, "integer literal out of range")
                })?;
                literal(LiteralValue::Int(value))
            }
            TokenKind::FloatLiteral => {
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::new(token.line(), Construct::Literal, "malformed float literal")
                })?;
                literal(LiteralValue::Float(value))
            }
            TokenKind::StrLiteral => literal(LiteralValue::Str(token.lexeme.clone())),
            TokenKind::True => literal(LiteralValue::Bool(true)),
            TokenKind::False => literal(LiteralValue::Bool(false)),
            TokenKind::Null => literal(LiteralValue::Null),
            TokenKind::Identifier => Expr::new(ExprKind::Var(token.lexeme.clone()), token.span),
            TokenKind::OpenPar => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::ClosePar, Construct::GroupingExpression)?;
                return Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), token.span));
            }
            TokenKind::OpenBracket => {
                self.advance();
                let items =
                    self.parse_expr_list(TokenKind::CloseBracket, Construct::ListExpression)?;
                return Ok(Expr::new(ExprKind::List(items), token.span));
            }
            TokenKind::Lambda => return self.parse_lambda(),
            TokenKind::Eof => {
                return Err(ParseError::new(
                    token.line(),
                    Construct::PrimaryExpression,
                    "unexpected end of input",
                ));
            }
            _ => {
                return Err(ParseError::new(
                    token.line(),
                    Construct::PrimaryExpression,
                    format!("unexpected token '{}'", token.lexeme),
                ));
            }
        };
        self.advance();
        Ok(expr)
    }

    /// `lambda[captures](params): ... end`; the capture list may be omitted.
    fn parse_lambda(&mut self) -> halo_types::Result<Expr> {
        let construct = Construct::LambdaExpression;
        if !self.lambda_allowed() {
            return Err(self.error_at_current(
                construct,
                "cannot be used in another lambda or as a class member",
            ));
        }
        let start = self.advance().span;

        let captures = if self.eat(TokenKind::OpenBracket) {
            let names = self.parse_unique_names(construct, TokenKind::CloseBracket, "capture")?;
            self.expect(TokenKind::CloseBracket, construct)?;
            names
        } else {
            Vec::new()
        };
        let params = self.parse_params(construct)?;
        self.expect(TokenKind::Colon, construct)?;
        let body = self.with_context(Context::Lambda, |p| p.parse_block(construct, &[]))?;
        self.expect_end(construct)?;

        let decl = LambdaDecl {
            captures,
            params,
            body,
            span: start,
        };
        Ok(Expr::new(ExprKind::Lambda(Rc::new(decl)), start))
    }
}

// ── Node Builders ─────────────────────────────────────────────────────────────

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
