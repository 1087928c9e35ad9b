//! Statement parsing.

use std::rc::Rc;

use crate::parser::{Context, Parser};
use halo_lexer::token::TokenKind;
use halo_types::ast::*;
use halo_types::stack::ensure_sufficient_stack;
use halo_types::Construct;

impl Parser {
    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> halo_types::Result<Stmt> {
        ensure_sufficient_stack(|| match self.peek_kind() {
            TokenKind::Var => self.parse_var_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Fun => self.parse_fun_stmt(),
            TokenKind::Class => self.parse_class_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => self.parse_loop_jump(StmtKind::Break, Construct::BreakStatement),
            TokenKind::Continue => {
                self.parse_loop_jump(StmtKind::Continue, Construct::ContinueStatement)
            }
            TokenKind::Let => Err(self.unsupported(Construct::LetStatement)),
            TokenKind::Throw => Err(self.unsupported(Construct::ThrowStatement)),
            TokenKind::Try => Err(self.unsupported(Construct::TryStatement)),
            TokenKind::Catch => Err(self.unsupported(Construct::CatchStatement)),
            TokenKind::Finally => Err(self.unsupported(Construct::FinallyStatement)),
            TokenKind::Import => Err(self.unsupported(Construct::ImportStatement)),
            _ => self.parse_simple_stmt(),
        })
    }

    fn unsupported(&self, construct: Construct) -> halo_types::ParseError {
        self.error_at_current(construct, "is not supported")
    }

    /// Parse statements until one of `terminators` (or `end`) is next.
    ///
    /// Reaching end of input first is reported against `construct`.
    pub(crate) fn parse_block(
        &mut self,
        construct: Construct,
        terminators: &[TokenKind],
    ) -> halo_types::Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::End) && !terminators.contains(&self.peek_kind()) {
            if self.at_end() {
                return Err(self.error_at_current(construct, "missing end of statement"));
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    // ── Simple Statements ─────────────────────────────────────────────────────

    /// `var name = expr;` or `var name;`
    fn parse_var_stmt(&mut self) -> halo_types::Result<Stmt> {
        let start = self.advance().span;
        let name = self.expect_identifier(Construct::VarStatement)?;
        let init = if self.eat(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_semicolon(Construct::VarStatement)?;
        Ok(Stmt::new(StmtKind::Var { name, init }, start))
    }

    /// An expression statement, or an assignment when an assignment
    /// operator follows the first expression.
    fn parse_simple_stmt(&mut self) -> halo_types::Result<Stmt> {
        let target = self.parse_expression()?;
        let span = target.span;

        let op = match self.peek_kind() {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::Add,
            TokenKind::MinusEqual => AssignOp::Sub,
            TokenKind::MulEqual => AssignOp::Mul,
            TokenKind::DivEqual => AssignOp::Div,
            TokenKind::ModEqual => AssignOp::Mod,
            _ => {
                self.expect_semicolon(Construct::ExpressionStatement)?;
                return Ok(Stmt::new(StmtKind::Expression(target), span));
            }
        };

        if !target.is_assignable() {
            return Err(self.error_at_current(
                Construct::AssignmentStatement,
                "invalid assignment target",
            ));
        }
        self.advance();
        let value = self.parse_expression()?;
        self.expect_semicolon(Construct::AssignmentStatement)?;
        Ok(Stmt::new(StmtKind::Assign { target, op, value }, span))
    }

    /// `return;` or `return expr;`
    fn parse_return_stmt(&mut self) -> halo_types::Result<Stmt> {
        let token = self.advance();
        let construct = Construct::ReturnStatement;
        let callable = self.enclosing_callable();
        if callable.is_none() {
            return Err(halo_types::ParseError::new(token.line(), construct, "out of function"));
        }

        if self.eat(TokenKind::Semicolon) {
            return Ok(Stmt::new(StmtKind::Return(None), token.span));
        }
        if callable == Some(Context::Init) {
            return Err(halo_types::ParseError::new(
                token.line(),
                construct,
                "must not have return value in constructor",
            ));
        }
        let value = self.parse_expression()?;
        self.expect_semicolon(construct)?;
        Ok(Stmt::new(StmtKind::Return(Some(value)), token.span))
    }

    /// `break;` / `continue;`
    fn parse_loop_jump(
        &mut self,
        kind: StmtKind,
        construct: Construct,
    ) -> halo_types::Result<Stmt> {
        let token = self.advance();
        if !self.in_loop() {
            return Err(halo_types::ParseError::new(token.line(), construct, "out of loop"));
        }
        self.expect_semicolon(construct)?;
        Ok(Stmt::new(kind, token.span))
    }

    // ── Block Statements ──────────────────────────────────────────────────────

    /// `if c: ... elif c: ... else: ... end`
    fn parse_if_stmt(&mut self) -> halo_types::Result<Stmt> {
        let start = self.advance().span;
        let construct = Construct::IfStatement;
        let branch_ends = [TokenKind::Elif, TokenKind::Else];

        self.with_context(Context::If, |p| {
            let mut branches = Vec::new();
            loop {
                let cond = p.parse_expression()?;
                p.expect(TokenKind::Colon, construct)?;
                let body = p.parse_block(construct, &branch_ends)?;
                branches.push(IfBranch { cond, body });
                if !p.eat(TokenKind::Elif) {
                    break;
                }
            }

            let else_body = if p.eat(TokenKind::Else) {
                p.eat(TokenKind::Colon);
                Some(p.parse_block(construct, &[])?)
            } else {
                None
            };

            p.expect_end(construct)?;
            Ok(Stmt::new(
                StmtKind::If(IfStmt {
                    branches,
                    else_body,
                }),
                start,
            ))
        })
    }

    /// `while c: ... end`
    fn parse_while_stmt(&mut self) -> halo_types::Result<Stmt> {
        let start = self.advance().span;
        let construct = Construct::WhileStatement;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Colon, construct)?;
        let body = self.with_context(Context::While, |p| p.parse_block(construct, &[]))?;
        self.expect_end(construct)?;
        Ok(Stmt::new(StmtKind::While { cond, body }, start))
    }

    /// `for x in (begin, end[, step]): ... end` or `for x in expr: ... end`
    fn parse_for_stmt(&mut self) -> halo_types::Result<Stmt> {
        let start = self.advance().span;
        let construct = Construct::ForStatement;
        let var = self.expect_identifier(construct)?;
        self.expect(TokenKind::In, construct)?;

        let source = if self.is_range_header() {
            self.advance();
            let begin = self.parse_expression()?;
            self.expect(TokenKind::Comma, construct)?;
            let end = self.parse_expression()?;
            let step = if self.eat(TokenKind::Comma) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect(TokenKind::ClosePar, construct)?;
            ForSource::Range { begin, end, step }
        } else {
            ForSource::Iterable(self.parse_expression()?)
        };

        self.expect(TokenKind::Colon, construct)?;
        let body = self.with_context(Context::For, |p| p.parse_block(construct, &[]))?;
        self.expect_end(construct)?;
        Ok(Stmt::new(
            StmtKind::For(Box::new(ForStmt { var, source, body })),
            start,
        ))
    }

    /// Whether the upcoming `( ... )` holds a top-level comma, making it a
    /// range header rather than a parenthesised iterable.
    fn is_range_header(&self) -> bool {
        if !self.check(TokenKind::OpenPar) {
            return false;
        }
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            match self.look_ahead(n) {
                TokenKind::OpenPar | TokenKind::OpenBracket => depth += 1,
                TokenKind::ClosePar | TokenKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return false;
                    }
                }
                TokenKind::Comma if depth == 1 => return true,
                TokenKind::Eof | TokenKind::Colon => return false,
                _ => {}
            }
            n += 1;
        }
    }

    // ── Declarations ──────────────────────────────────────────────────────────

    /// `fun name(params): ... end`
    fn parse_fun_stmt(&mut self) -> halo_types::Result<Stmt> {
        let decl = self.parse_fun_decl()?;
        let span = decl.span;
        Ok(Stmt::new(StmtKind::Fun(decl), span))
    }

    pub(crate) fn parse_fun_decl(&mut self) -> halo_types::Result<Rc<FunDecl>> {
        let construct = Construct::FunStatement;
        if !self.fun_allowed() {
            return Err(self.error_at_current(construct, "must be global or a class member"));
        }
        let start = self.advance().span;
        let name = self.expect_identifier(construct)?;
        let params = self.parse_params(construct)?;
        self.expect(TokenKind::Colon, construct)?;

        let context = if self.in_class_body() && name.name == INIT_METHOD {
            Context::Init
        } else {
            Context::Fun
        };
        let body = self.with_context(context, |p| p.parse_block(construct, &[]))?;
        self.expect_end(construct)?;

        Ok(Rc::new(FunDecl {
            name,
            params,
            body,
            span: start,
        }))
    }

    /// `(a, b, c)`, rejecting repeated names.
    pub(crate) fn parse_params(&mut self, construct: Construct) -> halo_types::Result<Vec<Ident>> {
        self.expect(TokenKind::OpenPar, construct)?;
        let params = self.parse_unique_names(construct, TokenKind::ClosePar, "parameter")?;
        self.expect(TokenKind::ClosePar, construct)?;
        Ok(params)
    }

    /// Comma-separated identifiers up to (not including) `close`.
    pub(crate) fn parse_unique_names(
        &mut self,
        construct: Construct,
        close: TokenKind,
        what: &str,
    ) -> halo_types::Result<Vec<Ident>> {
        let mut names: Vec<Ident> = Vec::new();
        if self.check(close) {
            return Ok(names);
        }
        loop {
            let name = self.expect_identifier(construct)?;
            if names.iter().any(|n| n.name == name.name) {
                return Err(halo_types::ParseError::new(
                    name.span.line(),
                    construct,
                    format!("duplicate {what} '{}'", name.name),
                ));
            }
            names.push(name);
            if !self.eat(TokenKind::Comma) {
                return Ok(names);
            }
        }
    }

    /// `class Name: var a, b; fun m(): ... end end`
    fn parse_class_stmt(&mut self) -> halo_types::Result<Stmt> {
        let construct = Construct::ClassStatement;
        if !self.at_global_scope() {
            return Err(self.error_at_current(construct, "must be global"));
        }
        let start = self.advance().span;
        let name = self.expect_identifier(construct)?;
        self.expect(TokenKind::Colon, construct)?;

        let (fields, methods) = self.with_context(Context::Class, |p| {
            let mut fields: Vec<Ident> = Vec::new();
            let mut methods: Vec<Rc<FunDecl>> = Vec::new();
            loop {
                match p.peek_kind() {
                    TokenKind::End => break,
                    TokenKind::Var => {
                        p.advance();
                        loop {
                            let field = p.expect_identifier(construct)?;
                            p.check_member_unique(&field, &fields, &methods)?;
                            fields.push(field);
                            if !p.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                        p.expect_semicolon(construct)?;
                    }
                    TokenKind::Fun => {
                        let method = p.parse_fun_decl()?;
                        p.check_member_unique(&method.name, &fields, &methods)?;
                        methods.push(method);
                    }
                    TokenKind::Eof => {
                        return Err(p.error_at_current(construct, "missing end of statement"));
                    }
                    _ => {
                        let lexeme = p.peek().lexeme.clone();
                        return Err(p.error_at_current(
                            construct,
                            format!("unexpected '{lexeme}' in class body"),
                        ));
                    }
                }
            }
            Ok((fields, methods))
        })?;
        self.expect_end(construct)?;

        let decl = ClassDecl {
            name,
            fields,
            methods,
            span: start,
        };
        Ok(Stmt::new(StmtKind::Class(Rc::new(decl)), start))
    }

    fn check_member_unique(
        &self,
        name: &Ident,
        fields: &[Ident],
        methods: &[Rc<FunDecl>],
    ) -> halo_types::Result<()> {
        let what = if fields.iter().any(|f| f.name == name.name) {
            "field"
        } else if methods.iter().any(|m| m.name.name == name.name) {
            "method"
        } else {
            return Ok(());
        };
        Err(halo_types::ParseError::new(
            name.span.line(),
            Construct::ClassStatement,
            format!("duplicate {what} '{}'", name.name),
        ))
    }
}
