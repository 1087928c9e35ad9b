//! AST node types for the halo language.
//!
//! Every node carries a [`Span`] whose start line is what diagnostics report.
//! Children are boxed; callable bodies sit behind [`Rc`] so the runtime can
//! share them with the tree without copying.

use std::rc::Rc;

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> u32 {
        self.span.start_line
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `var x = expr;` or `var x;`
    Var { name: Ident, init: Option<Expr> },
    /// `target = expr;`, `target += expr;`, ...
    ///
    /// The target is always a `Var`, `Dot` or `Subscript` expression.
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    /// `expr;`
    Expression(Expr),
    /// `if c: ... elif c: ... else: ... end`
    If(IfStmt),
    /// `while c: ... end`
    While { cond: Expr, body: Vec<Stmt> },
    /// `for x in ...: ... end`
    For(Box<ForStmt>),
    Break,
    Continue,
    /// `fun name(params): ... end`
    Fun(Rc<FunDecl>),
    /// `return;` or `return expr;`
    Return(Option<Expr>),
    /// `class Name: ... end`
    Class(Rc<ClassDecl>),
}

/// Conditional branches in source order plus the optional `else` body.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub branches: Vec<IfBranch>,
    pub else_body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: Ident,
    pub source: ForSource,
    pub body: Vec<Stmt>,
}

/// What a `for` loop walks over.
#[derive(Debug, Clone, PartialEq)]
pub enum ForSource {
    /// `(begin, end[, step])`, end-exclusive.
    Range {
        begin: Expr,
        end: Expr,
        step: Option<Expr>,
    },
    /// Any value answering `_iter_()`.
    Iterable(Expr),
}

/// A named function, either global or a class method.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunDecl {
    /// `_init_` is the constructor hook run by class calls.
    pub fn is_init(&self) -> bool {
        self.name.name == INIT_METHOD
    }
}

/// Name of the constructor method.
pub const INIT_METHOD: &str = "_init_";

/// Name of the implicit receiver inside methods.
pub const RECEIVER: &str = "my";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    /// Declared field names, unique, in source order.
    pub fields: Vec<Ident>,
    /// Methods, unique by name, in source order.
    pub methods: Vec<Rc<FunDecl>>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression with the span of its leading token.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> u32 {
        self.span.start_line
    }

    /// Whether this expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Var(_) | ExprKind::Dot { .. } | ExprKind::Subscript { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `(expr)`
    Grouping(Box<Expr>),
    /// `a + b`, `a == b`, ...
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `a and b`, `a or b`
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// `-x`, `not x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `object.name`
    Dot { object: Box<Expr>, name: Ident },
    /// `object[index]`
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Literal(Literal),
    /// A name reference.
    Var(String),
    /// `lambda[captures](params): ... end`
    Lambda(Rc<LambdaDecl>),
    /// `[a, b, ...]`
    List(Vec<Expr>),
}

/// A literal keeps its source text so printing reproduces it exactly
/// (`2.0` stays `2.0`).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub lexeme: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaDecl {
    /// Names copied from the defining environment at creation.
    pub captures: Vec<Ident>,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ── Operators ─────────────────────────────────────────────────────────────────

/// Binary (non-short-circuit) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinOp {
    /// Returns the operator symbol for printing and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
        }
    }
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `not x`
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        }
    }
}

/// `=` and the compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The arithmetic a compound assignment applies before storing.
    pub fn binary(&self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        }
    }
}
