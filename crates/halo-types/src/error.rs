use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The grammar construct a diagnostic is attributed to.
///
/// Rendered as the bracketed tag that prefixes every message, e.g.
/// `<for statement>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construct {
    // ── Statements ──
    VarStatement,
    AssignmentStatement,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    BreakStatement,
    ContinueStatement,
    FunStatement,
    ReturnStatement,
    ClassStatement,
    LetStatement,
    ThrowStatement,
    TryStatement,
    CatchStatement,
    FinallyStatement,
    ImportStatement,

    // ── Expressions ──
    Expression,
    PrimaryExpression,
    GroupingExpression,
    BinaryExpression,
    LogicalExpression,
    UnaryExpression,
    CallExpression,
    DotExpression,
    SubscriptExpression,
    ListExpression,
    LambdaExpression,
    Literal,
    Variable,

    // ── Runtime ──
    Callable,
    NativeFun,
    Constructor,
}

impl Construct {
    /// The tag text without brackets.
    pub fn as_str(&self) -> &'static str {
        match self {
            Construct::VarStatement => "var statement",
            Construct::AssignmentStatement => "assignment statement",
            Construct::ExpressionStatement => "expression statement",
            Construct::IfStatement => "if statement",
            Construct::WhileStatement => "while statement",
            Construct::ForStatement => "for statement",
            Construct::BreakStatement => "break statement",
            Construct::ContinueStatement => "continue statement",
            Construct::FunStatement => "fun statement",
            Construct::ReturnStatement => "return statement",
            Construct::ClassStatement => "class statement",
            Construct::LetStatement => "let statement",
            Construct::ThrowStatement => "throw statement",
            Construct::TryStatement => "try statement",
            Construct::CatchStatement => "catch statement",
            Construct::FinallyStatement => "finally statement",
            Construct::ImportStatement => "import statement",
            Construct::Expression => "expression",
            Construct::PrimaryExpression => "primary expression",
            Construct::GroupingExpression => "grouping expression",
            Construct::BinaryExpression => "binary expression",
            Construct::LogicalExpression => "logical expression",
            Construct::UnaryExpression => "unary expression",
            Construct::CallExpression => "call expression",
            Construct::DotExpression => "dot expression",
            Construct::SubscriptExpression => "subscript expression",
            Construct::ListExpression => "list expression",
            Construct::LambdaExpression => "lambda expression",
            Construct::Literal => "literal",
            Construct::Variable => "variable",
            Construct::Callable => "callable",
            Construct::NativeFun => "native fun",
            Construct::Constructor => "constructor",
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

/// A syntax or context violation found while parsing.
///
/// Parsing stops at the first one; there is no recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Parse error\nline {line}: {construct} {message}")]
pub struct ParseError {
    pub line: u32,
    pub construct: Construct,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, construct: Construct, message: impl Into<String>) -> Self {
        Self {
            line,
            construct,
            message: message.into(),
        }
    }
}
