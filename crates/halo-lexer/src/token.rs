//! Token types for the halo scanner.
//!
//! Defines [`TokenKind`] covering every lexeme of the language and
//! [`Token`], which pairs a kind with its source text and [`Span`].

use halo_types::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every reserved word, in the order the scanner's keyword table lists them.
///
/// `let`, `throw`, `try`, `catch`, `finally` and `import` are reserved but
/// have no statement form; the parser rejects them.
pub const ALL_KEYWORDS: &[&str] = &[
    "not", "and", "or", "var", "let", "true", "false", "null", "if", "elif", "else", "for",
    "in", "while", "end", "break", "continue", "throw", "try", "catch", "finally", "fun",
    "return", "class", "lambda", "import",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. String literals hold their raw inner
    /// content without quotes; `Eof` holds `"eof"`.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// 1-based source line.
    pub fn line(&self) -> u32 {
        self.span.start_line
    }

    /// 0-based column offset of the first character within its line.
    pub fn offset(&self) -> u32 {
        self.span.start_col.saturating_sub(1)
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // ── Punctuation ──────────────────────────────────────────
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `(`
    OpenPar,
    /// `)`
    ClosePar,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,

    // ── Operators ────────────────────────────────────────────
    /// `+`
    Plus,
    /// `+=`
    PlusEqual,
    /// `-`
    Minus,
    /// `-=`
    MinusEqual,
    /// `*`
    Mul,
    /// `*=`
    MulEqual,
    /// `/`
    Div,
    /// `/=`
    DivEqual,
    /// `%`
    Mod,
    /// `%=`
    ModEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,

    // ── Literals & names ─────────────────────────────────────
    /// `42`
    IntLiteral,
    /// `4.2`
    FloatLiteral,
    /// `"text"`
    StrLiteral,
    /// `my_var`
    Identifier,

    // ── Keywords ─────────────────────────────────────────────
    Not,
    And,
    Or,
    Var,
    Let,
    True,
    False,
    Null,
    If,
    Elif,
    Else,
    For,
    In,
    While,
    End,
    Break,
    Continue,
    Throw,
    Try,
    Catch,
    Finally,
    Fun,
    Return,
    Class,
    Lambda,
    Import,

    // ── Special ──────────────────────────────────────────────
    /// Malformed input: a lone `!`, an unterminated string, `123.`, or an
    /// unknown character.
    Bad,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "end" => TokenKind::End,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "fun" => TokenKind::Fun,
            "return" => TokenKind::Return,
            "class" => TokenKind::Class,
            "lambda" => TokenKind::Lambda,
            "import" => TokenKind::Import,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Not
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Var
                | TokenKind::Let
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::In
                | TokenKind::While
                | TokenKind::End
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Fun
                | TokenKind::Return
                | TokenKind::Class
                | TokenKind::Lambda
                | TokenKind::Import
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::OpenPar => "(",
            TokenKind::ClosePar => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Plus => "+",
            TokenKind::PlusEqual => "+=",
            TokenKind::Minus => "-",
            TokenKind::MinusEqual => "-=",
            TokenKind::Mul => "*",
            TokenKind::MulEqual => "*=",
            TokenKind::Div => "/",
            TokenKind::DivEqual => "/=",
            TokenKind::Mod => "%",
            TokenKind::ModEqual => "%=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::BangEqual => "!=",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StrLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Not => "not",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::End => "end",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Fun => "fun",
            TokenKind::Return => "return",
            TokenKind::Class => "class",
            TokenKind::Lambda => "lambda",
            TokenKind::Import => "import",
            TokenKind::Bad => "bad token",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}
