//! Structural printer for expressions.
//!
//! Renders a canonical, fully parenthesised form: every binary, logical and
//! unary node gets its own parentheses while source groupings vanish, so
//! `(2+3)*-4` prints as `((2+3)*(-4))`. Lambdas print as a summary of their
//! capture and parameter counts.

use std::fmt::{self, Write};

use crate::ast::{Expr, ExprKind, UnaryOp};
use crate::stack::ensure_sufficient_stack;

/// Render an expression in canonical form.
pub fn render(expr: &Expr) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_expr(&mut out, expr);
    out
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self)
    }
}

fn write_expr<W: Write>(out: &mut W, expr: &Expr) -> fmt::Result {
    ensure_sufficient_stack(|| write_node(out, expr))
}

fn write_node<W: Write>(out: &mut W, expr: &Expr) -> fmt::Result {
    match &expr.kind {
        ExprKind::Grouping(inner) => write_expr(out, inner),
        ExprKind::Binary { left, op, right } => {
            out.write_char('(')?;
            write_expr(out, left)?;
            out.write_str(op.as_str())?;
            write_expr(out, right)?;
            out.write_char(')')
        }
        ExprKind::Logical { left, op, right } => {
            out.write_char('(')?;
            write_expr(out, left)?;
            write!(out, " {} ", op.as_str())?;
            write_expr(out, right)?;
            out.write_char(')')
        }
        ExprKind::Unary { op, operand } => {
            match op {
                UnaryOp::Neg => out.write_str("(-")?,
                UnaryOp::Not => out.write_str("(not ")?,
            }
            write_expr(out, operand)?;
            out.write_char(')')
        }
        ExprKind::Call { callee, args } => {
            write_expr(out, callee)?;
            out.write_char('(')?;
            write_list(out, args)?;
            out.write_char(')')
        }
        ExprKind::Dot { object, name } => {
            write_expr(out, object)?;
            write!(out, ".{}", name.name)
        }
        ExprKind::Subscript { object, index } => {
            write_expr(out, object)?;
            out.write_char('[')?;
            write_expr(out, index)?;
            out.write_char(']')
        }
        ExprKind::Literal(lit) => out.write_str(&lit.lexeme),
        ExprKind::Var(name) => out.write_str(name),
        ExprKind::Lambda(decl) => {
            write!(out, "lambda[{}]({})", decl.captures.len(), decl.params.len())
        }
        ExprKind::List(items) => {
            out.write_char('[')?;
            write_list(out, items)?;
            out.write_char(']')
        }
    }
}

fn write_list<W: Write>(out: &mut W, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_expr(out, item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Ident, Literal, LiteralValue};
    use crate::Span;

    fn int(n: i64) -> Expr {
        Expr::new(
            ExprKind::Literal(Literal {
                value: LiteralValue::Int(n),
                lexeme: n.to_string(),
            }),
            Span::point(1, 1),
        )
    }

    fn boxed(kind: ExprKind) -> Box<Expr> {
        Box::new(Expr::new(kind, Span::point(1, 1)))
    }

    #[test]
    fn test_grouping_is_transparent() {
        let sum = ExprKind::Binary {
            left: Box::new(int(2)),
            op: BinOp::Add,
            right: Box::new(int(3)),
        };
        let grouped = Expr::new(ExprKind::Grouping(boxed(sum)), Span::point(1, 1));
        assert_eq!(render(&grouped), "(2+3)");
    }

    #[test]
    fn test_dot_and_call_chain() {
        let callee = boxed(ExprKind::Dot {
            object: boxed(ExprKind::Var("p".into())),
            name: Ident::new("move", Span::point(1, 3)),
        });
        let call = Expr::new(
            ExprKind::Call {
                callee,
                args: vec![int(1), int(2)],
            },
            Span::point(1, 1),
        );
        assert_eq!(call.to_string(), "p.move(1, 2)");
    }
}
