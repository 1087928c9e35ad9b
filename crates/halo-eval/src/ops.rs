//! Arithmetic, comparison and unary operators.
//!
//! `Int op Int` stays integral (with checked overflow and truncating
//! division); mixing `Int` and `Float` promotes to `Float`. `%` is defined
//! for integers only.

use std::cmp::Ordering;

use halo_types::ast::{BinOp, UnaryOp};
use halo_types::Construct;

use crate::error::{ErrorKind, ExecError, ExecResult};
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::value::Value;

/// Numeric operands after promotion.
enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(left: Value, right: Value) -> Option<Numbers> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(Numbers::Ints(a, b)),
        (Value::Int(a), Value::Float(b)) => Some(Numbers::Floats(a as f64, b)),
        (Value::Float(a), Value::Int(b)) => Some(Numbers::Floats(a, b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Numbers::Floats(a, b)),
        _ => None,
    }
}

impl Interpreter<'_> {
    pub(crate) fn binary_op(
        &mut self,
        op: BinOp,
        left: Value,
        right: Value,
        line: u32,
        construct: Construct,
    ) -> ExecResult<Value> {
        let operand_error = || {
            ExecError::new(
                ErrorKind::Type,
                line,
                construct,
                format!("incorrect operand types for '{}' operator", op.as_str()),
            )
        };
        let overflow = || {
            ExecError::new(
                ErrorKind::Arithmetic,
                line,
                construct,
                format!("integer overflow in '{}' operator", op.as_str()),
            )
        };
        let division_by_zero =
            || ExecError::new(ErrorKind::Arithmetic, line, construct, "division by zero");

        match op {
            BinOp::Eq => return Ok(Value::Bool(self.values_equal(left, right))),
            BinOp::NotEq => return Ok(Value::Bool(!self.values_equal(left, right))),
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                let result = self.compare(op, left, right).ok_or_else(operand_error)?;
                return Ok(Value::Bool(result));
            }
            BinOp::Add => {
                if let Some(joined) = self.concat(left, right) {
                    return Ok(self.alloc(joined));
                }
            }
            _ => {}
        }

        match numbers(left, right).ok_or_else(operand_error)? {
            Numbers::Ints(a, b) => {
                let result = match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    BinOp::Mul => a.checked_mul(b),
                    BinOp::Div | BinOp::Mod if b == 0 => return Err(division_by_zero()),
                    BinOp::Div => a.checked_div(b),
                    BinOp::Mod => a.checked_rem(b),
                    _ => unreachable!("comparison handled above"),
                };
                result.map(Value::Int).ok_or_else(overflow)
            }
            Numbers::Floats(a, b) => match op {
                BinOp::Add => Ok(Value::Float(a + b)),
                BinOp::Sub => Ok(Value::Float(a - b)),
                BinOp::Mul => Ok(Value::Float(a * b)),
                BinOp::Div => Ok(Value::Float(a / b)),
                BinOp::Mod => Err(operand_error()),
                _ => unreachable!("comparison handled above"),
            },
        }
    }

    pub(crate) fn unary_op(&mut self, op: UnaryOp, operand: Value, line: u32) -> ExecResult<Value> {
        match (op, operand) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!self.truthy(value))),
            (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                ExecError::new(
                    ErrorKind::Arithmetic,
                    line,
                    Construct::UnaryExpression,
                    "integer overflow in '-' operator",
                )
            }),
            (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
            (UnaryOp::Neg, _) => Err(ExecError::new(
                ErrorKind::Type,
                line,
                Construct::UnaryExpression,
                "incorrect operand types for '-' operator",
            )),
        }
    }

    /// `< <= > >=` on numbers (with promotion) and strings. `None` means
    /// the operand types do not compare. Floats use IEEE comparison, so any
    /// comparison involving NaN is false.
    fn compare(&self, op: BinOp, left: Value, right: Value) -> Option<bool> {
        let ordering = match numbers(left, right) {
            Some(Numbers::Floats(a, b)) => {
                return Some(match op {
                    BinOp::Less => a < b,
                    BinOp::LessEq => a <= b,
                    BinOp::Greater => a > b,
                    _ => a >= b,
                });
            }
            Some(Numbers::Ints(a, b)) => a.cmp(&b),
            None => match (self.heap.get(left.as_obj()?), self.heap.get(right.as_obj()?)) {
                (Object::String(a), Object::String(b)) => a.cmp(b),
                _ => return None,
            },
        };
        Some(match op {
            BinOp::Less => ordering == Ordering::Less,
            BinOp::LessEq => ordering != Ordering::Greater,
            BinOp::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        })
    }

    /// `+` on two strings or two lists builds a new object.
    fn concat(&self, left: Value, right: Value) -> Option<Object> {
        match (self.heap.get(left.as_obj()?), self.heap.get(right.as_obj()?)) {
            (Object::String(a), Object::String(b)) => Some(Object::String(format!("{a}{b}"))),
            (Object::List(a), Object::List(b)) => {
                Some(Object::List(a.iter().chain(b).copied().collect()))
            }
            _ => None,
        }
    }
}
