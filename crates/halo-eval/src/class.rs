//! Method tables and element access for the builtin object types.
//!
//! Strings, lists and their iterators dispatch method calls through a static
//! [`NativeClass`]. Methods report errors without a line; the call site
//! attaches its own.

use halo_types::Construct;

use crate::error::{ErrorKind, ExecError, ExecResult};
use crate::heap::ObjRef;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::value::Value;

pub type NativeMethodPtr = fn(&mut Interpreter<'_>, ObjRef, &[Value]) -> ExecResult<Value>;

#[derive(Debug)]
pub struct NativeMethod {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeMethodPtr,
}

/// Method table of a builtin type.
#[derive(Debug)]
pub struct NativeClass {
    pub name: &'static str,
    pub methods: &'static [NativeMethod],
}

impl NativeClass {
    pub fn method(&self, name: &str) -> Option<&'static NativeMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

pub static STRING_CLASS: NativeClass = NativeClass {
    name: "string",
    methods: &[
        NativeMethod {
            name: "substr",
            arity: 2,
            func: string_substr,
        },
        NativeMethod {
            name: "_iter_",
            arity: 0,
            func: string_iter,
        },
    ],
};

pub static LIST_CLASS: NativeClass = NativeClass {
    name: "list",
    methods: &[
        NativeMethod {
            name: "put",
            arity: 1,
            func: list_put,
        },
        NativeMethod {
            name: "pop",
            arity: 0,
            func: list_pop,
        },
        NativeMethod {
            name: "pop_at",
            arity: 1,
            func: list_pop_at,
        },
        NativeMethod {
            name: "pop_all",
            arity: 1,
            func: list_pop_all,
        },
        NativeMethod {
            name: "len",
            arity: 0,
            func: list_len,
        },
        NativeMethod {
            name: "clear",
            arity: 0,
            func: list_clear,
        },
        NativeMethod {
            name: "_iter_",
            arity: 0,
            func: list_iter,
        },
    ],
};

pub static STRING_ITER_CLASS: NativeClass = NativeClass {
    name: "string iterator",
    methods: &[
        NativeMethod {
            name: "_has_next_",
            arity: 0,
            func: iter_has_next,
        },
        NativeMethod {
            name: "_next_",
            arity: 0,
            func: iter_next,
        },
    ],
};

pub static LIST_ITER_CLASS: NativeClass = NativeClass {
    name: "list iterator",
    methods: &[
        NativeMethod {
            name: "_has_next_",
            arity: 0,
            func: iter_has_next,
        },
        NativeMethod {
            name: "_next_",
            arity: 0,
            func: iter_next,
        },
    ],
};

fn method_error(kind: ErrorKind, message: String) -> ExecError {
    ExecError::native(kind, Construct::CallExpression, message)
}

fn invalid_argument(method: &str) -> ExecError {
    method_error(ErrorKind::Value, format!("invalid argument type in '{method}'"))
}

fn invalid_index(method: &str) -> ExecError {
    method_error(ErrorKind::Index, format!("invalid index in '{method}'"))
}

fn list_mut<'h>(interp: &'h mut Interpreter<'_>, r: ObjRef) -> &'h mut Vec<Value> {
    match interp.heap.get_mut(r) {
        Object::List(items) => items,
        other => unreachable!("list method called on {}", other.type_name()),
    }
}

// ── String ────────────────────────────────────────────────────────────

/// `s.substr(begin, len)`: `len` characters starting at character `begin`.
fn string_substr(interp: &mut Interpreter<'_>, r: ObjRef, args: &[Value]) -> ExecResult<Value> {
    let (Value::Int(begin), Value::Int(len)) = (args[0], args[1]) else {
        return Err(invalid_argument("substr"));
    };
    let Object::String(s) = interp.heap.get(r) else {
        unreachable!("string method called on a non-string");
    };
    let count = s.chars().count() as i64;
    if begin < 0 || len < 0 || begin > count || len > count - begin {
        return Err(invalid_index("substr"));
    }
    let sub: String = s.chars().skip(begin as usize).take(len as usize).collect();
    Ok(interp.alloc(Object::String(sub)))
}

fn string_iter(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    Ok(interp.alloc(Object::StringIter { source: r, pos: 0 }))
}

// ── List ──────────────────────────────────────────────────────────────

fn list_put(interp: &mut Interpreter<'_>, r: ObjRef, args: &[Value]) -> ExecResult<Value> {
    list_mut(interp, r).push(args[0]);
    Ok(Value::Null)
}

fn list_pop(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    match list_mut(interp, r).pop() {
        Some(_) => Ok(Value::Null),
        None => Err(method_error(
            ErrorKind::Index,
            "attempt to access an element in an empty container in 'pop'".to_string(),
        )),
    }
}

fn list_pop_at(interp: &mut Interpreter<'_>, r: ObjRef, args: &[Value]) -> ExecResult<Value> {
    let Value::Int(index) = args[0] else {
        return Err(invalid_argument("pop_at"));
    };
    let items = list_mut(interp, r);
    if items.is_empty() {
        return Err(method_error(
            ErrorKind::Index,
            "attempt to access an element in an empty container in 'pop_at'".to_string(),
        ));
    }
    match usize::try_from(index).ok().filter(|&i| i < items.len()) {
        Some(i) => {
            items.remove(i);
            Ok(Value::Null)
        }
        None => Err(invalid_index("pop_at")),
    }
}

/// Remove every element equal to the argument.
fn list_pop_all(interp: &mut Interpreter<'_>, r: ObjRef, args: &[Value]) -> ExecResult<Value> {
    let items = std::mem::take(list_mut(interp, r));
    let kept: Vec<Value> = items
        .into_iter()
        .filter(|&item| !interp.values_equal(item, args[0]))
        .collect();
    *list_mut(interp, r) = kept;
    Ok(Value::Null)
}

fn list_len(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    Ok(Value::Int(list_mut(interp, r).len() as i64))
}

fn list_clear(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    list_mut(interp, r).clear();
    Ok(Value::Null)
}

fn list_iter(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    Ok(interp.alloc(Object::ListIter { source: r, pos: 0 }))
}

// ── Iterators ─────────────────────────────────────────────────────────

/// The element at the cursor and the cursor's next position.
enum Step {
    Char(char, usize),
    Item(Value, usize),
    Done,
}

fn peek_step(interp: &Interpreter<'_>, r: ObjRef) -> Step {
    match interp.heap.get(r) {
        Object::StringIter { source, pos } => {
            let Object::String(s) = interp.heap.get(*source) else {
                unreachable!("string iterator over a non-string");
            };
            match s[*pos..].chars().next() {
                Some(c) => Step::Char(c, pos + c.len_utf8()),
                None => Step::Done,
            }
        }
        Object::ListIter { source, pos } => {
            let Object::List(items) = interp.heap.get(*source) else {
                unreachable!("list iterator over a non-list");
            };
            match items.get(*pos) {
                Some(&item) => Step::Item(item, pos + 1),
                None => Step::Done,
            }
        }
        other => unreachable!("iterator method called on {}", other.type_name()),
    }
}

fn iter_has_next(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    Ok(Value::Bool(!matches!(peek_step(interp, r), Step::Done)))
}

fn iter_next(interp: &mut Interpreter<'_>, r: ObjRef, _: &[Value]) -> ExecResult<Value> {
    let (value, next) = match peek_step(interp, r) {
        Step::Char(c, next) => (interp.alloc(Object::String(c.to_string())), next),
        Step::Item(item, next) => (item, next),
        Step::Done => {
            return Err(method_error(
                ErrorKind::Index,
                "iterator is exhausted in '_next_'".to_string(),
            ));
        }
    };
    if let Object::StringIter { pos, .. } | Object::ListIter { pos, .. } = interp.heap.get_mut(r) {
        *pos = next;
    }
    Ok(value)
}

// ══════════════════════════════════════════════════════════════════════
// Element access
// ══════════════════════════════════════════════════════════════════════

fn subscript_error(kind: ErrorKind, message: impl Into<String>) -> ExecError {
    ExecError::native(kind, Construct::SubscriptExpression, message)
}

fn element_index(index: Value, len: usize) -> ExecResult<usize> {
    let Value::Int(i) = index else {
        return Err(subscript_error(ErrorKind::Index, "index must be an integer"));
    };
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| subscript_error(ErrorKind::Index, "invalid index"))
}

/// `object[index]` for strings (by character) and lists.
pub fn get_item(interp: &mut Interpreter<'_>, object: Value, index: Value) -> ExecResult<Value> {
    let Some(r) = object.as_obj() else {
        return Err(not_indexable(interp, object));
    };
    match interp.heap.get(r) {
        Object::String(s) => {
            let i = element_index(index, s.chars().count())?;
            let c = s.chars().nth(i).unwrap_or_default();
            Ok(interp.alloc(Object::String(c.to_string())))
        }
        Object::List(items) => {
            let i = element_index(index, items.len())?;
            Ok(items[i])
        }
        _ => Err(not_indexable(interp, object)),
    }
}

/// `object[index] = value` for lists.
pub fn set_item(
    interp: &mut Interpreter<'_>,
    object: Value,
    index: Value,
    value: Value,
) -> ExecResult<()> {
    let Some(r) = object.as_obj() else {
        return Err(not_indexable(interp, object));
    };
    match interp.heap.get(r) {
        Object::String(_) => {
            return Err(subscript_error(
                ErrorKind::Type,
                "set operation is not available for type string",
            ));
        }
        Object::List(_) => {}
        _ => return Err(not_indexable(interp, object)),
    }
    let items = list_mut(interp, r);
    let i = element_index(index, items.len())?;
    items[i] = value;
    Ok(())
}

fn not_indexable(interp: &Interpreter<'_>, object: Value) -> ExecError {
    subscript_error(
        ErrorKind::Type,
        format!("'{}' object is not indexable", interp.type_name(object)),
    )
}
