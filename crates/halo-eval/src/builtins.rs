//! Native builtin functions bound in the Global scope.
//!
//! Builtin errors carry no source line and render under `<native fun>`.

use std::io::{BufRead, Write};

use halo_types::Construct;
use tracing::debug;

use crate::error::{ErrorKind, ExecError, ExecResult};
use crate::interpreter::{io_error, Interpreter};
use crate::object::{NativeFn, Object};
use crate::value::Value;

const BUILTINS: &[NativeFn] = &[
    NativeFn {
        name: "println",
        arity: 1,
        func: println,
    },
    NativeFn {
        name: "print",
        arity: 1,
        func: print,
    },
    NativeFn {
        name: "readln",
        arity: 0,
        func: readln,
    },
    NativeFn {
        name: "to_int",
        arity: 1,
        func: to_int,
    },
    NativeFn {
        name: "to_float",
        arity: 1,
        func: to_float,
    },
    NativeFn {
        name: "to_str",
        arity: 1,
        func: to_str,
    },
    NativeFn {
        name: "get_recursion_depth",
        arity: 0,
        func: get_recursion_depth,
    },
    NativeFn {
        name: "set_recursion_depth",
        arity: 1,
        func: set_recursion_depth,
    },
    NativeFn {
        name: "print_gc_info",
        arity: 0,
        func: print_gc_info,
    },
    NativeFn {
        name: "gc_collect",
        arity: 0,
        func: gc_collect,
    },
];

/// Bind every builtin in the Global scope.
pub(crate) fn install(interp: &mut Interpreter<'_>) {
    for native in BUILTINS {
        let r = interp.heap.alloc(Object::Native(*native));
        interp.env.define(native.name, Value::Obj(r));
    }
}

fn native_error(kind: ErrorKind, message: String) -> ExecError {
    ExecError::native(kind, Construct::NativeFun, message)
}

fn invalid_argument(name: &str) -> ExecError {
    native_error(ErrorKind::Value, format!("invalid argument type in '{name}'"))
}

fn invalid_value(name: &str) -> ExecError {
    native_error(ErrorKind::Value, format!("invalid argument value in '{name}'"))
}

/// The contents of a string value.
fn string_arg(interp: &Interpreter<'_>, value: Value) -> Option<String> {
    match interp.heap.get(value.as_obj()?) {
        Object::String(s) => Some(s.clone()),
        _ => None,
    }
}

// ── Console ───────────────────────────────────────────────────────────

fn println(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    let text = interp.to_str(args[0]);
    writeln!(interp.output, "{text}").map_err(io_error)?;
    Ok(Value::Null)
}

fn print(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    let text = interp.to_str(args[0]);
    write!(interp.output, "{text}").map_err(io_error)?;
    Ok(Value::Null)
}

/// One line of input without its line terminator; `""` at end of input.
fn readln(interp: &mut Interpreter<'_>, _: &[Value]) -> ExecResult<Value> {
    interp.flush()?;
    let mut line = String::new();
    interp.input.read_line(&mut line).map_err(io_error)?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(interp.alloc(Object::String(line)))
}

// ── Conversions ───────────────────────────────────────────────────────

fn to_int(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        value => {
            let text = string_arg(interp, value).ok_or_else(|| invalid_argument("to_int"))?;
            text.trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| invalid_value("to_int"))
        }
    }
}

fn to_float(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Float(x) => Ok(Value::Float(x)),
        value => {
            let text = string_arg(interp, value).ok_or_else(|| invalid_argument("to_float"))?;
            text.trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| invalid_value("to_float"))
        }
    }
}

fn to_str(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    let text = interp.to_str(args[0]);
    Ok(interp.alloc(Object::String(text)))
}

// ── Runtime ───────────────────────────────────────────────────────────

fn get_recursion_depth(interp: &mut Interpreter<'_>, _: &[Value]) -> ExecResult<Value> {
    Ok(Value::Int(interp.max_depth as i64))
}

fn set_recursion_depth(interp: &mut Interpreter<'_>, args: &[Value]) -> ExecResult<Value> {
    let Value::Int(depth) = args[0] else {
        return Err(invalid_argument("set_recursion_depth"));
    };
    if depth <= 0 {
        return Err(native_error(
            ErrorKind::Value,
            "invalid depth value in 'set_recursion_depth'".to_string(),
        ));
    }
    interp.max_depth = usize::try_from(depth).unwrap_or(usize::MAX);
    debug!(depth = interp.max_depth, "recursion ceiling changed");
    Ok(Value::Null)
}

fn print_gc_info(interp: &mut Interpreter<'_>, _: &[Value]) -> ExecResult<Value> {
    let stats = interp.heap_stats();
    writeln!(
        interp.output,
        "gc: {} live, {} collections, {} freed, {} allocated",
        stats.live, stats.collections, stats.freed_total, stats.allocated_total
    )
    .map_err(io_error)?;
    Ok(Value::Null)
}

fn gc_collect(interp: &mut Interpreter<'_>, _: &[Value]) -> ExecResult<Value> {
    interp.collect_garbage();
    Ok(Value::Null)
}
