//! Heap objects and their capabilities.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use halo_types::ast::{FunDecl, LambdaDecl, INIT_METHOD};

use crate::class::{NativeClass, LIST_CLASS, LIST_ITER_CLASS, STRING_CLASS, STRING_ITER_CLASS};
use crate::error::ExecResult;
use crate::heap::ObjRef;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Persistent capture state of a lambda, shared with the Capture scope
/// while the lambda runs.
pub type Captures = Rc<RefCell<BTreeMap<String, Value>>>;

/// Signature of a native builtin function.
pub type NativeFnPtr = fn(&mut Interpreter<'_>, &[Value]) -> ExecResult<Value>;

/// A heap-allocated runtime object.
#[derive(Debug)]
pub enum Object {
    String(String),
    List(Vec<Value>),
    /// Cursor over a string; `pos` is a byte offset on a char boundary.
    StringIter { source: ObjRef, pos: usize },
    ListIter { source: ObjRef, pos: usize },
    Instance(Instance),
    Native(NativeFn),
    Function(Function),
    Lambda(Lambda),
    Class(Class),
    BoundMethod { receiver: ObjRef, method: ObjRef },
}

#[derive(Debug)]
pub struct Instance {
    pub class: ObjRef,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFnPtr,
}

/// A user function or method. Functions close over nothing.
#[derive(Debug)]
pub struct Function {
    pub decl: Rc<FunDecl>,
}

#[derive(Debug)]
pub struct Lambda {
    pub decl: Rc<LambdaDecl>,
    pub captures: Captures,
}

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub fields: Vec<String>,
    /// Method name to its `Function` object.
    pub methods: BTreeMap<String, ObjRef>,
    /// Parameter count of `_init_`, or 0 without one.
    pub init_arity: usize,
}

impl Class {
    pub fn init(&self) -> Option<ObjRef> {
        self.methods.get(INIT_METHOD).copied()
    }
}

// ══════════════════════════════════════════════════════════════════════
// Capabilities
// ══════════════════════════════════════════════════════════════════════

/// Reports the values an object keeps alive.
pub trait Trace {
    fn trace(&self, visit: &mut dyn FnMut(Value));
}

/// Something that can be invoked with a checked argument count.
pub trait Callable {
    fn arity(&self) -> usize;

    /// The name used in arity errors.
    fn callee_name(&self) -> &str;
}

impl Trace for Object {
    fn trace(&self, visit: &mut dyn FnMut(Value)) {
        match self {
            Object::String(_) | Object::Native(_) | Object::Function(_) => {}
            Object::List(items) => items.iter().copied().for_each(visit),
            Object::StringIter { source, .. } | Object::ListIter { source, .. } => {
                visit(Value::Obj(*source))
            }
            Object::Instance(instance) => {
                visit(Value::Obj(instance.class));
                instance.fields.values().copied().for_each(visit);
            }
            Object::Lambda(lambda) => lambda.captures.borrow().values().copied().for_each(visit),
            Object::Class(class) => class.methods.values().map(|m| Value::Obj(*m)).for_each(visit),
            Object::BoundMethod { receiver, method } => {
                visit(Value::Obj(*receiver));
                visit(Value::Obj(*method));
            }
        }
    }
}

impl Callable for NativeFn {
    fn arity(&self) -> usize {
        self.arity
    }

    fn callee_name(&self) -> &str {
        self.name
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn callee_name(&self) -> &str {
        &self.decl.name.name
    }
}

impl Callable for Lambda {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn callee_name(&self) -> &str {
        "lambda"
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        self.init_arity
    }

    fn callee_name(&self) -> &str {
        INIT_METHOD
    }
}

impl Object {
    /// The user-facing type name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::String(_) => "string",
            Object::List(_) => "list",
            Object::StringIter { .. } => "string iterator",
            Object::ListIter { .. } => "list iterator",
            Object::Instance(_) => "instance",
            Object::Native(_) => "native fun",
            Object::Function(_) => "fun",
            Object::Lambda(_) => "lambda",
            Object::Class(_) => "class",
            Object::BoundMethod { .. } => "method",
        }
    }

    /// The method table of a builtin type.
    pub fn native_class(&self) -> Option<&'static NativeClass> {
        match self {
            Object::String(_) => Some(&STRING_CLASS),
            Object::List(_) => Some(&LIST_CLASS),
            Object::StringIter { .. } => Some(&STRING_ITER_CLASS),
            Object::ListIter { .. } => Some(&LIST_ITER_CLASS),
            _ => None,
        }
    }

    /// Whether calling this object is meaningful.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Object::Native(_)
                | Object::Function(_)
                | Object::Lambda(_)
                | Object::Class(_)
                | Object::BoundMethod { .. }
        )
    }
}
