//! Calls: functions, lambdas, constructors, methods and natives.

use std::rc::Rc;

use halo_types::ast::{Expr, ExprKind, FunDecl, RECEIVER};
use halo_types::printer::render;
use halo_types::stack::ensure_sufficient_stack;
use halo_types::Construct;
use tracing::trace;

use crate::env::ScopeKind;
use crate::error::{ErrorKind, ExecError, ExecResult};
use crate::heap::ObjRef;
use crate::interpreter::{ControlFlow, Interpreter};
use crate::object::{Callable, Captures, Instance, Object};
use crate::value::Value;

/// Where a call happens, for error lines and trace frames.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSite<'a> {
    pub line: u32,
    /// The callee as written, when the call comes from source.
    callee: Option<&'a Expr>,
    /// Fallback description for calls made by the interpreter itself.
    name: &'a str,
}

impl<'a> CallSite<'a> {
    fn source(line: u32, callee: &'a Expr) -> Self {
        Self {
            line,
            callee: Some(callee),
            name: "",
        }
    }

    /// A call the interpreter makes on its own, e.g. `_next_` in a for loop.
    pub(crate) fn internal(line: u32, name: &'a str) -> Self {
        Self {
            line,
            callee: None,
            name,
        }
    }

    fn describe(&self) -> String {
        match self.callee {
            Some(expr) => render(expr),
            None => self.name.to_string(),
        }
    }
}

/// What a callable value resolved to, detached from the heap borrow.
enum Target {
    Native(crate::object::NativeFn),
    Function(Rc<FunDecl>, Option<ObjRef>),
    Lambda(Rc<halo_types::ast::LambdaDecl>, Captures),
    Class(ObjRef),
}

impl Interpreter<'_> {
    /// Evaluate `callee(args)`.
    pub(crate) fn eval_call(&mut self, callee: &Expr, args: &[Expr], line: u32) -> ExecResult<Value> {
        let site = CallSite::source(line, callee);

        if let ExprKind::Dot { object, name } = &callee.kind {
            let receiver = self.eval_expr(object)?;
            let args = self.eval_args(args)?;
            return self.call_method(receiver, &name.name, args, site);
        }

        let function = match &callee.kind {
            ExprKind::Var(name) => self.env.get(name).ok_or_else(|| {
                ExecError::new(
                    ErrorKind::Name,
                    line,
                    Construct::CallExpression,
                    format!("'{name}' is not defined"),
                )
            })?,
            _ => self.eval_expr(callee)?,
        };
        let function = self.root(function);
        if !self.is_callable(function) {
            return Err(not_callable(site));
        }
        let args = self.eval_args(args)?;
        self.call_value(function, args, site)
    }

    fn eval_args(&mut self, args: &[Expr]) -> ExecResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    pub(crate) fn is_callable(&self, value: Value) -> bool {
        value.as_obj().is_some_and(|r| self.heap.get(r).is_callable())
    }

    /// Invoke a callable value with already-evaluated arguments.
    pub(crate) fn call_value(&mut self, function: Value, args: Vec<Value>, site: CallSite<'_>) -> ExecResult<Value> {
        let Some(r) = function.as_obj() else {
            return Err(not_callable(site));
        };
        let target = match self.heap.get(r) {
            Object::Native(native) => {
                check_arity(native, args.len(), site)?;
                Target::Native(*native)
            }
            Object::Function(fun) => {
                check_arity(fun, args.len(), site)?;
                Target::Function(fun.decl.clone(), None)
            }
            Object::Lambda(lambda) => {
                check_arity(lambda, args.len(), site)?;
                Target::Lambda(lambda.decl.clone(), lambda.captures.clone())
            }
            Object::Class(class) => {
                check_arity(class, args.len(), site)?;
                Target::Class(r)
            }
            Object::BoundMethod { receiver, method } => {
                let Object::Function(fun) = self.heap.get(*method) else {
                    return Err(not_callable(site));
                };
                check_arity(fun, args.len(), site)?;
                Target::Function(fun.decl.clone(), Some(*receiver))
            }
            _ => return Err(not_callable(site)),
        };

        match target {
            Target::Native(native) => (native.func)(self, &args),
            Target::Function(decl, receiver) => self.call_function(decl, receiver, args, site),
            Target::Lambda(decl, captures) => self.call_lambda(decl, captures, args, site),
            Target::Class(class) => self.construct(class, args, site),
        }
    }

    /// `receiver.name(args)`. An instance field holding a callable wins over
    /// a class method of the same name; builtin types use their method table.
    pub(crate) fn call_method(
        &mut self,
        receiver: Value,
        name: &str,
        args: Vec<Value>,
        site: CallSite<'_>,
    ) -> ExecResult<Value> {
        let undefined = || {
            ExecError::new(
                ErrorKind::Attribute,
                site.line,
                Construct::CallExpression,
                format!("undefined method '{name}'"),
            )
        };
        let Some(r) = receiver.as_obj() else {
            return Err(undefined());
        };

        match self.heap.get(r) {
            Object::Instance(Instance { class, fields }) => {
                if let Some(&field) = fields.get(name) {
                    if !self.is_callable(field) {
                        return Err(not_callable(site));
                    }
                    return self.call_value(field, args, site);
                }
                let method = match self.heap.get(*class) {
                    Object::Class(class) => class.methods.get(name).copied(),
                    _ => None,
                };
                let Some(method) = method else {
                    return Err(undefined());
                };
                let Object::Function(fun) = self.heap.get(method) else {
                    return Err(undefined());
                };
                check_arity(fun, args.len(), site)?;
                let decl = fun.decl.clone();
                self.call_function(decl, Some(r), args, site)
            }
            object => {
                let Some(method) = object.native_class().and_then(|c| c.method(name)) else {
                    return Err(undefined());
                };
                if args.len() != method.arity {
                    return Err(ExecError::new(
                        ErrorKind::Arity,
                        site.line,
                        Construct::CallExpression,
                        format!("invalid number of arguments in '{}'", method.name),
                    ));
                }
                (method.func)(self, r, &args).map_err(|e| e.or_line(site.line))
            }
        }
    }

    /// Whether `receiver.name(...)` would find a method.
    pub(crate) fn has_method(&self, receiver: Value, name: &str) -> bool {
        let Some(r) = receiver.as_obj() else {
            return false;
        };
        match self.heap.get(r) {
            Object::Instance(instance) => match self.heap.get(instance.class) {
                Object::Class(class) => class.methods.contains_key(name),
                _ => false,
            },
            object => object
                .native_class()
                .is_some_and(|c| c.method(name).is_some()),
        }
    }

    // ── User Callables ───────────────────────────────────────────────────

    fn enter_call(&mut self, callee: &str, site: CallSite<'_>) -> ExecResult<()> {
        if self.depth >= self.max_depth {
            return Err(ExecError::new(
                ErrorKind::Recursion,
                site.line,
                Construct::Callable,
                format!("max function depth exceeded '{}'", self.max_depth),
            ));
        }
        self.depth += 1;
        trace!(callee, depth = self.depth, "call");
        Ok(())
    }

    /// Run a call body one level deeper, turning its `return` into a value.
    /// Errors leaving the body get a trace frame for this call site.
    fn run_body(
        &mut self,
        callee: &str,
        site: CallSite<'_>,
        body: impl FnOnce(&mut Self) -> ExecResult<ControlFlow>,
    ) -> ExecResult<Value> {
        self.enter_call(callee, site)?;
        let result = ensure_sufficient_stack(|| body(self));
        self.depth -= 1;
        match result {
            Ok(ControlFlow::Return(value)) => Ok(value),
            Ok(_) => Ok(Value::Null),
            Err(err) => Err(err.push_frame(site.line, site.describe())),
        }
    }

    /// Call a function, or a method when `receiver` is set. `_init_` runs in
    /// an Init frame.
    fn call_function(
        &mut self,
        decl: Rc<FunDecl>,
        receiver: Option<ObjRef>,
        args: Vec<Value>,
        site: CallSite<'_>,
    ) -> ExecResult<Value> {
        let kind = match receiver {
            Some(_) if decl.is_init() => ScopeKind::Init,
            _ => ScopeKind::Fun,
        };
        self.run_body(&decl.name.name, site, |i| {
            i.in_scope(kind, |i| {
                let line = decl.span.line();
                if let Some(r) = receiver {
                    i.define(RECEIVER, Value::Obj(r), line, Construct::FunStatement)?;
                }
                for (param, arg) in decl.params.iter().zip(args) {
                    i.define(&param.name, arg, line, Construct::FunStatement)?;
                }
                i.exec_block(&decl.body)
            })
        })
    }

    /// Lambda parameters live in a Lambda scope on top of a Capture scope
    /// that shares the lambda's capture state, so assignments to captured
    /// names persist into the next call.
    fn call_lambda(
        &mut self,
        decl: Rc<halo_types::ast::LambdaDecl>,
        captures: Captures,
        args: Vec<Value>,
        site: CallSite<'_>,
    ) -> ExecResult<Value> {
        self.run_body("lambda", site, |i| {
            i.in_shared_scope(ScopeKind::Capture, captures, |i| {
                i.in_scope(ScopeKind::Lambda, |i| {
                    let line = decl.span.line();
                    for (param, arg) in decl.params.iter().zip(args) {
                        i.define(&param.name, arg, line, Construct::LambdaExpression)?;
                    }
                    i.exec_block(&decl.body)
                })
            })
        })
    }

    /// Create an instance with every declared field set to null and run
    /// `_init_` on it, if the class has one.
    fn construct(&mut self, class: ObjRef, args: Vec<Value>, site: CallSite<'_>) -> ExecResult<Value> {
        let Object::Class(class_obj) = self.heap.get(class) else {
            return Err(not_callable(site));
        };
        let fields = class_obj
            .fields
            .iter()
            .map(|f| (f.clone(), Value::Null))
            .collect();
        let init = class_obj.init().and_then(|r| match self.heap.get(r) {
            Object::Function(fun) => Some(fun.decl.clone()),
            _ => None,
        });

        let instance = self.alloc(Object::Instance(Instance { class, fields }));
        if let (Some(decl), Value::Obj(r)) = (init, instance) {
            self.call_function(decl, Some(r), args, site)?;
        }
        Ok(instance)
    }
}

fn check_arity(callable: &dyn Callable, given: usize, site: CallSite<'_>) -> ExecResult<()> {
    if callable.arity() == given {
        Ok(())
    } else {
        Err(ExecError::new(
            ErrorKind::Arity,
            site.line,
            Construct::CallExpression,
            format!("incorrect number of arguments for '{}'", callable.callee_name()),
        ))
    }
}

fn not_callable(site: CallSite<'_>) -> ExecError {
    ExecError::new(
        ErrorKind::Type,
        site.line,
        Construct::CallExpression,
        format!("'{}' is not a function or lambda", site.describe()),
    )
}
