//! Core statement and expression evaluator.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use halo_types::ast::*;
use halo_types::stack::ensure_sufficient_stack;
use halo_types::Construct;

use crate::builtins;
use crate::call::CallSite;
use crate::class;
use crate::config::InterpreterConfig;
use crate::env::{Bindings, Environment, ScopeKind};
use crate::error::{ErrorKind, ExecError, ExecResult};
use crate::heap::{Heap, HeapStats, ObjRef};
use crate::object::{Class, Function, Instance, Lambda, Object};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The halo interpreter: environment, object heap and I/O sinks.
///
/// Every intermediate object produced while evaluating a statement is kept
/// on a transient root stack until the statement finishes, so a collection
/// triggered mid-expression (by `gc_collect()` or the allocation threshold)
/// never frees an operand that is still in use.
pub struct Interpreter<'io> {
    pub(crate) heap: Heap,
    pub(crate) env: Environment,
    /// Transient GC roots, truncated at statement boundaries.
    temps: Vec<Value>,
    /// Nesting of user-level calls.
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
    gc_threshold: usize,
    pub(crate) output: Box<dyn Write + 'io>,
    pub(crate) input: Box<dyn BufRead + 'io>,
}

impl Interpreter<'static> {
    /// An interpreter reading stdin and writing stdout.
    pub fn new() -> Self {
        Self::with_io(io::stdin().lock(), io::stdout())
    }
}

impl Default for Interpreter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'io> Interpreter<'io> {
    pub fn with_io(input: impl BufRead + 'io, output: impl Write + 'io) -> Self {
        Self::with_config(InterpreterConfig::default(), input, output)
    }

    pub fn with_config(
        config: InterpreterConfig,
        input: impl BufRead + 'io,
        output: impl Write + 'io,
    ) -> Self {
        let mut interp = Self {
            heap: Heap::new(),
            env: Environment::new(),
            temps: Vec::new(),
            depth: 0,
            max_depth: config.max_recursion_depth,
            gc_threshold: config.gc_threshold,
            output: Box::new(output),
            input: Box::new(input),
        };
        builtins::install(&mut interp);
        interp
    }

    /// Run a sequence of statements at global scope.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn execute(&mut self, stmts: &[Stmt]) -> ExecResult<()> {
        let result = self.exec_block(stmts);
        self.temps.clear();
        self.flush()?;
        result.map(|_| ())
    }

    /// Evaluate a single expression at global scope.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, expr: &Expr) -> ExecResult<Value> {
        let result = self.eval_expr(expr);
        self.temps.clear();
        self.flush()?;
        result
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    pub fn max_recursion_depth(&self) -> usize {
        self.max_depth
    }

    /// Run a collection now. Returns the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut roots = self.env.values();
        roots.extend_from_slice(&self.temps);
        self.heap.collect(roots)
    }

    /// Read one raw line from the input sink, terminator included.
    ///
    /// A REPL reads its lines through here so that it and `readln()` share
    /// one input stream.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.flush().map_err(|e| io::Error::other(e.to_string()))?;
        self.input.read_line(buf)
    }

    /// Look up a global name, e.g. to inspect state after a run.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Heap & scopes
    // ══════════════════════════════════════════════════════════════════════

    /// Allocate an object, rooting it until the current statement ends.
    pub(crate) fn alloc(&mut self, object: Object) -> Value {
        let value = Value::Obj(self.heap.alloc(object));
        self.temps.push(value);
        value
    }

    pub(crate) fn root(&mut self, value: Value) -> Value {
        if let Value::Obj(_) = value {
            self.temps.push(value);
        }
        value
    }

    fn maybe_collect(&mut self) {
        if self.gc_threshold > 0 && self.heap.pending() >= self.gc_threshold {
            self.collect_garbage();
        }
    }

    /// Run `f` inside a fresh scope, popping it on every exit path.
    pub(crate) fn in_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Self) -> ExecResult<T>,
    ) -> ExecResult<T> {
        self.env.push(kind);
        let result = f(self);
        self.env.pop();
        result
    }

    /// Like [`in_scope`](Self::in_scope), but the scope's bindings are shared.
    pub(crate) fn in_shared_scope<T>(
        &mut self,
        kind: ScopeKind,
        bindings: Bindings,
        f: impl FnOnce(&mut Self) -> ExecResult<T>,
    ) -> ExecResult<T> {
        self.env.push_shared(kind, bindings);
        let result = f(self);
        self.env.pop();
        result
    }

    /// Run `f` with `r` pinned, unpinning it on every exit path.
    fn with_pinned<T>(&mut self, r: ObjRef, f: impl FnOnce(&mut Self) -> ExecResult<T>) -> ExecResult<T> {
        self.heap.pin(r);
        let result = f(self);
        self.heap.unpin(r);
        result
    }

    pub(crate) fn define(&mut self, name: &str, value: Value, line: u32, construct: Construct) -> ExecResult<()> {
        if self.env.define(name, value) {
            Ok(())
        } else {
            Err(ExecError::new(
                ErrorKind::Name,
                line,
                construct,
                format!("name '{name}' is defined already"),
            ))
        }
    }

    pub(crate) fn flush(&mut self) -> ExecResult<()> {
        self.output.flush().map_err(io_error)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn exec_block(&mut self, stmts: &[Stmt]) -> ExecResult<ControlFlow> {
        for stmt in stmts {
            let flow = self.exec_stmt(stmt)?;
            if flow != ControlFlow::Normal {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> ExecResult<ControlFlow> {
        self.maybe_collect();
        let mark = self.temps.len();
        let flow = ensure_sufficient_stack(|| self.exec_stmt_kind(stmt));
        self.temps.truncate(mark);
        flow
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> ExecResult<ControlFlow> {
        let line = stmt.line();
        match &stmt.kind {
            StmtKind::Var { name, init } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.define(&name.name, value, line, Construct::VarStatement)?;
            }
            StmtKind::Assign { target, op, value } => self.exec_assign(target, *op, value, line)?,
            StmtKind::Expression(expr) => {
                self.eval_expr(expr)?;
            }
            StmtKind::If(if_stmt) => return self.exec_if(if_stmt),
            StmtKind::While { cond, body } => return self.exec_while(cond, body),
            StmtKind::For(for_stmt) => return self.exec_for(for_stmt, line),
            StmtKind::Break => return Ok(ControlFlow::Break),
            StmtKind::Continue => return Ok(ControlFlow::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                return Ok(ControlFlow::Return(value));
            }
            StmtKind::Fun(decl) => {
                let fun = self.alloc(Object::Function(Function { decl: decl.clone() }));
                self.define(&decl.name.name, fun, line, Construct::FunStatement)?;
            }
            StmtKind::Class(decl) => self.exec_class(decl, line)?,
        }
        Ok(ControlFlow::Normal)
    }

    // ── Assignment ───────────────────────────────────────────────────────

    fn exec_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr, line: u32) -> ExecResult<()> {
        let construct = Construct::AssignmentStatement;
        match &target.kind {
            ExprKind::Var(name) => {
                let not_defined = || {
                    ExecError::new(
                        ErrorKind::Name,
                        line,
                        construct,
                        format!("name '{name}' is not defined"),
                    )
                };
                let new = self.assigned_value(op, value, line, |i| {
                    i.env.get(name).ok_or_else(&not_defined)
                })?;
                if !self.env.assign(name, new) {
                    return Err(not_defined());
                }
                Ok(())
            }
            ExprKind::Dot { object, name } => {
                let object = self.eval_expr(object)?;
                let r = self.field_owner(object, &name.name, line, construct)?;
                let new = self.with_pinned(r, |i| {
                    i.assigned_value(op, value, line, |i| i.get_member(object, &name.name, line))
                })?;
                if let Object::Instance(instance) = self.heap.get_mut(r) {
                    instance.fields.insert(name.name.clone(), new);
                }
                Ok(())
            }
            ExprKind::Subscript { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                let compute = |i: &mut Self| {
                    i.assigned_value(op, value, line, |i| {
                        class::get_item(i, object, index).map_err(|e| e.or_line(line))
                    })
                };
                let new = match object.as_obj() {
                    Some(r) => self.with_pinned(r, compute)?,
                    None => compute(self)?,
                };
                class::set_item(self, object, index, new).map_err(|e| e.or_line(line))
            }
            _ => Err(ExecError::new(
                ErrorKind::Type,
                line,
                construct,
                "invalid assignment target",
            )),
        }
    }

    /// The value to store: `value` itself for `=`, or `current op value` for
    /// compound operators. `current` is read before `value` is evaluated.
    fn assigned_value(
        &mut self,
        op: AssignOp,
        value: &Expr,
        line: u32,
        current: impl FnOnce(&mut Self) -> ExecResult<Value>,
    ) -> ExecResult<Value> {
        match op.binary() {
            None => self.eval_expr(value),
            Some(bin) => {
                let current = current(self)?;
                let current = self.root(current);
                let rhs = self.eval_expr(value)?;
                self.binary_op(bin, current, rhs, line, Construct::AssignmentStatement)
            }
        }
    }

    // ── Control Flow ─────────────────────────────────────────────────────

    fn exec_if(&mut self, stmt: &IfStmt) -> ExecResult<ControlFlow> {
        for branch in &stmt.branches {
            let cond = self.eval_expr(&branch.cond)?;
            if self.truthy(cond) {
                return self.in_scope(ScopeKind::If, |i| i.exec_block(&branch.body));
            }
        }
        match &stmt.else_body {
            Some(body) => self.in_scope(ScopeKind::If, |i| i.exec_block(body)),
            None => Ok(ControlFlow::Normal),
        }
    }

    fn exec_while(&mut self, cond: &Expr, body: &[Stmt]) -> ExecResult<ControlFlow> {
        let mark = self.temps.len();
        loop {
            self.temps.truncate(mark);
            let value = self.eval_expr(cond)?;
            if !self.truthy(value) {
                break;
            }
            match self.in_scope(ScopeKind::While, |i| i.exec_block(body))? {
                ControlFlow::Break => break,
                ControlFlow::Normal | ControlFlow::Continue => {}
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_for(&mut self, stmt: &ForStmt, line: u32) -> ExecResult<ControlFlow> {
        match &stmt.source {
            ForSource::Range { begin, end, step } => {
                let begin = self.range_bound(begin, line)?;
                let end = self.range_bound(end, line)?;
                let step = match step {
                    Some(step) => self.range_bound(step, line)?,
                    None => 1,
                };
                if step == 0 {
                    return Err(ExecError::new(
                        ErrorKind::Value,
                        line,
                        Construct::ForStatement,
                        "range step must not be zero",
                    ));
                }
                self.exec_range(stmt, begin, end, step, line)
            }
            ForSource::Iterable(expr) => {
                let iterable = self.eval_expr(expr)?;
                let iterator = self.iterator_of(iterable, line)?;
                match iterator.as_obj() {
                    Some(r) => self.with_pinned(r, |i| i.exec_for_each(stmt, iterator, line)),
                    None => self.exec_for_each(stmt, iterator, line),
                }
            }
        }
    }

    fn range_bound(&mut self, expr: &Expr, line: u32) -> ExecResult<i64> {
        match self.eval_expr(expr)? {
            Value::Int(n) => Ok(n),
            _ => Err(ExecError::new(
                ErrorKind::Type,
                line,
                Construct::ForStatement,
                "range bounds must be integers",
            )),
        }
    }

    /// `for i in (begin, end, step)`: `end` is exclusive. The loop variable is
    /// reassigned from an internal counter each iteration, so the body
    /// changing it does not affect the iteration count.
    fn exec_range(
        &mut self,
        stmt: &ForStmt,
        begin: i64,
        end: i64,
        step: i64,
        line: u32,
    ) -> ExecResult<ControlFlow> {
        let var = stmt.var.name.as_str();
        self.in_scope(ScopeKind::ForHeader, |i| {
            i.define(var, Value::Int(begin), line, Construct::ForStatement)?;
            let mark = i.temps.len();
            let mut counter = begin;
            while (step > 0 && counter < end) || (step < 0 && counter > end) {
                i.temps.truncate(mark);
                i.env.assign(var, Value::Int(counter));
                match i.in_scope(ScopeKind::For, |i| i.exec_block(&stmt.body))? {
                    ControlFlow::Break => break,
                    ControlFlow::Normal | ControlFlow::Continue => {}
                    flow @ ControlFlow::Return(_) => return Ok(flow),
                }
                match counter.checked_add(step) {
                    Some(next) => counter = next,
                    None => break,
                }
            }
            Ok(ControlFlow::Normal)
        })
    }

    fn exec_for_each(&mut self, stmt: &ForStmt, iterator: Value, line: u32) -> ExecResult<ControlFlow> {
        let var = stmt.var.name.as_str();
        let site = CallSite::internal(line, "_next_");
        self.in_scope(ScopeKind::ForHeader, |i| {
            i.define(var, Value::Null, line, Construct::ForStatement)?;
            let mark = i.temps.len();
            loop {
                i.temps.truncate(mark);
                let has_next = i.call_method(iterator, "_has_next_", Vec::new(), site)?;
                if !i.truthy(has_next) {
                    break;
                }
                let item = i.call_method(iterator, "_next_", Vec::new(), site)?;
                i.env.assign(var, item);
                match i.in_scope(ScopeKind::For, |i| i.exec_block(&stmt.body))? {
                    ControlFlow::Break => break,
                    ControlFlow::Normal | ControlFlow::Continue => {}
                    flow @ ControlFlow::Return(_) => return Ok(flow),
                }
            }
            Ok(ControlFlow::Normal)
        })
    }

    /// Ask `iterable` for an iterator through its `_iter_` method.
    fn iterator_of(&mut self, iterable: Value, line: u32) -> ExecResult<Value> {
        if !self.has_method(iterable, "_iter_") {
            return Err(ExecError::new(
                ErrorKind::Type,
                line,
                Construct::ForStatement,
                format!("'{}' object is not iterable", self.type_name(iterable)),
            ));
        }
        let iterator = self.call_method(iterable, "_iter_", Vec::new(), CallSite::internal(line, "_iter_"))?;
        Ok(self.root(iterator))
    }

    // ── Declarations ─────────────────────────────────────────────────────

    /// Build a class object. Methods are allocated into a Class scope that
    /// keeps them rooted until the class owns them.
    fn exec_class(&mut self, decl: &ClassDecl, line: u32) -> ExecResult<()> {
        let methods = self.in_scope(ScopeKind::Class, |i| {
            let mut methods = BTreeMap::new();
            for method in &decl.methods {
                let fun = i.alloc(Object::Function(Function { decl: method.clone() }));
                i.define(&method.name.name, fun, method.span.line(), Construct::ClassStatement)?;
                if let Value::Obj(r) = fun {
                    methods.insert(method.name.name.clone(), r);
                }
            }
            Ok(methods)
        })?;

        let init_arity = decl
            .methods
            .iter()
            .find(|m| m.name.name == INIT_METHOD)
            .map_or(0, |m| m.params.len());
        let class = self.alloc(Object::Class(Class {
            name: decl.name.name.clone(),
            fields: decl.fields.iter().map(|f| f.name.clone()).collect(),
            methods,
            init_arity,
        }));
        self.define(&decl.name.name, class, line, Construct::ClassStatement)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression. Object results stay rooted until the
    /// enclosing statement finishes.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> ExecResult<Value> {
        let value = ensure_sufficient_stack(|| self.eval_expr_kind(expr))?;
        Ok(self.root(value))
    }

    fn eval_expr_kind(&mut self, expr: &Expr) -> ExecResult<Value> {
        let line = expr.line();
        match &expr.kind {
            ExprKind::Grouping(inner) => self.eval_expr(inner),
            ExprKind::Binary { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                self.binary_op(*op, left, right, line, Construct::BinaryExpression)
            }
            ExprKind::Logical { left, op, right } => {
                let left = self.eval_expr(left)?;
                match (op, self.truthy(left)) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval_expr(right),
                }
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                self.unary_op(*op, operand, line)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, line),
            ExprKind::Dot { object, name } => {
                let object = self.eval_expr(object)?;
                self.get_member(object, &name.name, line)
            }
            ExprKind::Subscript { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                class::get_item(self, object, index).map_err(|e| e.or_line(line))
            }
            ExprKind::Literal(literal) => Ok(match &literal.value {
                LiteralValue::Int(n) => Value::Int(*n),
                LiteralValue::Float(x) => Value::Float(*x),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Null => Value::Null,
                LiteralValue::Str(s) => self.alloc(Object::String(s.clone())),
            }),
            ExprKind::Var(name) => self.env.get(name).ok_or_else(|| {
                ExecError::new(
                    ErrorKind::Name,
                    line,
                    Construct::Variable,
                    format!("name '{name}' is not found"),
                )
            }),
            ExprKind::Lambda(decl) => {
                let mut captures = BTreeMap::new();
                for capture in &decl.captures {
                    let value = self.env.get(&capture.name).ok_or_else(|| {
                        ExecError::new(
                            ErrorKind::Name,
                            line,
                            Construct::LambdaExpression,
                            format!("name '{}' is not found", capture.name),
                        )
                    })?;
                    captures.insert(capture.name.clone(), value);
                }
                Ok(self.alloc(Object::Lambda(Lambda {
                    decl: decl.clone(),
                    captures: Bindings::new(captures.into()),
                })))
            }
            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(self.alloc(Object::List(values)))
            }
        }
    }

    // ── Members ──────────────────────────────────────────────────────────

    /// The instance owning field `name`, or an `undefined field` error.
    fn field_owner(&self, object: Value, name: &str, line: u32, construct: Construct) -> ExecResult<ObjRef> {
        if let Some(r) = object.as_obj() {
            if let Object::Instance(instance) = self.heap.get(r) {
                if instance.fields.contains_key(name) {
                    return Ok(r);
                }
            }
        }
        Err(undefined_field(name, line, construct))
    }

    /// `object.name` outside a call: a field value, or a method bound to
    /// its receiver.
    fn get_member(&mut self, object: Value, name: &str, line: u32) -> ExecResult<Value> {
        if let Some(r) = object.as_obj() {
            if let Object::Instance(Instance { class, fields }) = self.heap.get(r) {
                if let Some(&value) = fields.get(name) {
                    return Ok(value);
                }
                if let Object::Class(class) = self.heap.get(*class) {
                    if let Some(&method) = class.methods.get(name) {
                        return Ok(self.alloc(Object::BoundMethod { receiver: r, method }));
                    }
                }
            }
        }
        Err(undefined_field(name, line, Construct::DotExpression))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Value helpers
    // ══════════════════════════════════════════════════════════════════════

    /// Falsy values are `0`, `0.0`, `""`, `false`, `null` and the empty list.
    pub fn truthy(&self, value: Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Int(n) => n != 0,
            Value::Float(x) => x != 0.0,
            Value::Obj(r) => match self.heap.get(r) {
                Object::String(s) => !s.is_empty(),
                Object::List(items) => !items.is_empty(),
                _ => true,
            },
        }
    }

    pub fn type_name(&self, value: Value) -> &'static str {
        match value {
            Value::Obj(r) => self.heap.get(r).type_name(),
            scalar => scalar.scalar_type_name().unwrap_or("object"),
        }
    }

    /// Value equality: structural for scalars, strings and lists, identity
    /// for everything else. `Int` never equals `Float`.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        self.equal_in(a, b, &mut Vec::new())
    }

    /// `active` holds the list pairs being compared further up. Meeting a
    /// pair again means both sides cycle in step, which counts as equal.
    fn equal_in(&self, a: Value, b: Value, active: &mut Vec<(ObjRef, ObjRef)>) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Obj(x), Value::Obj(y)) if x == y => true,
            (Value::Obj(x), Value::Obj(y)) => match (self.heap.get(x), self.heap.get(y)) {
                (Object::String(s), Object::String(t)) => s == t,
                (Object::List(l), Object::List(m)) => {
                    if l.len() != m.len() {
                        return false;
                    }
                    if active.contains(&(x, y)) {
                        return true;
                    }
                    active.push((x, y));
                    let equal = l.iter().zip(m).all(|(&p, &q)| {
                        ensure_sufficient_stack(|| self.equal_in(p, q, active))
                    });
                    active.pop();
                    equal
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Render a value the way `println` shows it.
    pub fn to_str(&self, value: Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, &mut Vec::new());
        out
    }

    /// `active` holds the lists and instances being rendered further up, so
    /// a cycle prints as `[...]` instead of recursing forever.
    fn write_value(&self, out: &mut String, value: Value, active: &mut Vec<ObjRef>) {
        let r = match value {
            Value::Null => return out.push_str("null"),
            Value::Int(n) => return out.push_str(&n.to_string()),
            Value::Float(x) => return out.push_str(&format_float(x)),
            Value::Bool(b) => return out.push_str(if b { "true" } else { "false" }),
            Value::Obj(r) => r,
        };
        match self.heap.get(r) {
            Object::String(s) => out.push_str(s),
            Object::List(items) => {
                if active.contains(&r) {
                    return out.push_str("[...]");
                }
                active.push(r);
                out.push('[');
                for (i, &item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    ensure_sufficient_stack(|| self.write_value(out, item, active));
                }
                out.push(']');
                active.pop();
            }
            Object::Instance(instance) => {
                out.push_str(self.class_name(instance.class));
                if active.contains(&r) {
                    return out.push_str("[...]");
                }
                active.push(r);
                out.push('[');
                for (i, (name, &field)) in instance.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push('=');
                    ensure_sufficient_stack(|| self.write_value(out, field, active));
                }
                out.push(']');
                active.pop();
            }
            Object::Class(class) => {
                out.push_str(&format!("<class {}>:", class.name));
                for name in class.methods.keys() {
                    out.push('\n');
                    out.push_str(name);
                }
            }
            Object::Function(fun) => out.push_str(&format!("<fun {}>", fun.decl.name.name)),
            Object::Lambda(_) => out.push_str("<lambda>"),
            Object::Native(native) => out.push_str(&format!("<native fun {}>", native.name)),
            Object::BoundMethod { receiver, method } => {
                let class = match self.heap.get(*receiver) {
                    Object::Instance(instance) => self.class_name(instance.class),
                    other => other.type_name(),
                };
                let method = match self.heap.get(*method) {
                    Object::Function(fun) => fun.decl.name.name.as_str(),
                    other => other.type_name(),
                };
                out.push_str(&format!("<method {class}.{method}>"));
            }
            Object::StringIter { .. } => out.push_str("<string iterator>"),
            Object::ListIter { .. } => out.push_str("<list iterator>"),
        }
    }

    fn class_name(&self, class: ObjRef) -> &str {
        match self.heap.get(class) {
            Object::Class(class) => &class.name,
            other => other.type_name(),
        }
    }
}

/// Six fixed decimals; non-finite values print as `nan`, `inf` and `-inf`.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x == f64::INFINITY {
        "inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{x:.6}")
    }
}

fn undefined_field(name: &str, line: u32, construct: Construct) -> ExecError {
    ExecError::new(
        ErrorKind::Attribute,
        line,
        construct,
        format!("undefined field '{name}'"),
    )
}

pub(crate) fn io_error(err: io::Error) -> ExecError {
    ExecError::native(
        ErrorKind::Io,
        Construct::NativeFun,
        format!("i/o error: {err}"),
    )
}
