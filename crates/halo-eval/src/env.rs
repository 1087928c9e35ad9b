//! Scoped variable environment for the halo evaluator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

/// Name-to-value map of one scope. Shared so a lambda's capture state can be
/// pushed as a scope without copying.
pub type Bindings = Rc<RefCell<BTreeMap<String, Value>>>;

/// What opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    If,
    While,
    For,
    /// Holds a `for` loop's variable across iterations.
    ForHeader,
    Fun,
    /// The frame of a class's `_init_` method.
    Init,
    /// A lambda's capture state.
    Capture,
    /// A lambda's parameters and locals.
    Lambda,
    /// Collects a class's methods while the class is built.
    Class,
}

impl ScopeKind {
    /// Lookup stops after a boundary scope and falls back to Global.
    pub fn is_boundary(self) -> bool {
        matches!(self, ScopeKind::Fun | ScopeKind::Init | ScopeKind::Capture)
    }
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    bindings: Bindings,
}

/// Stack of scopes with halo's lookup rule.
///
/// Lookup walks outward from the innermost scope, stops once it has examined
/// the first boundary scope (Fun, Init, Capture), and then checks Global.
/// Function bodies therefore see their own frame and globals, but nothing
/// from the blocks they were called from.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// Create an environment holding only the Global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                bindings: Bindings::default(),
            }],
        }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.push_shared(kind, Bindings::default());
    }

    /// Push a scope whose bindings are owned elsewhere.
    pub fn push_shared(&mut self, kind: ScopeKind, bindings: Bindings) {
        self.scopes.push(Scope { kind, bindings });
    }

    /// Pop the innermost scope and return its bindings. The Global scope is
    /// never popped.
    pub fn pop(&mut self) -> Option<Bindings> {
        if self.scopes.len() > 1 {
            self.scopes.pop().map(|s| s.bindings)
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn innermost_kind(&self) -> ScopeKind {
        self.scopes.last().map_or(ScopeKind::Global, |s| s.kind)
    }

    /// Define `name` in the innermost scope. Returns `false` if that scope
    /// already has it.
    pub fn define(&mut self, name: &str, value: Value) -> bool {
        let scope = self.innermost();
        let mut bindings = scope.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return false;
        }
        bindings.insert(name.to_string(), value);
        true
    }

    /// Look up a visible name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.resolve(name)
            .and_then(|scope| scope.bindings.borrow().get(name).copied())
    }

    /// Overwrite a visible name. Returns `false` if it is not visible.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.resolve(name) {
            Some(scope) => {
                scope.bindings.borrow_mut().insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Every value bound in any scope, for use as GC roots.
    pub fn values(&self) -> Vec<Value> {
        self.scopes
            .iter()
            .flat_map(|s| s.bindings.borrow().values().copied().collect::<Vec<_>>())
            .collect()
    }

    fn innermost(&self) -> &Scope {
        self.scopes.last().expect("global scope is never popped")
    }

    fn resolve(&self, name: &str) -> Option<&Scope> {
        for scope in self.scopes.iter().rev() {
            if scope.bindings.borrow().contains_key(name) {
                return Some(scope);
            }
            if scope.kind.is_boundary() {
                break;
            }
        }
        let global = &self.scopes[0];
        let found = global.bindings.borrow().contains_key(name);
        found.then_some(global)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
