//! Interpreter configuration.

use serde::{Deserialize, Serialize};

/// Default ceiling on nested user-level calls.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1024;

/// Default number of allocations between automatic collections.
pub const DEFAULT_GC_THRESHOLD: usize = 4096;

/// Tunables for an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Maximum depth of nested function, lambda, method and constructor calls.
    pub max_recursion_depth: usize,
    /// Allocations since the last collection that trigger an automatic one at
    /// the next statement boundary. `0` disables automatic collection.
    pub gc_threshold: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            gc_threshold: DEFAULT_GC_THRESHOLD,
        }
    }
}

impl InterpreterConfig {
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }
}
