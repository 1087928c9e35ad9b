//! Stack growth for the recursive parser and evaluator.
//!
//! Nested expressions and user-level recursion both recurse on the host
//! stack. Wrapping each recursive step in [`ensure_sufficient_stack`] grows
//! the stack on demand instead of overflowing it.

/// Grow the stack when less than this much remains (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first allocating a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
