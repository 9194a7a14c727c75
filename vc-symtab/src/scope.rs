//! Generic scope stack: per-scope hash maps chained by a stack, entered
//! and exited through an RAII guard (spec.md §9's replacement for
//! hand-written scope-stack symbol tables with name linked lists).
//!
//! `cranelift-codegen`'s `ScopedHashMap` solves the same "shadow within a
//! scope, pop cleanly on exit" problem with one map and per-entry depth
//! chaining; `vc`'s version keeps one `HashMap` per frame instead, which
//! is simpler at the frame-count `vc` actually has (function nesting
//! depth, not basic-block count) and makes "is this name declared in the
//! *current* frame" a single map lookup rather than a depth comparison.

use std::collections::HashMap;

/// A stack of scope frames, searched innermost-first ("lookup walks
/// frames outermost-last", spec.md §3.5).
pub struct ScopeStack<V> {
    frames: Vec<HashMap<String, V>>,
}

impl<V> ScopeStack<V> {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![HashMap::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a fresh frame directly, for callers that need to interleave
    /// scope entry with other mutable borrows of their own context and so
    /// can't hold a `ScopeGuard` across them (`vc-sema`'s `BlockScope`
    /// wraps its whole lowering context the same way this one wraps a
    /// single `ScopeStack`). Must be paired with `pop_scope`.
    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// See `push_scope`.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the global frame");
        self.frames.pop();
    }

    /// Enter a new scope; the returned guard pops it on drop, so a
    /// handler that exits early (via `?`) can't leak a frame.
    pub fn enter(&mut self) -> ScopeGuard<V> {
        self.push_scope();
        ScopeGuard { stack: self }
    }

    /// Declare `name` in the *current* (innermost) frame. Fails if the
    /// name is already declared in that same frame (spec.md §3.5's
    /// uniqueness invariant); shadowing an outer frame is fine.
    pub fn declare(&mut self, name: &str, value: V) -> Result<(), V> {
        let frame = self.frames.last_mut().expect("at least one frame");
        if frame.contains_key(name) {
            return Err(value);
        }
        frame.insert(name.to_string(), value);
        Ok(())
    }

    /// Overwrite (or insert) `name` in the current frame unconditionally;
    /// used for forward-declared entries that accumulate information
    /// across multiple passes (e.g. a function prototype refined into a
    /// definition).
    pub fn set(&mut self, name: &str, value: V) {
        self.frames
            .last_mut()
            .expect("at least one frame")
            .insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut V> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
    }

    /// `true` if `name` is declared in the innermost frame specifically
    /// (not merely visible through an enclosing one).
    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.frames
            .last()
            .expect("at least one frame")
            .contains_key(name)
    }
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ScopeGuard<'a, V> {
    stack: &'a mut ScopeStack<V>,
}

impl<'a, V> Drop for ScopeGuard<'a, V> {
    fn drop(&mut self) {
        self.stack.pop_scope();
    }
}

impl<'a, V> std::ops::Deref for ScopeGuard<'a, V> {
    type Target = ScopeStack<V>;
    fn deref(&self) -> &ScopeStack<V> {
        self.stack
    }
}

impl<'a, V> std::ops::DerefMut for ScopeGuard<'a, V> {
    fn deref_mut(&mut self) -> &mut ScopeStack<V> {
        self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_in_enclosing_scope_is_fine() {
        let mut s: ScopeStack<i32> = ScopeStack::new();
        s.declare("x", 1).unwrap();
        {
            let mut inner = s.enter();
            inner.declare("x", 2).unwrap();
            assert_eq!(inner.lookup("x"), Some(&2));
        }
        assert_eq!(s.lookup("x"), Some(&1));
    }

    #[test]
    fn duplicate_in_same_frame_fails() {
        let mut s: ScopeStack<i32> = ScopeStack::new();
        s.declare("x", 1).unwrap();
        assert!(s.declare("x", 2).is_err());
    }

    #[test]
    fn outer_scope_visible_from_inner() {
        let mut s: ScopeStack<i32> = ScopeStack::new();
        s.declare("g", 10).unwrap();
        let inner = s.enter();
        assert_eq!(inner.lookup("g"), Some(&10));
    }
}
