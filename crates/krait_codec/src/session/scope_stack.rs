use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::info::{GenericScope, TypeArg};

// -----------------------------------------------------------------------------
// ScopeStack

/// The session's stack of active [`GenericScope`]s.
///
/// A scope is pushed for the duration of one object's field loop and popped
/// when the loop ends, so nesting mirrors the object graph being walked.
/// Resolution searches from the innermost scope outward.
#[derive(Debug, Default)]
pub struct ScopeStack {
    stack: Vec<Rc<GenericScope>>,
}

impl ScopeStack {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, scope: Rc<GenericScope>) {
        self.stack.push(scope);
    }

    #[inline]
    pub(crate) fn pop(&mut self) {
        self.stack.pop();
    }

    /// Resolve `param` against the innermost scope that binds it.
    #[inline]
    pub fn resolve(&self, param: &str) -> Option<TypeArg> {
        self.stack.iter().rev().find_map(|scope| scope.get(param))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn resolution_is_innermost_first() {
        let mut stack = ScopeStack::new();
        stack.push(Rc::new(
            GenericScope::bind("Outer", &["T"], &[TypeArg::of::<i32>()]).unwrap(),
        ));
        stack.push(Rc::new(
            GenericScope::bind("Inner", &["T"], &[TypeArg::of::<String>()]).unwrap(),
        ));
        assert_eq!(stack.resolve("T"), Some(TypeArg::of::<String>()));

        stack.pop();
        assert_eq!(stack.resolve("T"), Some(TypeArg::of::<i32>()));

        stack.pop();
        assert_eq!(stack.resolve("T"), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn unbound_params_fall_through() {
        let mut stack = ScopeStack::new();
        stack.push(Rc::new(
            GenericScope::bind("Outer", &["K"], &[TypeArg::of::<u64>()]).unwrap(),
        ));
        stack.push(Rc::new(
            GenericScope::bind("Inner", &["V"], &[TypeArg::of::<bool>()]).unwrap(),
        ));
        assert_eq!(stack.resolve("K"), Some(TypeArg::of::<u64>()));
    }
}
