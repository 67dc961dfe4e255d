//! Dispatch Scope
//!
//! Tracks which dispatches are running on the current thread. A listener or
//! reducer may fire another action before the outer dispatch returns; the
//! scope stack records that nesting so it can be logged.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a dispatch pushes an entry and the
//! returned guard pops it, even if user code panics.

use std::cell::RefCell;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeEntry>> = RefCell::new(Vec::new());
}

#[derive(Debug, Clone)]
struct ScopeEntry {
    store: String,
    action_type: String,
}

/// Guard that pops the scope when dropped.
pub struct DispatchScope {
    depth: usize,
}

impl DispatchScope {
    /// Enter a dispatch of `action_type` on `store`.
    pub fn enter(store: &str, action_type: &str) -> Self {
        let depth = SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(ScopeEntry {
                store: store.to_string(),
                action_type: action_type.to_string(),
            });
            stack.len()
        });

        Self { depth }
    }

    /// Nesting depth of this scope; 1 for a top-level dispatch.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this dispatch started inside another one.
    pub fn is_reentrant(&self) -> bool {
        self.depth > 1
    }

    /// Number of dispatches running on this thread.
    pub fn active() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }

    /// Store and action type of the innermost running dispatch.
    pub fn current() -> Option<(String, String)> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| (entry.store.clone(), entry.action_type.clone()))
        })
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "DispatchScope dropped out of order"
            );
            stack.pop();
        });
    }
}
