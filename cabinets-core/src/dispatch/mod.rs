//! Dispatch
//!
//! Turns an [`Action`](crate::Action) into a state change on the store that
//! owns its type. The `pipeline` module lists the steps every dispatch runs.
//!
//! # Reentrancy
//!
//! Reentrant dispatch is allowed: no lock is held while maps, interceptors,
//! reducers or listeners run, so any of them may fire further actions.
//!
//! - Listeners are handed the state produced by their own dispatch, even if
//!   an earlier listener has since dispatched again.
//! - A dispatch fired from inside a reducer completes first; the outer
//!   reducer's result then replaces whatever it wrote.

mod context;
mod lazy;
pub(crate) mod pipeline;
mod scope;

use std::fmt;

pub use context::Context;
pub use lazy::LazyDispatch;
pub use scope::DispatchScope;

/// Which operation set an action is dispatched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Sync,
    Lazy,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Lazy => f.write_str("lazy"),
        }
    }
}
