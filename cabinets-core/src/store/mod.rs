//! Stores
//!
//! A store is a named value plus the operations that may replace it. Each
//! operation is reachable through an action creator; dispatching the action
//! runs the operation's reducer.
//!
//! # Tables
//!
//! - `reducer` / `lazy_reducer`: action type → synchronous / asynchronous
//!   reducer.
//! - `maps`: operation → payload map, with a `"def"` fallback.
//! - `interceptors`: action type → interceptor, with a `"def"` fallback.
//!
//! The tables stay inside the registry. Callers hold a [`StoreHandle`],
//! which only exposes action creators, subscription, dispatch and state
//! reads.

mod action;
mod combine;
mod handle;
pub(crate) mod record;
mod setup;
mod table;

pub use action::{create_action, create_action_with_map, identity_map, Action, ActionCreator};
pub use handle::StoreHandle;
pub use setup::StoreSetup;
pub use table::{
    Intercept, InterceptorFn, LazyReducerFn, MapFn, ReducerFn, ReducerTable, DEFAULT_KEY,
};
