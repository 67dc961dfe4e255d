//! The full store record held by the registry.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

use super::action::ActionCreator;
use super::table::{InterceptorFn, LazyReducerFn, MapFn, ReducerFn, ReducerTable, DEFAULT_KEY};
use crate::dispatch::DispatchKind;
use crate::subscription::{self, Subscription};

/// Everything a mounted store owns.
///
/// Only the dispatcher and the combinator see this type; callers get a
/// [`StoreHandle`](super::StoreHandle).
pub(crate) struct StoreRecord {
    pub(crate) name: String,
    state: Mutex<Value>,
    pub(crate) actions: Arc<IndexMap<String, ActionCreator>>,
    pub(crate) lazy_actions: Arc<IndexMap<String, ActionCreator>>,
    pub(crate) reducer: Arc<ReducerTable<ReducerFn>>,
    pub(crate) lazy_reducer: Arc<ReducerTable<LazyReducerFn>>,
    pub(crate) maps: IndexMap<String, MapFn>,
    pub(crate) interceptors: IndexMap<String, InterceptorFn>,
    subscriptions: Mutex<Vec<Subscription>>,
}

/// Parts assembled by store setup.
pub(crate) struct RecordParts {
    pub(crate) name: String,
    pub(crate) init_state: Value,
    pub(crate) actions: IndexMap<String, ActionCreator>,
    pub(crate) lazy_actions: IndexMap<String, ActionCreator>,
    pub(crate) reducer: ReducerTable<ReducerFn>,
    pub(crate) lazy_reducer: ReducerTable<LazyReducerFn>,
    pub(crate) maps: IndexMap<String, MapFn>,
    pub(crate) interceptors: IndexMap<String, InterceptorFn>,
}

impl StoreRecord {
    pub(crate) fn new(parts: RecordParts) -> Self {
        Self {
            name: parts.name,
            state: Mutex::new(parts.init_state),
            actions: Arc::new(parts.actions),
            lazy_actions: Arc::new(parts.lazy_actions),
            reducer: Arc::new(parts.reducer),
            lazy_reducer: Arc::new(parts.lazy_reducer),
            maps: parts.maps,
            interceptors: parts.interceptors,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// A copy of the current state.
    pub(crate) fn state(&self) -> Value {
        self.state.lock().clone()
    }

    pub(crate) fn replace_state(&self, state: Value) {
        *self.state.lock() = state;
    }

    /// Whether the store has an operation of `kind` for `action_type`.
    pub(crate) fn owns(&self, kind: DispatchKind, action_type: &str) -> bool {
        match kind {
            DispatchKind::Sync => self.reducer.contains(action_type),
            DispatchKind::Lazy => self.lazy_reducer.contains(action_type),
        }
    }

    /// The payload map for `action_type`, falling back to the default entry.
    pub(crate) fn map_for(&self, action_type: &str) -> Option<&MapFn> {
        self.maps
            .get(action_type)
            .or_else(|| self.maps.get(DEFAULT_KEY))
    }

    /// The interceptor for `action_type`, falling back to the default entry.
    pub(crate) fn interceptor_for(&self, action_type: &str) -> Option<&InterceptorFn> {
        self.interceptors
            .get(action_type)
            .or_else(|| self.interceptors.get(DEFAULT_KEY))
    }

    pub(crate) fn subscribe(&self, subscription: Subscription) -> bool {
        subscription::add_subscription(&mut self.subscriptions.lock(), subscription)
    }

    pub(crate) fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().clone()
    }

    pub(crate) fn set_subscriptions(&self, subscriptions: Vec<Subscription>) {
        *self.subscriptions.lock() = subscriptions;
    }

    /// Notify subscribers of a transition.
    ///
    /// The list is copied first so listeners may subscribe or dispatch
    /// without deadlocking on it.
    pub(crate) fn notify(&self, old_state: &Value, new_state: &Value) {
        let subscriptions = self.subscriptions();
        subscription::notify(&subscriptions, old_state, new_state);
    }
}

impl fmt::Debug for StoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRecord")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("reducer", &self.reducer)
            .field("lazy_reducer", &self.lazy_reducer)
            .field("subscriptions", &self.subscriptions.lock().len())
            .finish()
    }
}
