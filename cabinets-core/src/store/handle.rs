//! Restricted view of a mounted store.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::action::{Action, ActionCreator};
use super::record::StoreRecord;
use crate::dispatch::LazyDispatch;
use crate::error::{CabinetsError, Result};
use crate::registry::Cabinet;
use crate::subscription::{Dependency, Listener, Subscription};

/// What callers see of a store.
///
/// A handle exposes the store's action creators and the dispatch entry
/// points. State is read through the registry on every call, so a handle
/// whose store has been unmounted reports no state.
#[derive(Clone)]
pub struct StoreHandle {
    name: String,
    actions: Arc<IndexMap<String, ActionCreator>>,
    lazy_actions: Arc<IndexMap<String, ActionCreator>>,
    cabinet: Cabinet,
}

impl StoreHandle {
    pub(crate) fn new(cabinet: &Cabinet, record: &StoreRecord) -> Self {
        Self {
            name: record.name.clone(),
            actions: Arc::clone(&record.actions),
            lazy_actions: Arc::clone(&record.lazy_actions),
            cabinet: cabinet.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &IndexMap<String, ActionCreator> {
        &self.actions
    }

    pub fn action(&self, operation: &str) -> Option<&ActionCreator> {
        self.actions.get(operation)
    }

    pub fn lazy_actions(&self) -> &IndexMap<String, ActionCreator> {
        &self.lazy_actions
    }

    pub fn lazy_action(&self, operation: &str) -> Option<&ActionCreator> {
        self.lazy_actions.get(operation)
    }

    /// Notify `listener` after every successful dispatch to this store.
    ///
    /// Returns `false` if the listener was already subscribed or the store
    /// is no longer mounted.
    pub fn subscribe(&self, listener: &Listener) -> bool {
        self.cabinet.subscribe(&self.name, Subscription::new(listener.clone(), Vec::new()))
    }

    /// Notify `listener` only when one of `deps` changes.
    pub fn subscribe_with_deps<I, D>(&self, listener: &Listener, deps: I) -> bool
    where
        I: IntoIterator<Item = D>,
        D: Into<Dependency>,
    {
        let deps = deps.into_iter().map(Into::into).collect();
        self.cabinet.subscribe(&self.name, Subscription::new(listener.clone(), deps))
    }

    /// Dispatch a synchronous action and return the new state.
    pub fn fire(&self, action: &Action) -> Result<Value> {
        self.cabinet.fire(action)
    }

    /// Dispatch an asynchronous action. See [`Cabinet::lazy_fire`].
    pub fn lazy_fire(&self, action: &Action) -> Result<LazyDispatch> {
        self.cabinet.lazy_fire(action)
    }

    /// The current state, or `None` once the store is unmounted.
    pub fn get_state(&self) -> Option<Value> {
        self.cabinet.find(&self.name).map(|record| record.state())
    }

    /// The current state decoded into `T`.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        let state = self.get_state().ok_or_else(|| CabinetsError::NotMounted {
            name: self.name.clone(),
        })?;
        serde_json::from_value(state).map_err(|source| CabinetsError::Decode {
            store: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("lazy_actions", &self.lazy_actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
