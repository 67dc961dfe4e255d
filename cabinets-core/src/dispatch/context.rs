//! Context handed to interceptors and reducers.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::lazy::LazyDispatch;
use crate::error::Result;
use crate::registry::Cabinet;
use crate::store::record::StoreRecord;
use crate::store::{Action, ActionCreator, ReducerFn, ReducerTable};

/// The owning store's reducers and actions, plus a way to dispatch more.
#[derive(Clone)]
pub struct Context {
    cabinet: Cabinet,
    store: String,
    reducer: Arc<ReducerTable<ReducerFn>>,
    actions: Arc<IndexMap<String, ActionCreator>>,
    lazy_actions: Arc<IndexMap<String, ActionCreator>>,
}

impl Context {
    pub(crate) fn new(cabinet: &Cabinet, record: &StoreRecord) -> Self {
        Self {
            cabinet: cabinet.clone(),
            store: record.name.clone(),
            reducer: Arc::clone(&record.reducer),
            actions: Arc::clone(&record.actions),
            lazy_actions: Arc::clone(&record.lazy_actions),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store
    }

    /// The store's synchronous reducers.
    pub fn reducer(&self) -> &ReducerTable<ReducerFn> {
        &self.reducer
    }

    pub fn actions(&self) -> &IndexMap<String, ActionCreator> {
        &self.actions
    }

    pub fn action(&self, operation: &str) -> Option<&ActionCreator> {
        self.actions.get(operation)
    }

    pub fn lazy_action(&self, operation: &str) -> Option<&ActionCreator> {
        self.lazy_actions.get(operation)
    }

    /// The store's state right now, or `None` once it has been unmounted.
    pub fn current_state(&self) -> Option<Value> {
        self.cabinet.find(&self.store).map(|record| record.state())
    }

    /// Run another of the store's reducers directly, without dispatching.
    pub fn reduce(&self, operation: &str, state: &Value, payload: Option<Value>) -> anyhow::Result<Value> {
        let reducer = self
            .reducer
            .get(operation)
            .ok_or_else(|| anyhow::anyhow!("store `{}` has no operation `{operation}`", self.store))?;
        reducer(state, payload, self)
    }

    /// Dispatch an action from inside the pipeline.
    ///
    /// The nested dispatch completes before this returns. When called from a
    /// reducer, the outer reducer's result still replaces the state
    /// afterwards.
    pub fn fire(&self, action: &Action) -> Result<Value> {
        self.cabinet.fire(action)
    }

    pub fn lazy_fire(&self, action: &Action) -> Result<LazyDispatch> {
        self.cabinet.lazy_fire(action)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("store", &self.store)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
