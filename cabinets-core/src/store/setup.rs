//! Store setup.
//!
//! [`StoreSetup`] collects a store's name, initial state and operation
//! tables. [`Cabinet::setup_store`] turns it into a mounted store:
//!
//! 1. Maps and interceptors get their `"def"` fallback unless supplied.
//! 2. Lazy operations default to a single `"def"` entry.
//! 3. One action creator is built per operation, bound to the operation's
//!    own map or the fallback.
//! 4. The record is mounted and a [`StoreHandle`] returned.
//!
//! Setup either mounts a complete store or fails without touching the
//! registry.

use std::future::Future;
use std::sync::Arc;

use futures::future::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;

use super::action::{create_action_from, identity_map, ActionCreator};
use super::handle::StoreHandle;
use super::record::{RecordParts, StoreRecord};
use super::table::{
    default_lazy_reducer, pass_interceptor, Intercept, InterceptorFn, LazyReducerFn, MapFn,
    ReducerFn, ReducerTable, DEFAULT_KEY,
};
use crate::dispatch::Context;
use crate::error::{CabinetsError, ErrorInfo, Result};
use crate::registry::Cabinet;

/// Description of a store to set up.
///
/// # Example
///
/// ```rust,ignore
/// let counter = cabinet.setup_store(
///     StoreSetup::new("counter", json!(0))
///         .operation("inc", |state, _payload, _ctx| Ok(json!(state.as_i64().unwrap_or(0) + 1))),
/// )?;
/// counter.fire(&counter.action("inc").unwrap().action())?;
/// ```
pub struct StoreSetup {
    name: String,
    init_state: Value,
    operations: IndexMap<String, ReducerFn>,
    lazy_operations: IndexMap<String, LazyReducerFn>,
    maps: IndexMap<String, MapFn>,
    interceptors: IndexMap<String, InterceptorFn>,
}

impl StoreSetup {
    pub fn new(name: impl Into<String>, init_state: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            init_state: init_state.into(),
            operations: IndexMap::new(),
            lazy_operations: IndexMap::new(),
            maps: IndexMap::new(),
            interceptors: IndexMap::new(),
        }
    }

    /// Add a synchronous operation.
    pub fn operation<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&Value, Option<Value>, &Context) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.operations.insert(name.into(), Arc::new(reducer));
        self
    }

    /// Add an asynchronous operation, dispatched with `lazy_fire`.
    pub fn lazy_operation<F, Fut>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(Value, Option<Value>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let reducer: LazyReducerFn =
            Arc::new(move |state, payload, ctx| reducer(state, payload, ctx).boxed());
        self.lazy_operations.insert(name.into(), reducer);
        self
    }

    /// Map the payload of operation `name` before it is intercepted and
    /// reduced. Use `"def"` to replace the fallback map.
    pub fn map<F>(mut self, name: impl Into<String>, map: F) -> Self
    where
        F: Fn(&Value, Option<Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.maps.insert(name.into(), Arc::new(map));
        self
    }

    /// Intercept action type `name` before it is reduced. Use `"def"` to
    /// replace the fallback interceptor.
    pub fn interceptor<F>(mut self, name: impl Into<String>, interceptor: F) -> Self
    where
        F: Fn(&Value, Option<&Value>, &Context) -> anyhow::Result<Intercept>
            + Send
            + Sync
            + 'static,
    {
        self.interceptors.insert(name.into(), Arc::new(interceptor));
        self
    }

    /// Assemble a setup from already erased tables.
    pub(crate) fn from_tables(
        name: String,
        init_state: Value,
        operations: IndexMap<String, ReducerFn>,
        lazy_operations: IndexMap<String, LazyReducerFn>,
        maps: IndexMap<String, MapFn>,
        interceptors: IndexMap<String, InterceptorFn>,
    ) -> Self {
        Self {
            name,
            init_state,
            operations,
            lazy_operations,
            maps,
            interceptors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn error(&self, message: &str) -> CabinetsError {
        CabinetsError::SetupStore(
            ErrorInfo::new(message)
                .with_store(self.name.clone())
                .with_operations(self.operations.keys().cloned())
                .with_state(self.init_state.clone()),
        )
    }

    /// Build the record without mounting it.
    pub(crate) fn build(mut self) -> Result<StoreRecord> {
        if self.name.is_empty() {
            return Err(self.error("store name must not be empty"));
        }
        if self.operations.is_empty() {
            return Err(self.error("no operations to reduce"));
        }

        self.maps.entry(DEFAULT_KEY.to_string()).or_insert_with(identity_map);
        self.interceptors
            .entry(DEFAULT_KEY.to_string())
            .or_insert_with(pass_interceptor);
        if self.lazy_operations.is_empty() {
            self.lazy_operations
                .insert(DEFAULT_KEY.to_string(), default_lazy_reducer());
        }

        let actions = creators_for(&self.name, self.operations.keys(), &self.maps);
        let lazy_actions = creators_for(&self.name, self.lazy_operations.keys(), &self.maps);

        Ok(StoreRecord::new(RecordParts {
            reducer: ReducerTable::new(self.name.clone(), self.init_state.clone(), self.operations),
            lazy_reducer: ReducerTable::new(
                self.name.clone(),
                self.init_state.clone(),
                self.lazy_operations,
            ),
            name: self.name,
            init_state: self.init_state,
            actions,
            lazy_actions,
            maps: self.maps,
            interceptors: self.interceptors,
        }))
    }
}

/// One action creator per operation, bound to its own map or the fallback.
fn creators_for<'a>(
    store: &str,
    operations: impl Iterator<Item = &'a String>,
    maps: &IndexMap<String, MapFn>,
) -> IndexMap<String, ActionCreator> {
    operations
        .map(|op| {
            let map = maps
                .get(op)
                .or_else(|| maps.get(DEFAULT_KEY))
                .cloned()
                .unwrap_or_else(identity_map);
            (op.clone(), create_action_from(op.clone(), map).bound_to(store))
        })
        .collect()
}

impl Cabinet {
    /// Build a store, mount it and return its handle.
    ///
    /// Mounting under a name already in use replaces the previous store.
    pub fn setup_store(&self, setup: StoreSetup) -> Result<StoreHandle> {
        let record = Arc::new(setup.build()?);
        tracing::debug!(
            store = %record.name,
            operations = record.reducer.len(),
            lazy_operations = record.lazy_reducer.len(),
            "store set up"
        );
        self.mount(Arc::clone(&record));
        Ok(StoreHandle::new(self, &record))
    }

    /// Resolve a mounted store by name.
    pub fn get_handle(&self, name: &str) -> Result<StoreHandle> {
        self.find(name)
            .map(|record| StoreHandle::new(self, &record))
            .ok_or_else(|| CabinetsError::NotMounted {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(state: &Value, _payload: Option<Value>, _ctx: &Context) -> anyhow::Result<Value> {
        Ok(state.clone())
    }

    #[test]
    fn empty_operations_fail_without_mounting() {
        let cabinet = Cabinet::new();
        let err = cabinet
            .setup_store(StoreSetup::new("empty", json!({"a": 1})))
            .unwrap_err();

        match &err {
            CabinetsError::SetupStore(info) => {
                assert_eq!(info.store.as_deref(), Some("empty"));
                assert_eq!(info.operations, Some(vec![]));
                assert_eq!(info.state, Some(json!({"a": 1})));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!cabinet.is_mounted("empty"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let cabinet = Cabinet::new();
        let err = cabinet
            .setup_store(StoreSetup::new("", json!(0)).operation("noop", noop))
            .unwrap_err();
        assert_eq!(err.kind(), "setup_store");
    }

    #[test]
    fn fallbacks_are_installed() {
        let record = StoreSetup::new("s", json!(0))
            .operation("noop", noop)
            .build()
            .unwrap();

        assert!(record.maps.contains_key(DEFAULT_KEY));
        assert!(record.interceptor_for("noop").is_some());
        assert!(record.lazy_reducer.contains(DEFAULT_KEY));
        assert!(record.lazy_actions.contains_key(DEFAULT_KEY));
        assert_eq!(record.reducer.name(), "s");
    }

    #[test]
    fn explicit_lazy_operations_replace_the_default() {
        let record = StoreSetup::new("s", json!(0))
            .operation("noop", noop)
            .lazy_operation("load", |state, _payload, _ctx| async move { Ok(state) })
            .build()
            .unwrap();

        assert!(record.lazy_reducer.contains("load"));
        assert!(!record.lazy_reducer.contains(DEFAULT_KEY));
    }

    #[test]
    fn creators_bind_their_own_map() {
        let record = StoreSetup::new("s", json!(0))
            .operation("double", noop)
            .operation("plain", noop)
            .map("double", |_state, payload| {
                Ok(payload.and_then(|p| p.as_i64()).map(|p| json!(p * 2)))
            })
            .build()
            .unwrap();

        let double = record.actions["double"].with_payload(4);
        let plain = record.actions["plain"].with_payload(4);
        assert_eq!(double.map_payload(&json!(0)).unwrap(), Some(json!(8)));
        assert_eq!(plain.map_payload(&json!(0)).unwrap(), Some(json!(4)));
    }

    #[test]
    fn get_handle_for_unknown_store() {
        let cabinet = Cabinet::new();
        let err = cabinet.get_handle("missing").unwrap_err();
        assert!(matches!(err, CabinetsError::NotMounted { name } if name == "missing"));
    }
}
