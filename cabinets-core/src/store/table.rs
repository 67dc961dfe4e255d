//! Operation tables.
//!
//! A [`ReducerTable`] ties a store's name and initial state to its
//! operations, keyed by action type. Stores carry one table for synchronous
//! reducers and one for asynchronous ("lazy") reducers.

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::dispatch::Context;

/// Key of the fallback entry in the map and interceptor tables, and of the
/// default lazy operation.
pub const DEFAULT_KEY: &str = "def";

/// Synchronous reducer: `(state, payload, ctx) -> new state`.
pub type ReducerFn =
    Arc<dyn Fn(&Value, Option<Value>, &Context) -> anyhow::Result<Value> + Send + Sync>;

/// Asynchronous reducer: `(state, payload, ctx) -> future of the new state`.
pub type LazyReducerFn = Arc<
    dyn Fn(Value, Option<Value>, Context) -> BoxFuture<'static, anyhow::Result<Value>>
        + Send
        + Sync,
>;

/// Payload map: `(state, payload) -> mapped payload`.
pub type MapFn = Arc<dyn Fn(&Value, Option<Value>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Interceptor: `(state, mapped payload, ctx) -> overrides`.
pub type InterceptorFn =
    Arc<dyn Fn(&Value, Option<&Value>, &Context) -> anyhow::Result<Intercept> + Send + Sync>;

/// Overrides an interceptor applies to the reducer's inputs.
///
/// Absent fields keep the values already flowing through the pipeline.
/// An interceptor therefore cannot take a payload away: `payload: None`
/// means "keep". The closest it can do is hand over `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intercept {
    pub state: Option<Value>,
    pub payload: Option<Value>,
}

impl Intercept {
    /// Leave state and payload as they are.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Hand the reducer `state` instead of the store's state.
    pub fn replace_state(state: impl Into<Value>) -> Self {
        Self::pass().and_state(state)
    }

    /// Hand the reducer `payload` instead of the mapped payload.
    pub fn replace_payload(payload: impl Into<Value>) -> Self {
        Self::pass().and_payload(payload)
    }

    pub fn and_state(mut self, state: impl Into<Value>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn and_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Apply the overrides over the pipeline's state and payload.
    pub(crate) fn apply(self, state: Value, payload: Option<Value>) -> (Value, Option<Value>) {
        (self.state.unwrap_or(state), self.payload.or(payload))
    }
}

/// The pass-through interceptor installed under [`DEFAULT_KEY`].
pub(crate) fn pass_interceptor() -> InterceptorFn {
    Arc::new(|_state: &Value, _payload: Option<&Value>, _ctx: &Context| Ok(Intercept::pass()))
}

/// The default lazy operation: resolves to the payload, or keeps the state
/// when there is none.
pub(crate) fn default_lazy_reducer() -> LazyReducerFn {
    Arc::new(|state: Value, payload: Option<Value>, _ctx: Context| {
        async move { Ok::<_, anyhow::Error>(payload.unwrap_or(state)) }.boxed()
    })
}

/// A store's name and initial state with its operations.
#[derive(Clone)]
pub struct ReducerTable<R> {
    name: String,
    init_state: Value,
    ops: IndexMap<String, R>,
}

impl<R> ReducerTable<R> {
    pub fn new(name: impl Into<String>, init_state: Value, ops: IndexMap<String, R>) -> Self {
        Self {
            name: name.into(),
            init_state,
            ops,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init_state(&self) -> &Value {
        &self.init_state
    }

    pub fn get(&self, action_type: &str) -> Option<&R> {
        self.ops.get(action_type)
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.ops.contains_key(action_type)
    }

    /// Action types in registration order.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn ops(&self) -> &IndexMap<String, R> {
        &self.ops
    }
}

impl<R> fmt::Debug for ReducerTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerTable")
            .field("name", &self.name)
            .field("init_state", &self.init_state)
            .field("ops", &self.ops.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Union several tables. On a key collision the earliest table wins.
pub(crate) fn merge_first_wins<'a, V, I>(tables: I) -> IndexMap<String, V>
where
    V: Clone + 'a,
    I: IntoIterator<Item = &'a IndexMap<String, V>>,
{
    let mut merged = IndexMap::new();
    for table in tables {
        for (key, value) in table {
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    merged
}
