//! Action creators and action descriptors.
//!
//! An [`ActionCreator`] is built once per operation when a store is set up.
//! Calling it produces an [`Action`]: the operation's type, an optional
//! payload and the payload map bound at creation time.
//!
//! Creators built by store setup remember their store, so dispatch reaches
//! that store even when another mounted store shares the action type. Free
//! creators from [`create_action`] are routed by type alone.
//!
//! "No payload" and "a falsy payload" are different things: `payload` is
//! `None` only when the caller supplied nothing, so reducers can tell
//! `action()` apart from `with_payload(0)`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::table::MapFn;

/// The identity payload map: returns the payload untouched.
pub fn identity_map() -> MapFn {
    Arc::new(|_state: &Value, payload: Option<Value>| Ok(payload))
}

/// Build an action creator whose payload passes through unchanged.
pub fn create_action(name: impl Into<String>) -> ActionCreator {
    create_action_from(name, identity_map())
}

/// Build an action creator with a payload map.
///
/// The map receives the store's state and the raw payload and returns the
/// payload handed to the interceptor and reducer.
pub fn create_action_with_map<F>(name: impl Into<String>, map: F) -> ActionCreator
where
    F: Fn(&Value, Option<Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
{
    create_action_from(name, Arc::new(map))
}

pub(crate) fn create_action_from(name: impl Into<String>, map: MapFn) -> ActionCreator {
    ActionCreator {
        action_type: Arc::from(name.into()),
        store: None,
        map,
    }
}

/// Produces [`Action`]s of one type.
#[derive(Clone)]
pub struct ActionCreator {
    action_type: Arc<str>,
    store: Option<Arc<str>>,
    map: MapFn,
}

impl ActionCreator {
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// The store this creator was built for, if any.
    pub fn store_name(&self) -> Option<&str> {
        self.store.as_deref()
    }

    pub(crate) fn bound_to(mut self, store: &str) -> Self {
        self.store = Some(Arc::from(store));
        self
    }

    /// Create an action, with or without a payload.
    pub fn create(&self, payload: Option<Value>) -> Action {
        Action {
            action_type: Arc::clone(&self.action_type),
            store: self.store.clone(),
            payload,
            map: Arc::clone(&self.map),
        }
    }

    /// Create an action without a payload.
    pub fn action(&self) -> Action {
        self.create(None)
    }

    /// Create an action carrying `payload`.
    pub fn with_payload(&self, payload: impl Into<Value>) -> Action {
        self.create(Some(payload.into()))
    }
}

impl fmt::Display for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action_type)
    }
}

impl fmt::Debug for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("type", &self.action_type)
            .field("store", &self.store)
            .finish()
    }
}

impl AsRef<str> for ActionCreator {
    fn as_ref(&self) -> &str {
        &self.action_type
    }
}

/// A dispatchable action descriptor.
#[derive(Clone)]
pub struct Action {
    action_type: Arc<str>,
    store: Option<Arc<str>>,
    payload: Option<Value>,
    map: MapFn,
}

impl Action {
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store.as_deref()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Run the bound payload map against `state`.
    pub(crate) fn map_payload(&self, state: &Value) -> anyhow::Result<Option<Value>> {
        (self.map)(state, self.payload.clone())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action_type)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("type", &self.action_type)
            .field("store", &self.store)
            .field("payload", &self.payload)
            .finish()
    }
}

impl AsRef<str> for Action {
    fn as_ref(&self) -> &str {
        &self.action_type
    }
}
