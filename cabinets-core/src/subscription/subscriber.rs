//! Listener types for store subscriptions.
//!
//! A Listener is a callback invoked with a store's new state after a
//! successful dispatch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

/// Unique identifier for a listener.
///
/// Each listener gets a unique ID when created, and clones share it. This ID
/// is what a store compares to avoid duplicate subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A callback notified with a store's state after it changes.
#[derive(Clone)]
pub struct Listener {
    id: SubscriberId,
    callback: Arc<dyn Fn(&Value) + Send + Sync>,
}

impl Listener {
    /// Create a new listener with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            callback: Arc::new(callback),
        }
    }

    /// Get the listener's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback with the new state.
    pub fn notify(&self, state: &Value) {
        (self.callback)(state);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}
