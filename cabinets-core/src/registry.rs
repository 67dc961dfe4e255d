//! Store Registry
//!
//! A [`Cabinet`] owns a set of mounted stores, keyed by name, and an index
//! from action type to the store that owns it. Dispatch resolves the owning
//! store through that index in O(1).
//!
//! # Ownership
//!
//! There is no process-wide registry. Each cabinet is an independent
//! universe; cloning a cabinet shares it.
//!
//! # Indexing rules
//!
//! - Mounting indexes every sync and lazy action type of the store. A type
//!   already owned by another store moves to the newly mounted one.
//! - Each entry keeps every mounted owner in mount order. Unmounting the
//!   current owner hands the type back to the latest remaining one.
//! - The index only routes actions that are not bound to a store; creators
//!   built by setup carry their store's name.
//! - Mounting under an existing name replaces the previous record and drops
//!   its index entries first.
//! - Unmounting only removes the unmounted name, so a combined store keeps
//!   the types it took over.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::CabinetConfig;
use crate::dispatch::DispatchKind;
use crate::store::record::StoreRecord;
use crate::store::DEFAULT_KEY;
use crate::subscription::Subscription;

type ActionKey = (DispatchKind, String);

/// An owned registry of stores.
#[derive(Clone, Default)]
pub struct Cabinet {
    inner: Arc<CabinetInner>,
}

#[derive(Default)]
struct CabinetInner {
    config: CabinetConfig,
    stores: DashMap<String, Arc<StoreRecord>>,
    /// Owners per action type, most recently mounted last.
    action_index: DashMap<ActionKey, Vec<String>>,
}

impl Cabinet {
    /// Create an empty cabinet with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CabinetConfig) -> Self {
        Self {
            inner: Arc::new(CabinetInner {
                config,
                ..CabinetInner::default()
            }),
        }
    }

    pub fn config(&self) -> &CabinetConfig {
        &self.inner.config
    }

    /// Insert a record, replacing any store of the same name.
    pub(crate) fn mount(&self, record: Arc<StoreRecord>) {
        self.mount_absorbing(record, &[]);
    }

    /// Like [`mount`](Self::mount), for a record taking over the action
    /// types of `absorbed` stores. Those take-overs are not warned about.
    pub(crate) fn mount_absorbing(&self, record: Arc<StoreRecord>, absorbed: &[&str]) {
        let name = record.name.clone();
        if let Some(previous) = self.inner.stores.insert(name.clone(), Arc::clone(&record)) {
            self.drop_index(&previous);
            tracing::debug!(store = %name, "replaced mounted store");
        }
        self.index(&record, absorbed);
        tracing::debug!(store = %name, "store mounted");
    }

    /// Remove a store. Unknown names are ignored.
    pub fn unmount(&self, name: &str) {
        if let Some((_, record)) = self.inner.stores.remove(name) {
            self.drop_index(&record);
            tracing::debug!(store = %name, "store unmounted");
        }
    }

    pub(crate) fn find(&self, name: &str) -> Option<Arc<StoreRecord>> {
        self.inner.stores.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_mounted(&self, name: &str) -> bool {
        self.inner.stores.contains_key(name)
    }

    /// Names of all mounted stores, sorted.
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .stores
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// The mounted store owning `action_type` for the given kind.
    pub(crate) fn owner_of(&self, kind: DispatchKind, action_type: &str) -> Option<Arc<StoreRecord>> {
        let owner = self
            .inner
            .action_index
            .get(&(kind, action_type.to_string()))
            .and_then(|entry| entry.value().last().cloned())?;
        self.find(&owner)
    }

    /// Register a subscription on a mounted store.
    pub(crate) fn subscribe(&self, store: &str, subscription: Subscription) -> bool {
        match self.find(store) {
            Some(record) => record.subscribe(subscription),
            None => {
                tracing::debug!(store = %store, "subscribe on unmounted store ignored");
                false
            }
        }
    }

    fn index(&self, record: &StoreRecord, absorbed: &[&str]) {
        let sync = record
            .reducer
            .action_types()
            .map(|t| (DispatchKind::Sync, t.to_string()));
        let lazy = record
            .lazy_reducer
            .action_types()
            .map(|t| (DispatchKind::Lazy, t.to_string()));

        for key in sync.chain(lazy) {
            let action_type = key.1.clone();
            let kind = key.0;
            let previous = {
                let mut owners = self.inner.action_index.entry(key).or_default();
                let previous = owners.last().cloned();
                owners.retain(|owner| *owner != record.name);
                owners.push(record.name.clone());
                previous
            };
            if let Some(previous) = previous {
                if previous != record.name
                    && action_type != DEFAULT_KEY
                    && !absorbed.contains(&previous.as_str())
                    && self.inner.config.warn_on_action_shadowing
                {
                    tracing::warn!(
                        action = %action_type,
                        kind = ?kind,
                        previous = %previous,
                        store = %record.name,
                        "action type taken over by another store"
                    );
                }
            }
        }
    }

    fn drop_index(&self, record: &StoreRecord) {
        let sync = record
            .reducer
            .action_types()
            .map(|t| (DispatchKind::Sync, t.to_string()));
        let lazy = record
            .lazy_reducer
            .action_types()
            .map(|t| (DispatchKind::Lazy, t.to_string()));

        for key in sync.chain(lazy) {
            if let Some(mut owners) = self.inner.action_index.get_mut(&key) {
                owners.retain(|owner| *owner != record.name);
            }
            self.inner
                .action_index
                .remove_if(&key, |_, owners| owners.is_empty());
        }
    }
}

impl fmt::Debug for Cabinet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cabinet")
            .field("config", &self.inner.config)
            .field("stores", &self.store_names())
            .finish()
    }
}
