//! Subscriptions
//!
//! Each store keeps an ordered list of subscriptions. A subscription pairs a
//! [`Listener`] with an optional list of [`Dependency`] paths:
//!
//! - With dependencies, the listener fires once per dispatch if any of the
//!   named values differs between the old and the new state. The first
//!   differing dependency decides; the rest are not inspected.
//! - Without dependencies, the listener fires on every successful dispatch,
//!   even when the state is left unchanged.
//!
//! Values are compared structurally since state is plain JSON.

mod dependency;
mod subscriber;

pub use dependency::Dependency;
pub use subscriber::{Listener, SubscriberId};

use serde_json::Value;

/// A listener registered on a store.
#[derive(Debug, Clone)]
pub struct Subscription {
    listener: Listener,
    deps: Vec<Dependency>,
}

impl Subscription {
    pub fn new(listener: Listener, deps: Vec<Dependency>) -> Self {
        Self { listener, deps }
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    /// Decide whether this subscription fires for a state transition.
    pub fn should_fire(&self, old: &Value, new: &Value) -> bool {
        self.deps.is_empty() || self.deps.iter().any(|dep| dep.changed(old, new))
    }

    /// This subscription with every dependency nested under `namespace`.
    pub(crate) fn namespaced(&self, namespace: &str) -> Self {
        Self {
            listener: self.listener.clone(),
            deps: self.deps.iter().map(|dep| dep.namespaced(namespace)).collect(),
        }
    }
}

/// Append a subscription unless the same listener is already registered.
///
/// Returns whether it was added.
pub(crate) fn add_subscription(subscriptions: &mut Vec<Subscription>, subscription: Subscription) -> bool {
    let id = subscription.listener.id();
    if subscriptions.iter().any(|s| s.listener.id() == id) {
        return false;
    }
    subscriptions.push(subscription);
    true
}

/// Notify every subscription whose filter matches the transition.
pub(crate) fn notify(subscriptions: &[Subscription], old: &Value, new: &Value) {
    for subscription in subscriptions {
        if subscription.should_fire(old, new) {
            subscription.listener.notify(new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let listener = Listener::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    #[test]
    fn dedup_by_listener_identity() {
        let (listener, _) = counting_listener();
        let mut subs = Vec::new();

        assert!(add_subscription(&mut subs, Subscription::new(listener.clone(), vec![])));
        assert!(!add_subscription(
            &mut subs,
            Subscription::new(listener.clone(), vec!["a".into()])
        ));
        assert_eq!(subs.len(), 1);
        assert!(subs[0].deps().is_empty());
    }

    #[test]
    fn deps_filter_and_fire_once() {
        let (listener, count) = counting_listener();
        let subs = vec![Subscription::new(listener, vec!["a".into(), "b".into()])];

        notify(&subs, &json!({"a": 1, "b": 1, "c": 1}), &json!({"a": 1, "b": 1, "c": 2}));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        notify(&subs, &json!({"a": 1, "b": 1}), &json!({"a": 2, "b": 2}));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_deps_fires_even_without_change() {
        let (listener, count) = counting_listener();
        let subs = vec![Subscription::new(listener, vec![])];

        notify(&subs, &json!(1), &json!(1));
        notify(&subs, &json!(1), &json!(2));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        use parking_lot::Mutex;

        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = order.clone();
                Subscription::new(Listener::new(move |_| order.lock().push(i)), vec![])
            })
            .collect();

        notify(&subs, &json!(null), &json!(null));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }
}
