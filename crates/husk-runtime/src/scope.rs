#![forbid(unsafe_code)]

//! Subscription ownership for a logical scope.
//!
//! Every engine instance (a presence controller, a focus scope, a widget
//! behavior object) owns a [`SubscriptionSet`]. Teardown then reduces to
//! dropping the set: all callbacks are detached before any later notification
//! cycle, which is what keeps simultaneously mounted instances from corrupting
//! each other.
//!
//! # Invariants
//!
//! 1. After drop or `clear()`, no callback held by this set will fire.
//! 2. Subscriptions release in reverse registration order on drop.

use crate::observable::{Observable, Subscription};
use crate::watch;

/// Collects subscriptions for a logical owner; drop releases them all.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold an externally created subscription (or any RAII guard wrapped in
    /// one) until the set is dropped or cleared.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to an observable within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) {
        self.subscriptions.push(source.subscribe(callback));
    }

    /// Watch an observable (current + previous values) within this scope.
    pub fn watch<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T, &T) + 'static,
    ) {
        self.subscriptions.push(watch::watch(source, callback));
    }

    /// Watch with an immediate first call (`previous = None`).
    pub fn watch_immediate<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T, Option<&T>) + 'static,
    ) {
        self.subscriptions
            .push(watch::watch_immediate(source, callback));
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the set holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything now; the set stays usable.
    pub fn clear(&mut self) {
        // Vec drops back-to-front, matching the documented release order.
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn holds_and_fires() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));

        let mut set = SubscriptionSet::new();
        let s = Rc::clone(&seen);
        set.subscribe(&obs, move |v| s.set(*v));
        assert_eq!(set.len(), 1);

        obs.set(42);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn drop_detaches_all() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        {
            let mut set = SubscriptionSet::new();
            let s = Rc::clone(&seen);
            set.subscribe(&obs, move |v| s.set(*v));
            obs.set(1);
        }
        obs.set(9);
        assert_eq!(seen.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn clear_is_reusable() {
        let obs = Observable::new(0);
        let first = Rc::new(Cell::new(false));
        let second = Rc::new(Cell::new(false));

        let mut set = SubscriptionSet::new();
        let f = Rc::clone(&first);
        set.subscribe(&obs, move |_| f.set(true));
        set.clear();
        assert!(set.is_empty());

        let s = Rc::clone(&second);
        set.subscribe(&obs, move |_| s.set(true));

        obs.set(1);
        assert!(!first.get());
        assert!(second.get());
    }

    #[test]
    fn watch_through_scope() {
        let obs = Observable::new(1);
        let prevs = Rc::new(Cell::new(0));

        let mut set = SubscriptionSet::new();
        let p = Rc::clone(&prevs);
        set.watch(&obs, move |_, prev| p.set(*prev));

        obs.set(2);
        assert_eq!(prevs.get(), 1);
    }
}
