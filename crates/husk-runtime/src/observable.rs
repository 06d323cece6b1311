#![forbid(unsafe_code)]

//! Shared, change-notifying value cells.
//!
//! `Observable<T>` is the reactive primitive every engine in this workspace
//! builds on. It is a cheap cloneable handle (`Rc` inner) holding a value, a
//! version counter, and a list of subscriber callbacks.
//!
//! # Invariants
//!
//! 1. The version increments exactly once per mutation that changes the value.
//! 2. `set` with a value equal to the current one is a no-op: no version bump,
//!    no notifications.
//! 3. Subscribers fire in registration order. A subscriber registered or
//!    dropped during a notification cycle does not affect the in-flight cycle.
//!
//! # Failure Modes
//!
//! - Subscriber panic: propagates to the caller of `set` (tests only; library
//!   callbacks never panic).
//! - Re-entrant `set` from a subscriber: allowed; the nested cycle completes
//!   before the outer iteration resumes with the remaining (now possibly
//!   stale-value) callbacks.

use std::cell::RefCell;
use std::rc::Rc;

struct Subscriber<T> {
    id: u64,
    callback: Rc<dyn Fn(&T)>,
}

struct Inner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
}

/// A shared, version-tracked value with change notification.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value through a borrow, without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Current version counter. Bumped once per value-changing `set`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Set a new value, notifying subscribers if it differs from the current.
    pub fn set(&self, value: T) {
        let callbacks: Vec<Rc<dyn Fn(&T)>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value.clone();
            inner.version += 1;
            inner
                .subscribers
                .iter()
                .map(|s| Rc::clone(&s.callback))
                .collect()
        };
        // Borrow released: callbacks may read or even set re-entrantly.
        for cb in callbacks {
            cb(&value);
        }
    }

    /// Update the value in place through a closure; notifies if changed.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.borrow().value);
        self.set(next);
    }

    /// Subscribe to value changes. The callback fires after each
    /// value-changing `set`, with the new value.
    ///
    /// The returned [`Subscription`] unsubscribes on drop.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                callback: Rc::new(callback),
            });
            id
        };
        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.borrow_mut().subscribers.retain(|s| s.id != id);
        })
    }

    /// Number of live subscribers. Exposed for teardown assertions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// RAII guard for an [`Observable`] subscription.
///
/// Dropping the guard removes the callback; the callback will not fire in any
/// later notification cycle. Dropping is idempotent and order-independent.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap an arbitrary cancellation action. Used by this crate and by
    /// listener registries elsewhere that want the same RAII discipline.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel now instead of at drop time.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
