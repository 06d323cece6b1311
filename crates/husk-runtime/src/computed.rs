#![forbid(unsafe_code)]

//! Memoized derived values.
//!
//! A [`Computed<T>`] caches the result of a pure function of one or more
//! [`Observable`] sources. Each declared source subscription marks the cache
//! dirty on change; recomputation is deferred until the next `get()`.
//!
//! # Invariants
//!
//! 1. `get()` never returns a stale value: a dirty cache recomputes first.
//! 2. The compute function runs at most once per dirtying, however many
//!    sources changed in between.
//! 3. Dropping the `Computed` (all handles) releases its source
//!    subscriptions.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::observable::{Observable, Subscription};

struct Inner<T> {
    compute: Box<dyn Fn() -> T>,
    cached: RefCell<Option<T>>,
    dirty: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

/// A lazily evaluated, memoized value derived from observables.
pub struct Computed<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a computed value. Starts dirty: the first `get()` evaluates.
    #[must_use]
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                compute: Box::new(compute),
                cached: RefCell::new(None),
                dirty: Cell::new(true),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Declare a source: changes to it invalidate the cache.
    ///
    /// The subscription holds only a weak reference back to the cache, so a
    /// source outliving the `Computed` does not keep it alive.
    #[must_use]
    pub fn depends_on<S: Clone + PartialEq + 'static>(self, source: &Observable<S>) -> Self {
        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        let sub = source.subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.dirty.set(true);
            }
        });
        self.inner.subscriptions.borrow_mut().push(sub);
        self
    }

    /// Get the current value, recomputing if any source changed.
    #[must_use]
    pub fn get(&self) -> T {
        if !self.inner.dirty.get()
            && let Some(value) = self.inner.cached.borrow().as_ref()
        {
            return value.clone();
        }
        let value = (self.inner.compute)();
        *self.inner.cached.borrow_mut() = Some(value.clone());
        self.inner.dirty.set(false);
        value
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed").field("value", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_on_first_get() {
        let a = Observable::new(2);
        let src = a.clone();
        let c = Computed::new(move || src.get() * 10).depends_on(&a);
        assert_eq!(c.get(), 20);
    }

    #[test]
    fn recomputes_after_source_change() {
        let a = Observable::new(1);
        let src = a.clone();
        let c = Computed::new(move || src.get() + 1).depends_on(&a);
        assert_eq!(c.get(), 2);

        a.set(10);
        assert_eq!(c.get(), 11);
    }

    #[test]
    fn memoizes_between_changes() {
        let a = Observable::new(1);
        let calls = Rc::new(Cell::new(0));

        let src = a.clone();
        let n = Rc::clone(&calls);
        let c = Computed::new(move || {
            n.set(n.get() + 1);
            src.get()
        })
        .depends_on(&a);

        let _ = c.get();
        let _ = c.get();
        assert_eq!(calls.get(), 1);

        a.set(2);
        let _ = c.get();
        let _ = c.get();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn two_sources() {
        let a = Observable::new(3);
        let b = Observable::new(4);
        let (sa, sb) = (a.clone(), b.clone());
        let c = Computed::new(move || sa.get() * sb.get())
            .depends_on(&a)
            .depends_on(&b);
        assert_eq!(c.get(), 12);

        b.set(5);
        assert_eq!(c.get(), 15);
    }

    #[test]
    fn drop_releases_source_subscriptions() {
        let a = Observable::new(0);
        {
            let src = a.clone();
            let c = Computed::new(move || src.get()).depends_on(&a);
            assert_eq!(c.get(), 0);
            assert_eq!(a.subscriber_count(), 1);
        }
        assert_eq!(a.subscriber_count(), 0);
    }
}
