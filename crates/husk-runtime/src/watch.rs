#![forbid(unsafe_code)]

//! Change watchers that also see the previous value.
//!
//! The presence engine decides transitions by comparing the current and
//! previous values of its inputs, so plain subscriptions are not enough.
//! [`watch`] delivers `(current, previous)` on every change; [`watch_immediate`]
//! additionally fires once at registration with `previous = None`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::observable::{Observable, Subscription};

/// Watch an observable, receiving the current and previous values on change.
///
/// Does not fire at registration time.
#[must_use]
pub fn watch<T: Clone + PartialEq + 'static>(
    source: &Observable<T>,
    callback: impl Fn(&T, &T) + 'static,
) -> Subscription {
    let prev = Rc::new(RefCell::new(source.get()));
    source.subscribe(move |curr| {
        let old = prev.replace(curr.clone());
        callback(curr, &old);
    })
}

/// Watch an observable, firing once immediately with `previous = None` and on
/// every later change with `previous = Some(..)`.
#[must_use]
pub fn watch_immediate<T: Clone + PartialEq + 'static>(
    source: &Observable<T>,
    callback: impl Fn(&T, Option<&T>) + 'static,
) -> Subscription {
    let current = source.get();
    callback(&current, None);

    let prev = Rc::new(RefCell::new(current));
    source.subscribe(move |curr| {
        let old = prev.replace(curr.clone());
        callback(curr, Some(&old));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_sees_previous_value() {
        let obs = Observable::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        let _sub = watch(&obs, move |curr, prev| {
            log.borrow_mut().push((*curr, *prev));
        });

        obs.set(2);
        obs.set(5);
        assert_eq!(*seen.borrow(), vec![(2, 1), (5, 2)]);
    }

    #[test]
    fn watch_does_not_fire_at_registration() {
        let obs = Observable::new(0);
        let fired = Rc::new(std::cell::Cell::new(false));
        let f = Rc::clone(&fired);
        let _sub = watch(&obs, move |_, _| f.set(true));
        assert!(!fired.get());
    }

    #[test]
    fn watch_immediate_fires_with_none_prev() {
        let obs = Observable::new(3);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        let _sub = watch_immediate(&obs, move |curr, prev| {
            log.borrow_mut().push((*curr, prev.copied()));
        });

        obs.set(4);
        assert_eq!(*seen.borrow(), vec![(3, None), (4, Some(3))]);
    }

    #[test]
    fn drop_stops_watching() {
        let obs = Observable::new(0);
        let count = Rc::new(std::cell::Cell::new(0));
        let c = Rc::clone(&count);
        let sub = watch(&obs, move |_, _| c.set(c.get() + 1));

        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(count.get(), 1);
    }
}
