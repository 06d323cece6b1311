#![forbid(unsafe_code)]

//! The scope stack: which trap currently owns containment.
//!
//! One stack per thread. The top entry is live; every entry below it is
//! paused and ignores focus traffic until it surfaces again.
//!
//! # Invariants
//!
//! 1. At most one unpaused entry: pushing pauses the previous top.
//! 2. Removing the top resumes the entry beneath it.
//! 3. Removing a non-member changes nothing, not even pause flags.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

thread_local! {
    static STACK: RefCell<Vec<ScopeHandle>> = const { RefCell::new(Vec::new()) };
}

struct HandleInner {
    paused: Cell<bool>,
}

/// Identity token for one scope's position in the stack.
#[derive(Clone)]
pub(crate) struct ScopeHandle {
    inner: Rc<HandleInner>,
}

impl PartialEq for ScopeHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ScopeHandle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(HandleInner {
                paused: Cell::new(false),
            }),
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    fn pause(&self) {
        self.inner.paused.set(true);
    }

    fn resume(&self) {
        self.inner.paused.set(false);
    }
}

/// Push a handle to the top, pausing the previous top. Re-adding a member
/// moves it to the top.
pub(crate) fn add(handle: &ScopeHandle) {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if let Some(top) = stack.last()
            && top != handle
        {
            top.pause();
        }
        stack.retain(|h| h != handle);
        handle.resume();
        stack.push(handle.clone());
    });
}

/// Remove a handle wherever it sits; if it was a member, the new top resumes.
pub(crate) fn remove(handle: &ScopeHandle) {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let before = stack.len();
        stack.retain(|h| h != handle);
        if stack.len() != before
            && let Some(top) = stack.last()
        {
            top.resume();
        }
    });
}

#[cfg(test)]
pub(crate) fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pauses_previous_top() {
        let a = ScopeHandle::new();
        let b = ScopeHandle::new();
        add(&a);
        assert!(!a.is_paused());

        add(&b);
        assert!(a.is_paused());
        assert!(!b.is_paused());

        remove(&b);
        remove(&a);
    }

    #[test]
    fn removing_top_resumes_next() {
        let a = ScopeHandle::new();
        let b = ScopeHandle::new();
        add(&a);
        add(&b);

        remove(&b);
        assert!(!a.is_paused());
        assert_eq!(depth(), 1);
        remove(&a);
    }

    #[test]
    fn removing_mid_entry_keeps_top_live() {
        let a = ScopeHandle::new();
        let b = ScopeHandle::new();
        let c = ScopeHandle::new();
        add(&a);
        add(&b);
        add(&c);

        remove(&b);
        assert!(!c.is_paused());
        assert!(a.is_paused());
        assert_eq!(depth(), 2);
        remove(&c);
        remove(&a);
    }

    #[test]
    fn removing_non_member_is_noop() {
        let a = ScopeHandle::new();
        let b = ScopeHandle::new();
        let stranger = ScopeHandle::new();
        add(&a);
        add(&b);
        b.pause();

        remove(&stranger);
        // A paused top stays paused; nothing was removed.
        assert!(b.is_paused());
        assert_eq!(depth(), 2);
        remove(&b);
        remove(&a);
    }

    #[test]
    fn readding_member_moves_to_top() {
        let a = ScopeHandle::new();
        let b = ScopeHandle::new();
        add(&a);
        add(&b);

        add(&a);
        assert!(b.is_paused());
        assert!(!a.is_paused());
        assert_eq!(depth(), 2);
        remove(&a);
        remove(&b);
    }
}
