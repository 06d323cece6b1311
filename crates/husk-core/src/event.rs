#![forbid(unsafe_code)]

//! Event types and the listener registry.
//!
//! Listener registration returns a [`Subscription`] guard; dropping it
//! detaches the listener. Every engine holds its guards for its own lifetime,
//! so teardown symmetry is enforced by ownership rather than convention.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bitflags::bitflags;
use husk_runtime::Subscription;

use crate::element::Element;

bitflags! {
    /// Keyboard modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Key identity for keyboard events. Only the keys the engines care about are
/// named; everything else travels as `Char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Tab,
    Escape,
    Enter,
    Char(char),
}

/// A keyboard event with a `preventDefault`-style latch.
#[derive(Debug)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    default_prevented: Cell<bool>,
}

impl KeyEvent {
    /// Create a key event.
    #[must_use]
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            modifiers,
            default_prevented: Cell::new(false),
        }
    }

    /// Suppress the host's default handling of this key.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether default handling was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// A plain Tab press: no ctrl/alt/meta (shift is allowed, since it flips
    /// direction, it does not disqualify the key).
    #[must_use]
    pub fn is_tab(&self) -> bool {
        self.code == KeyCode::Tab
            && !self
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META)
    }
}

/// Which animation lifecycle notification fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
    Start,
    End,
    Cancel,
}

/// A CSS-animation lifecycle event targeted at one element.
#[derive(Debug, Clone)]
pub struct AnimationEvent {
    /// Start, end, or cancel.
    pub kind: AnimationEventKind,
    /// The `animation-name` the event refers to.
    pub animation_name: String,
    /// The element the animation ran on.
    pub target: Element,
}

/// A focus transfer event (`focusin`/`focusout`).
#[derive(Debug, Clone)]
pub struct FocusEvent {
    /// For `focusin`, the element gaining focus; for `focusout`, the one
    /// losing it.
    pub target: Element,
    /// The other side of the transfer. `None` models ambiguous transfers
    /// (OS-level focus loss, focus leaving a detached node).
    pub related_target: Option<Element>,
}

struct ListEntry<E> {
    id: u64,
    callback: Rc<dyn Fn(&E)>,
}

struct ListInner<E> {
    entries: Vec<ListEntry<E>>,
    next_id: u64,
}

/// An ordered listener list with RAII detachment.
pub struct Listeners<E> {
    inner: Rc<RefCell<ListInner<E>>>,
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Listeners<E> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListInner {
                entries: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Attach a listener; the returned guard detaches it on drop.
    #[must_use]
    pub fn add(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(ListEntry {
                id,
                callback: Rc::new(callback),
            });
            id
        };
        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.borrow_mut().entries.retain(|e| e.id != id);
        })
    }

    /// Fire all listeners in attachment order. Listeners attached or detached
    /// by a callback do not affect the in-flight cycle.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Rc<dyn Fn(&E)>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|e| Rc::clone(&e.callback))
            .collect();
        for cb in callbacks {
            cb(event);
        }
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether no listeners are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}
