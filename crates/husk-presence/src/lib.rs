#![forbid(unsafe_code)]

//! Animation-aware mount/unmount lifecycle.
//!
//! A [`Presence`] tracks one logical `present` flag and answers the question
//! the renderer actually has: "should this element still be in the tree?"
//! When `present` flips to `false` while an exit animation is applied, the
//! answer stays `true` until the animation finishes, so exit transitions get
//! to play before the element is torn down.
//!
//! The element is tracked by id and resolved lazily; until it resolves (or
//! after it vanishes) every input is absorbed without effect.
//!
//! # Invariants
//!
//! 1. `is_present()` is `true` exactly in the `Mounted` and
//!    `UnmountSuspended` states.
//! 2. `present = false` with no applied animation (or a non-rendered element)
//!    unmounts synchronously, in the same call.
//! 3. Suspension can only end through an animation-end notification for the
//!    element's current animation, a remount, or the element vanishing.
//!
//! # Failure Modes
//!
//! - No element resolved: `present` changes are absorbed; the latest value
//!   is applied once an element resolves.
//! - Element detached mid-animation: the suspension is force-settled, since
//!   a detached element will never deliver `animationend`.

use std::cell::RefCell;
use std::rc::Rc;

use husk_core::{AnimationEvent, AnimationEventKind, Document, Element};
use husk_machine::{Machine, TransitionTable};
use husk_runtime::{Computed, Observable, Subscription, SubscriptionSet, watch, watch_immediate};
use tracing::trace;

/// Lifecycle states of a presence-managed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceState {
    /// Rendered, `present` is (or was last) `true`.
    Mounted,
    /// `present` went `false` but an exit animation is still running.
    UnmountSuspended,
    /// Not rendered.
    Unmounted,
}

/// Inputs to the presence machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceEvent {
    Mount,
    Unmount,
    AnimationOut,
    AnimationEnd,
}

fn transition_table() -> TransitionTable<PresenceState, PresenceEvent> {
    use PresenceEvent::*;
    use PresenceState::*;
    TransitionTable::new()
        .on(Mounted, Unmount, Unmounted)
        .on(Mounted, AnimationOut, UnmountSuspended)
        .on(UnmountSuspended, Mount, Mounted)
        .on(UnmountSuspended, AnimationEnd, Unmounted)
        .on(Unmounted, Mount, Mounted)
}

struct PresenceInner {
    doc: Document,
    machine: Machine<PresenceState, PresenceEvent>,
    present: Observable<bool>,
    node: RefCell<Option<Element>>,
    // Baseline animation-name; an exit animation is detected by the computed
    // name differing from this at the moment `present` flips off.
    prev_animation_name: RefCell<String>,
    animation_guard: RefCell<Option<Subscription>>,
    id_guard: RefCell<Option<Subscription>>,
}

impl PresenceInner {
    fn current_animation_name(&self) -> String {
        self.node
            .borrow()
            .as_ref()
            .map_or_else(|| String::from("none"), Element::animation_name)
    }

    fn track_id(self: &Rc<Self>, id: &str) {
        let weak = Rc::downgrade(self);
        let guard = self.doc.observe_id(id, move |element| {
            if let Some(inner) = weak.upgrade() {
                inner.set_node(element);
            }
        });
        *self.id_guard.borrow_mut() = Some(guard);
        self.set_node(self.doc.get_element_by_id(id));
    }

    fn set_node(self: &Rc<Self>, element: Option<Element>) {
        if *self.node.borrow() == element {
            return;
        }
        *self.animation_guard.borrow_mut() = None;
        match element {
            Some(element) => {
                let weak = Rc::downgrade(self);
                let guard = element.on_animation(move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_animation(event);
                    }
                });
                *self.animation_guard.borrow_mut() = Some(guard);
                *self.node.borrow_mut() = Some(element);
                // A `present = true` that arrived while unresolved was
                // absorbed; apply it now that there is an element.
                if self.present.get() {
                    self.machine.dispatch(PresenceEvent::Mount);
                }
            }
            None => {
                trace!("tracked element vanished, settling suspension");
                *self.node.borrow_mut() = None;
                // A detached element never fires animationend.
                self.machine.dispatch(PresenceEvent::AnimationEnd);
            }
        }
    }

    fn handle_present_change(&self, present: bool, prev_present: Option<bool>) {
        let Some(node) = self.node.borrow().clone() else {
            return;
        };
        if present {
            self.machine.dispatch(PresenceEvent::Mount);
            return;
        }
        let animation_name = node.animation_name();
        if animation_name == "none" || node.display() == "none" {
            self.machine.dispatch(PresenceEvent::Unmount);
            return;
        }
        // An exit animation is one that appeared when `present` flipped off;
        // an animation that was already running is not ours to wait for.
        let is_animating = *self.prev_animation_name.borrow() != animation_name;
        if prev_present == Some(true) && is_animating {
            self.machine.dispatch(PresenceEvent::AnimationOut);
        } else {
            self.machine.dispatch(PresenceEvent::Unmount);
        }
    }

    fn handle_animation(&self, event: &AnimationEvent) {
        let Some(node) = self.node.borrow().clone() else {
            return;
        };
        if event.target != node {
            return;
        }
        match event.kind {
            AnimationEventKind::Start => {
                *self.prev_animation_name.borrow_mut() = node.animation_name();
            }
            AnimationEventKind::End | AnimationEventKind::Cancel => {
                let current = node.animation_name();
                if current.contains(&event.animation_name) || current == "none" {
                    self.machine.dispatch(PresenceEvent::AnimationEnd);
                }
            }
        }
    }
}

/// Presence lifecycle for one element, tracked by id.
///
/// Dropping the `Presence` detaches every listener and observer it installed.
pub struct Presence {
    inner: Rc<PresenceInner>,
    _guards: SubscriptionSet,
}

impl Presence {
    /// Start tracking. `present` is the logical open/visible flag; `node_id`
    /// names the element whose animations gate unmounting.
    #[must_use]
    pub fn new(doc: &Document, present: &Observable<bool>, node_id: &Observable<String>) -> Self {
        let initial = if present.get() {
            PresenceState::Mounted
        } else {
            PresenceState::Unmounted
        };
        let inner = Rc::new(PresenceInner {
            doc: doc.clone(),
            machine: Machine::new(initial, transition_table()),
            present: present.clone(),
            node: RefCell::new(None),
            prev_animation_name: RefCell::new(String::from("none")),
            animation_guard: RefCell::new(None),
            id_guard: RefCell::new(None),
        });

        let mut guards = SubscriptionSet::new();

        // On entering Mounted the running animation (if any) becomes the
        // baseline; outside Mounted the baseline resets.
        let weak = Rc::downgrade(&inner);
        guards.hold(watch(&inner.machine.state(), move |state, _prev| {
            if let Some(inner) = weak.upgrade() {
                let name = if *state == PresenceState::Mounted {
                    inner.current_animation_name()
                } else {
                    String::from("none")
                };
                *inner.prev_animation_name.borrow_mut() = name;
            }
        }));

        let weak = Rc::downgrade(&inner);
        guards.hold(watch_immediate(present, move |curr, prev| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_present_change(*curr, prev.copied());
            }
        }));

        let weak = Rc::downgrade(&inner);
        guards.hold(watch_immediate(node_id, move |id, _prev| {
            if let Some(inner) = weak.upgrade() {
                inner.track_id(id);
            }
        }));

        Self {
            inner,
            _guards: guards,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PresenceState {
        self.inner.machine.current()
    }

    /// The reactive state cell.
    #[must_use]
    pub fn state_cell(&self) -> Observable<PresenceState> {
        self.inner.machine.state()
    }

    /// Whether the element should currently be rendered.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(
            self.state(),
            PresenceState::Mounted | PresenceState::UnmountSuspended
        )
    }

    /// [`is_present`](Self::is_present) as a derived cell, for renderers that
    /// want to subscribe rather than poll.
    #[must_use]
    pub fn is_present_cell(&self) -> Computed<bool> {
        let state = self.inner.machine.state();
        let source = state.clone();
        Computed::new(move || {
            matches!(
                source.get(),
                PresenceState::Mounted | PresenceState::UnmountSuspended
            )
        })
        .depends_on(&state)
    }

    /// The tracked element, if currently resolved.
    #[must_use]
    pub fn node(&self) -> Option<Element> {
        self.inner.node.borrow().clone()
    }
}

impl std::fmt::Debug for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presence")
            .field("state", &self.state())
            .field("node", &self.inner.node.borrow().as_ref().map(Element::id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use husk_core::AnimationEventKind::{Cancel, End, Start};

    struct Fixture {
        doc: Document,
        present: Observable<bool>,
        node_id: Observable<String>,
        element: Element,
    }

    fn mounted_fixture(present: bool) -> (Fixture, Presence) {
        let doc = Document::new();
        let element = doc.create_element("div", "content");
        doc.append_child(&doc.body(), &element);
        let present = Observable::new(present);
        let node_id = Observable::new(String::from("content"));
        let presence = Presence::new(&doc, &present, &node_id);
        (
            Fixture {
                doc,
                present,
                node_id,
                element,
            },
            presence,
        )
    }

    #[test]
    fn initial_state_follows_present() {
        let (_f, open) = mounted_fixture(true);
        assert_eq!(open.state(), PresenceState::Mounted);
        assert!(open.is_present());

        let (_f, closed) = mounted_fixture(false);
        assert_eq!(closed.state(), PresenceState::Unmounted);
        assert!(!closed.is_present());
    }

    #[test]
    fn unresolved_element_absorbs_toggles() {
        let doc = Document::new();
        let present = Observable::new(false);
        let node_id = Observable::new(String::from("missing"));
        let presence = Presence::new(&doc, &present, &node_id);

        present.set(true);
        present.set(false);
        assert_eq!(presence.state(), PresenceState::Unmounted);
        assert!(presence.node().is_none());
    }

    #[test]
    fn unmount_without_animation_is_synchronous() {
        let (f, presence) = mounted_fixture(true);
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::Unmounted);
        assert!(!presence.is_present());
    }

    #[test]
    fn display_none_unmounts_despite_animation() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("slide-out");
        f.element.set_display("none");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::Unmounted);
    }

    #[test]
    fn exit_animation_suspends_until_end() {
        let (f, presence) = mounted_fixture(true);

        // Closing applies the exit animation, then the flag flips.
        f.element.set_animation_name("fade-out");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);
        assert!(presence.is_present());

        f.element.dispatch_animation(Start, "fade-out");
        f.element.dispatch_animation(End, "fade-out");
        assert_eq!(presence.state(), PresenceState::Unmounted);
        assert!(!presence.is_present());
    }

    #[test]
    fn animation_cancel_also_settles() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("fade-out");
        f.present.set(false);

        f.element.dispatch_animation(Cancel, "fade-out");
        assert_eq!(presence.state(), PresenceState::Unmounted);
    }

    #[test]
    fn unrelated_animation_end_is_ignored() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("fade-out");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);

        f.element.dispatch_animation(End, "spinner-spin");
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);

        f.element.dispatch_animation(End, "fade-out");
        assert_eq!(presence.state(), PresenceState::Unmounted);
    }

    #[test]
    fn animation_already_running_does_not_suspend() {
        let (f, presence) = mounted_fixture(true);

        // A looping animation that was playing while mounted becomes the
        // baseline via animationstart; closing must not wait on it.
        f.element.set_animation_name("pulse");
        f.element.dispatch_animation(Start, "pulse");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::Unmounted);
    }

    #[test]
    fn remount_during_suspension() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("fade-out");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);

        f.present.set(true);
        assert_eq!(presence.state(), PresenceState::Mounted);
        assert!(presence.is_present());

        // The stale animationend arriving later must not unmount: Mounted
        // has no AnimationEnd transition.
        f.element.dispatch_animation(End, "fade-out");
        assert_eq!(presence.state(), PresenceState::Mounted);
    }

    #[test]
    fn element_vanishing_settles_suspension() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("fade-out");
        f.present.set(false);
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);

        f.doc.remove(&f.element);
        assert_eq!(presence.state(), PresenceState::Unmounted);
        assert!(presence.node().is_none());
    }

    #[test]
    fn retargeting_node_id_resolves_new_element() {
        let (f, presence) = mounted_fixture(true);
        let other = f.doc.create_element("div", "other");
        f.doc.append_child(&f.doc.body(), &other);

        f.node_id.set(String::from("other"));
        assert_eq!(presence.node(), Some(other));
    }

    #[test]
    fn late_resolution_attaches_listeners() {
        let doc = Document::new();
        let present = Observable::new(true);
        let node_id = Observable::new(String::from("late"));
        let presence = Presence::new(&doc, &present, &node_id);
        assert!(presence.node().is_none());

        let element = doc.create_element("div", "late");
        doc.append_child(&doc.body(), &element);
        assert_eq!(presence.node(), Some(element.clone()));

        element.set_animation_name("fade-out");
        present.set(false);
        assert_eq!(presence.state(), PresenceState::UnmountSuspended);
    }

    #[test]
    fn present_flip_before_resolution_mounts_on_attach() {
        let doc = Document::new();
        let present = Observable::new(false);
        let node_id = Observable::new(String::from("late"));
        let presence = Presence::new(&doc, &present, &node_id);

        // Opening before the element exists is the normal widget order: the
        // flag flips, then the host renders the subtree.
        present.set(true);
        assert_eq!(presence.state(), PresenceState::Unmounted);

        let element = doc.create_element("div", "late");
        doc.append_child(&doc.body(), &element);
        assert_eq!(presence.state(), PresenceState::Mounted);
        assert!(presence.is_present());
        assert_eq!(presence.node(), Some(element));
    }

    #[test]
    fn is_present_cell_tracks_state() {
        let (f, presence) = mounted_fixture(true);
        let cell = presence.is_present_cell();
        assert!(cell.get());

        f.element.set_animation_name("fade-out");
        f.present.set(false);
        assert!(cell.get());

        f.element.dispatch_animation(End, "fade-out");
        assert!(!cell.get());
    }

    #[test]
    fn drop_detaches_everything() {
        let (f, presence) = mounted_fixture(true);
        f.element.set_animation_name("fade-out");
        drop(presence);

        // Neither flag changes nor animation events may reach a dropped
        // tracker; this must not panic or leak observers.
        f.present.set(false);
        f.element.dispatch_animation(End, "fade-out");
        f.doc.remove(&f.element);
    }
}
