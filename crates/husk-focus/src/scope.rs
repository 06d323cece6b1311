#![forbid(unsafe_code)]

//! The focus scope engine: activation, containment, Tab wrapping,
//! deactivation with restore.
//!
//! A scope is *active* while its `enabled` cell is `true` and its container
//! id resolves to an attached element. Activation and deactivation are
//! re-derived whenever either input changes, so mount order does not matter.
//!
//! # Invariants
//!
//! 1. The previously focused element is captured synchronously at
//!    activation, before any focus movement the scope itself causes.
//! 2. Containment listeners detach synchronously at deactivation; the focus
//!    restore runs a task later, after same-tick removals settle.
//! 3. A paused scope (not the stack top) ignores all focus traffic.
//!
//! # Failure Modes
//!
//! - Auto-focus finds no candidate: focus falls back to the container.
//! - The restore target vanished by restore time: focus stays where it is.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use husk_core::{
    Document, Element, FocusEvent, KeyEvent, Modifiers, focus, focus_first, remove_links,
    tabbable_candidates, tabbable_edges,
};
use husk_runtime::{Observable, SubscriptionSet, watch_immediate};
use tracing::trace;

use crate::stack::{self, ScopeHandle};

/// Which end of the scope's lifetime an auto-focus notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFocusPhase {
    /// The scope just activated and is about to focus its first candidate.
    Open,
    /// The scope just deactivated and is about to restore focus.
    Close,
}

/// Cancelable notification fired before the scope moves focus on open or
/// close. Calling [`prevent_default`](Self::prevent_default) suppresses that
/// movement; the consumer then owns where focus goes.
#[derive(Debug)]
pub struct AutoFocusEvent {
    /// Open or close.
    pub phase: AutoFocusPhase,
    prevented: Cell<bool>,
}

impl AutoFocusEvent {
    fn new(phase: AutoFocusPhase) -> Self {
        Self {
            phase,
            prevented: Cell::new(false),
        }
    }

    /// Suppress the scope's own focus movement for this phase.
    pub fn prevent_default(&self) {
        self.prevented.set(true);
    }

    /// Whether the movement was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }
}

type AutoFocusCallback = Rc<dyn Fn(&AutoFocusEvent)>;

/// Configuration for a [`FocusScope`], builder style.
pub struct FocusScopeOptions {
    id: String,
    loop_tab: Observable<bool>,
    enabled: Observable<bool>,
    on_open_auto_focus: Option<AutoFocusCallback>,
    on_close_auto_focus: Option<AutoFocusCallback>,
}

impl FocusScopeOptions {
    /// Options for the container element carrying `id`. Defaults: enabled,
    /// no Tab wrapping, no auto-focus callbacks.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            loop_tab: Observable::new(false),
            enabled: Observable::new(true),
            on_open_auto_focus: None,
            on_close_auto_focus: None,
        }
    }

    /// Wrap Tab at the edges instead of stopping there.
    #[must_use]
    pub fn loop_tab(mut self, cell: Observable<bool>) -> Self {
        self.loop_tab = cell;
        self
    }

    /// Drive activation from this cell (combined with container resolution).
    #[must_use]
    pub fn enabled(mut self, cell: Observable<bool>) -> Self {
        self.enabled = cell;
        self
    }

    /// Called before auto-focusing on activation; cancelable.
    #[must_use]
    pub fn on_open_auto_focus(mut self, callback: impl Fn(&AutoFocusEvent) + 'static) -> Self {
        self.on_open_auto_focus = Some(Rc::new(callback));
        self
    }

    /// Called before restoring focus on deactivation; cancelable.
    #[must_use]
    pub fn on_close_auto_focus(mut self, callback: impl Fn(&AutoFocusEvent) + 'static) -> Self {
        self.on_close_auto_focus = Some(Rc::new(callback));
        self
    }
}

struct ScopeInner {
    doc: Document,
    id: String,
    loop_tab: Observable<bool>,
    enabled: Observable<bool>,
    // Replaced on every activation; each stack entry belongs to exactly one
    // activation, so a deferred removal queued by an earlier deactivation
    // cannot touch a later entry.
    handle: RefCell<ScopeHandle>,
    active: Cell<bool>,
    container: RefCell<Option<Element>>,
    last_focused: RefCell<Option<Element>>,
    previously_focused: RefCell<Option<Element>>,
    containment_guards: RefCell<SubscriptionSet>,
    on_open: Option<AutoFocusCallback>,
    on_close: Option<AutoFocusCallback>,
}

impl ScopeInner {
    fn reconcile(self: &Rc<Self>) {
        let resolved = if self.enabled.get() {
            self.doc.get_element_by_id(&self.id)
        } else {
            None
        };
        match (self.active.get(), resolved) {
            (false, Some(container)) => self.activate(container),
            (true, None) => self.deactivate(),
            (true, Some(container)) => {
                // The id can migrate to a new element across a remount.
                if self.container.borrow().as_ref() != Some(&container) {
                    self.deactivate();
                    self.activate(container);
                }
            }
            (false, None) => {}
        }
    }

    fn activate(self: &Rc<Self>, container: Element) {
        trace!(id = %self.id, "focus scope activating");
        self.active.set(true);
        *self.container.borrow_mut() = Some(container.clone());
        *self.last_focused.borrow_mut() = None;

        // Captured before any focus movement this scope causes.
        let previously = self.doc.active_element();
        *self.previously_focused.borrow_mut() = Some(previously.clone());

        let handle = ScopeHandle::new();
        stack::add(&handle);
        *self.handle.borrow_mut() = handle;

        // The container is the focus fallback; it must be programmatically
        // focusable even when the consumer gave it no tabindex.
        if container.tab_index().is_none() {
            container.set_tab_index(-1);
        }

        let mut guards = SubscriptionSet::new();
        let weak = Rc::downgrade(self);
        guards.hold(self.doc.on_focusin(move |event| {
            if let Some(scope) = weak.upgrade() {
                scope.handle_focusin(event);
            }
        }));
        let weak = Rc::downgrade(self);
        guards.hold(self.doc.on_focusout(move |event| {
            if let Some(scope) = weak.upgrade() {
                scope.handle_focusout(event);
            }
        }));
        let weak = Rc::downgrade(self);
        guards.hold(self.doc.observe_mutations(&container, move || {
            if let Some(scope) = weak.upgrade() {
                scope.handle_mutation();
            }
        }));
        *self.containment_guards.borrow_mut() = guards;

        let weak = Rc::downgrade(self);
        container.set_on_keydown(Rc::new(move |event: &KeyEvent| {
            if let Some(scope) = weak.upgrade() {
                scope.handle_keydown(event);
            }
        }));

        if container.contains(&previously) {
            return;
        }
        let event = AutoFocusEvent::new(AutoFocusPhase::Open);
        if let Some(callback) = &self.on_open {
            callback(&event);
        }
        if event.default_prevented() {
            return;
        }
        // Candidates are scanned after the current tick so content mounted
        // in the same tick is visible.
        let weak = Rc::downgrade(self);
        self.doc.scheduler().after_tick(move || {
            let Some(scope) = weak.upgrade() else {
                return;
            };
            if !scope.active.get() {
                return;
            }
            let Some(container) = scope.container.borrow().clone() else {
                return;
            };
            let candidates = remove_links(tabbable_candidates(&container));
            if !focus_first(&scope.doc, &candidates, true) && scope.doc.active_element() != container
            {
                scope.doc.focus(&container, false);
            }
        });
    }

    fn deactivate(&self) {
        if !self.active.get() {
            return;
        }
        trace!(id = %self.id, "focus scope deactivating");
        self.active.set(false);
        self.containment_guards.borrow_mut().clear();
        if let Some(container) = self.container.borrow_mut().take() {
            container.clear_on_keydown();
        }
        *self.last_focused.borrow_mut() = None;

        let event = AutoFocusEvent::new(AutoFocusPhase::Close);
        if let Some(callback) = &self.on_close {
            callback(&event);
        }
        let prevented = event.default_prevented();
        let doc = self.doc.clone();
        let handle = self.handle.borrow().clone();
        let previously = self.previously_focused.borrow_mut().take();
        // The restore waits a task so that same-tick removal of the scope's
        // own subtree has settled; a remount racing in does not cancel it.
        self.doc.scheduler().post_task(move || {
            if !prevented {
                let target = previously.unwrap_or_else(|| doc.body());
                doc.focus(&target, true);
            }
            stack::remove(&handle);
        });
    }

    fn handle_focusin(&self, event: &FocusEvent) {
        if !self.active.get() || self.handle.borrow().is_paused() {
            return;
        }
        let Some(container) = self.container.borrow().clone() else {
            return;
        };
        if container.contains(&event.target) {
            *self.last_focused.borrow_mut() = Some(event.target.clone());
        } else {
            let anchor = self.last_focused.borrow().clone();
            focus(&self.doc, anchor.as_ref(), true);
        }
    }

    fn handle_focusout(&self, event: &FocusEvent) {
        if !self.active.get() || self.handle.borrow().is_paused() {
            return;
        }
        let Some(container) = self.container.borrow().clone() else {
            return;
        };
        // No related target means the host itself lost focus (window blur);
        // the transfer is outside the document and stays untouched.
        let Some(related) = &event.related_target else {
            return;
        };
        if !container.contains(related) {
            let anchor = self.last_focused.borrow().clone();
            focus(&self.doc, anchor.as_ref(), true);
        }
    }

    fn handle_mutation(&self) {
        if !self.active.get() || self.handle.borrow().is_paused() {
            return;
        }
        let Some(container) = self.container.borrow().clone() else {
            return;
        };
        // Removal and moves out of the container both orphan the anchor.
        let stale = self
            .last_focused
            .borrow()
            .as_ref()
            .is_some_and(|el| !container.contains(el));
        if stale {
            *self.last_focused.borrow_mut() = None;
            self.doc.focus(&container, false);
        }
    }

    fn handle_keydown(&self, event: &KeyEvent) {
        if !self.enabled.get() || self.handle.borrow().is_paused() || !event.is_tab() {
            return;
        }
        let Some(container) = self.container.borrow().clone() else {
            return;
        };
        let focused = self.doc.active_element();
        let (first, last) = tabbable_edges(&container);
        let (Some(first), Some(last)) = (first, last) else {
            if focused == container {
                event.prevent_default();
            }
            return;
        };
        let backwards = event.modifiers.contains(Modifiers::SHIFT);
        if !backwards && focused == last {
            event.prevent_default();
            if self.loop_tab.get() {
                self.doc.focus(&first, true);
            }
        } else if backwards && focused == first {
            event.prevent_default();
            if self.loop_tab.get() {
                self.doc.focus(&last, true);
            }
        }
    }
}

/// A focus trap around one container element, tracked by id.
///
/// Dropping the scope deactivates it: listeners detach immediately and the
/// focus restore is queued as usual.
pub struct FocusScope {
    inner: Rc<ScopeInner>,
    _guards: SubscriptionSet,
}

impl FocusScope {
    /// Create the scope. Activation happens as soon as (and whenever) the
    /// options' `enabled` cell is `true` and the container id resolves.
    #[must_use]
    pub fn new(doc: &Document, options: FocusScopeOptions) -> Self {
        let inner = Rc::new(ScopeInner {
            doc: doc.clone(),
            id: options.id,
            loop_tab: options.loop_tab,
            enabled: options.enabled.clone(),
            handle: RefCell::new(ScopeHandle::new()),
            active: Cell::new(false),
            container: RefCell::new(None),
            last_focused: RefCell::new(None),
            previously_focused: RefCell::new(None),
            containment_guards: RefCell::new(SubscriptionSet::new()),
            on_open: options.on_open_auto_focus,
            on_close: options.on_close_auto_focus,
        });

        let mut guards = SubscriptionSet::new();

        let weak = Rc::downgrade(&inner);
        guards.hold(inner.doc.observe_id(&inner.id, move |_| {
            if let Some(scope) = weak.upgrade() {
                scope.reconcile();
            }
        }));

        let weak = Rc::downgrade(&inner);
        guards.hold(watch_immediate(&options.enabled, move |_, _| {
            if let Some(scope) = weak.upgrade() {
                scope.reconcile();
            }
        }));

        Self {
            inner,
            _guards: guards,
        }
    }

    /// Whether the scope currently enforces containment.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// The resolved container element while active.
    #[must_use]
    pub fn container(&self) -> Option<Element> {
        self.inner.container.borrow().clone()
    }
}

impl Drop for FocusScope {
    fn drop(&mut self) {
        self.inner.deactivate();
    }
}

impl std::fmt::Debug for FocusScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusScope")
            .field("id", &self.inner.id)
            .field("active", &self.inner.active.get())
            .finish()
    }
}
