#![forbid(unsafe_code)]

//! The in-memory document: element tree, id lookup, focus state, global
//! listeners, and the scheduler.
//!
//! # Invariants
//!
//! 1. `get_element_by_id` answers only for attached elements; detaching
//!    unregisters the whole subtree.
//! 2. `focus()` fires `focusout` on the previous element (with the new one as
//!    `related_target`) before `focusin` on the new element. Focusing the
//!    already-active element fires nothing.
//! 3. Removing the subtree that holds focus silently falls back to `body`
//!    (no focus events; browsers move focus the same way on removal), then
//!    notifies mutation observers so traps can re-anchor.
//!
//! # Failure Modes
//!
//! - Focusing a detached, disabled, or unrendered element is a no-op.
//! - Removing an element that has no parent is a no-op.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use husk_runtime::Subscription;
use tracing::trace;

use crate::element::Element;
use crate::event::{FocusEvent, KeyEvent, Listeners};
use crate::scheduler::Scheduler;

struct MutationObserver {
    id: u64,
    root: Element,
    callback: Rc<dyn Fn()>,
}

struct IdObserver {
    id: u64,
    target_id: String,
    callback: Rc<dyn Fn(Option<Element>)>,
}

struct DocumentInner {
    body: Element,
    by_id: RefCell<AHashMap<String, Element>>,
    active: RefCell<Option<Element>>,
    focusin: Listeners<FocusEvent>,
    focusout: Listeners<FocusEvent>,
    mutation_observers: RefCell<Vec<MutationObserver>>,
    id_observers: RefCell<Vec<IdObserver>>,
    next_observer_id: Cell<u64>,
    scheduler: Scheduler,
}

/// Handle to the document. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an attached `body`.
    #[must_use]
    pub fn new() -> Self {
        let body = Element::create("body", "body");
        body.set_attached(true);
        let doc = Self {
            inner: Rc::new(DocumentInner {
                body: body.clone(),
                by_id: RefCell::new(AHashMap::new()),
                active: RefCell::new(None),
                focusin: Listeners::new(),
                focusout: Listeners::new(),
                mutation_observers: RefCell::new(Vec::new()),
                id_observers: RefCell::new(Vec::new()),
                next_observer_id: Cell::new(0),
                scheduler: Scheduler::new(),
            }),
        };
        doc.inner.by_id.borrow_mut().insert("body".into(), body);
        doc
    }

    /// The document body; always attached, the focus fallback target.
    #[must_use]
    pub fn body(&self) -> Element {
        self.inner.body.clone()
    }

    /// The document's deferred-task scheduler.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        self.inner.scheduler.clone()
    }

    /// Create a detached element. It joins id lookup once attached.
    #[must_use]
    pub fn create_element(&self, tag: &str, id: &str) -> Element {
        Element::create(tag, id)
    }

    /// Attach `child` under `parent`. A child already attached elsewhere is
    /// moved; a move fires mutation observers covering the old parent as well
    /// as those covering the insertion point.
    pub fn append_child(&self, parent: &Element, child: &Element) {
        let old_parent = child.parent();
        if old_parent.is_some() {
            self.detach(child);
        }
        child.set_parent(Some(parent));
        parent.push_child(child.clone());
        if parent.is_attached() {
            self.attach_subtree(child);
        }
        if let Some(old_parent) = old_parent
            && old_parent != *parent
        {
            self.notify_mutation(&old_parent);
        }
        self.notify_mutation(parent);
    }

    /// Remove an element (and its subtree) from the tree. No-op for the body
    /// or an element with no parent.
    pub fn remove(&self, element: &Element) {
        let Some(parent) = element.parent() else {
            return;
        };
        trace!(id = element.id(), "removing element");

        // Focus falls back to body before observers run, so a trap's mutation
        // handler sees the post-removal focus state.
        let active_was_inside = self
            .inner
            .active
            .borrow()
            .as_ref()
            .is_some_and(|active| element.contains(active));

        self.detach(element);

        if active_was_inside {
            *self.inner.active.borrow_mut() = Some(self.inner.body.clone());
        }
        self.notify_mutation(&parent);
    }

    fn detach(&self, element: &Element) {
        if let Some(parent) = element.parent() {
            parent.remove_child(element);
        }
        element.set_parent(None);
        self.detach_subtree(element);
    }

    fn attach_subtree(&self, element: &Element) {
        element.set_attached(true);
        if !element.id().is_empty() {
            self.inner
                .by_id
                .borrow_mut()
                .insert(element.id().to_string(), element.clone());
            self.notify_id_observers(element.id(), Some(element.clone()));
        }
        for child in element.children() {
            self.attach_subtree(&child);
        }
    }

    fn detach_subtree(&self, element: &Element) {
        element.set_attached(false);
        if !element.id().is_empty() {
            let unregistered = {
                let mut by_id = self.inner.by_id.borrow_mut();
                if by_id.get(element.id()).is_some_and(|e| e == element) {
                    by_id.remove(element.id());
                    true
                } else {
                    false
                }
            };
            if unregistered {
                self.notify_id_observers(element.id(), None);
            }
        }
        for child in element.children() {
            self.detach_subtree(&child);
        }
    }

    /// Look up an attached element by id.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.by_id.borrow().get(id).cloned()
    }

    // --- Focus ---

    /// The element holding focus; `body` when nothing does.
    #[must_use]
    pub fn active_element(&self) -> Element {
        self.inner
            .active
            .borrow()
            .clone()
            .unwrap_or_else(|| self.inner.body.clone())
    }

    /// Move focus to `element`, firing `focusout` then `focusin`. Optionally
    /// selects the element's text. No-op if the element cannot receive focus
    /// or already holds it.
    pub fn focus(&self, element: &Element, select: bool) {
        if !element.can_receive_focus() {
            return;
        }
        let previous = self.active_element();
        if previous == *element {
            return;
        }
        trace!(from = previous.id(), to = element.id(), "focus moved");
        *self.inner.active.borrow_mut() = Some(element.clone());
        if select && element.is_selectable() {
            element.set_selected(true);
        }
        self.inner.focusout.emit(&FocusEvent {
            target: previous.clone(),
            related_target: Some(element.clone()),
        });
        self.inner.focusin.emit(&FocusEvent {
            target: element.clone(),
            related_target: Some(previous),
        });
    }

    /// Fire a `focusout` with no `related_target`, as hosts do when the OS
    /// window loses focus. Document focus state is unchanged.
    pub fn simulate_ambiguous_blur(&self) {
        let active = self.active_element();
        self.inner.focusout.emit(&FocusEvent {
            target: active,
            related_target: None,
        });
    }

    /// Listen for focus-gained events document-wide.
    #[must_use]
    pub fn on_focusin(&self, callback: impl Fn(&FocusEvent) + 'static) -> Subscription {
        self.inner.focusin.add(callback)
    }

    /// Listen for focus-lost events document-wide.
    #[must_use]
    pub fn on_focusout(&self, callback: impl Fn(&FocusEvent) + 'static) -> Subscription {
        self.inner.focusout.add(callback)
    }

    // --- Observers ---

    /// Observe child-list mutations within `root`'s subtree. The callback
    /// fires after each attach/detach under the root.
    #[must_use]
    pub fn observe_mutations(&self, root: &Element, callback: impl Fn() + 'static) -> Subscription {
        let id = self.next_observer_id();
        self.inner.mutation_observers.borrow_mut().push(MutationObserver {
            id,
            root: root.clone(),
            callback: Rc::new(callback),
        });
        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.mutation_observers.borrow_mut().retain(|o| o.id != id);
        })
    }

    /// Observe attach/detach of the element carrying `id`. Fires with
    /// `Some(element)` on attach and `None` on detach; does not fire at
    /// registration (callers read the current state themselves).
    #[must_use]
    pub fn observe_id(
        &self,
        id: &str,
        callback: impl Fn(Option<Element>) + 'static,
    ) -> Subscription {
        let observer_id = self.next_observer_id();
        self.inner.id_observers.borrow_mut().push(IdObserver {
            id: observer_id,
            target_id: id.to_string(),
            callback: Rc::new(callback),
        });
        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.id_observers.borrow_mut().retain(|o| o.id != observer_id);
        })
    }

    fn next_observer_id(&self) -> u64 {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id + 1);
        id
    }

    fn notify_mutation(&self, mutation_point: &Element) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .inner
            .mutation_observers
            .borrow()
            .iter()
            .filter(|o| o.root.contains(mutation_point))
            .map(|o| Rc::clone(&o.callback))
            .collect();
        for cb in callbacks {
            cb();
        }
    }

    fn notify_id_observers(&self, id: &str, element: Option<Element>) {
        let callbacks: Vec<Rc<dyn Fn(Option<Element>)>> = self
            .inner
            .id_observers
            .borrow()
            .iter()
            .filter(|o| o.target_id == id)
            .map(|o| Rc::clone(&o.callback))
            .collect();
        for cb in callbacks {
            cb(element.clone());
        }
    }

    // --- Keyboard ---

    /// Dispatch a keydown at `target`, bubbling through its ancestors. Each
    /// element's handler (if any) runs; the event's `prevent_default` latch
    /// is shared across the chain.
    pub fn dispatch_keydown(&self, target: &Element, event: &KeyEvent) {
        let mut cursor = Some(target.clone());
        while let Some(el) = cursor {
            if let Some(handler) = el.keydown_handler() {
                handler(event);
            }
            cursor = el.parent();
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.inner.by_id.borrow().len())
            .field("active", &self.active_element().id())
            .finish()
    }
}
