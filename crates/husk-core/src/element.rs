#![forbid(unsafe_code)]

//! Element handles for the in-memory document tree.
//!
//! An [`Element`] is a cheap cloneable handle; equality is identity
//! (`Rc::ptr_eq`), never structural. Elements model only what the behavior
//! engines query: tree position (for containment), focusability inputs,
//! computed-style slots for `animation-name` and `display`, animation
//! listeners, and an optional keydown handler.
//!
//! # Failure Modes
//!
//! - Querying a detached element never panics; `parent()` returns `None`
//!   and `contains()` answers over the detached subtree.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use husk_runtime::Subscription;

use crate::event::{AnimationEvent, AnimationEventKind, KeyEvent, Listeners};

pub(crate) struct ElementInner {
    id: String,
    tag: String,
    parent: RefCell<Option<Weak<ElementInner>>>,
    children: RefCell<Vec<Element>>,
    attached: Cell<bool>,
    disabled: Cell<bool>,
    tab_index: Cell<Option<i32>>,
    has_href: Cell<bool>,
    // Rendered size; zero-dimension elements are not tabbable.
    size: Cell<(u32, u32)>,
    display: RefCell<String>,
    animation_name: RefCell<String>,
    selectable: Cell<bool>,
    selected: Cell<bool>,
    animation_listeners: Listeners<AnimationEvent>,
    keydown: RefCell<Option<Rc<dyn Fn(&KeyEvent)>>>,
}

/// A handle to one element in the document tree.
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: Rc<ElementInner>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("id", &self.inner.id)
            .field("attached", &self.inner.attached.get())
            .finish()
    }
}

const INTRINSICALLY_FOCUSABLE: &[&str] = &["a", "body", "button", "input", "select", "textarea"];
const TEXT_BEARING: &[&str] = &["input", "textarea"];

impl Element {
    pub(crate) fn create(tag: &str, id: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let selectable = TEXT_BEARING.contains(&tag.as_str());
        Self {
            inner: Rc::new(ElementInner {
                id: id.to_string(),
                tag,
                parent: RefCell::new(None),
                children: RefCell::new(Vec::new()),
                attached: Cell::new(false),
                disabled: Cell::new(false),
                tab_index: Cell::new(None),
                has_href: Cell::new(false),
                size: Cell::new((1, 1)),
                display: RefCell::new(String::from("block")),
                animation_name: RefCell::new(String::from("none")),
                selectable: Cell::new(selectable),
                selected: Cell::new(false),
                animation_listeners: Listeners::new(),
                keydown: RefCell::new(None),
            }),
        }
    }

    // --- Identity and tree ---

    /// The element's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Lowercased tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Parent element, if attached to one.
    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Element { inner })
    }

    /// Children snapshot, in tree order.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.inner.children.borrow().clone()
    }

    /// Inclusive descendant test: an element contains itself.
    #[must_use]
    pub fn contains(&self, other: &Element) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(el) = cursor {
            if el == *self {
                return true;
            }
            cursor = el.parent();
        }
        false
    }

    /// Whether the element currently sits in the document tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    // --- Focusability inputs ---

    /// Mark the element disabled; disabled elements are neither tabbable nor
    /// programmatically focusable.
    pub fn set_disabled(&self, disabled: bool) {
        self.inner.disabled.set(disabled);
    }

    /// Whether the element carries the disabling attribute.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.get()
    }

    /// Set an explicit tabindex. `-1` means programmatically focusable only.
    pub fn set_tab_index(&self, index: i32) {
        self.inner.tab_index.set(Some(index));
    }

    /// The explicit tabindex, if one was set.
    #[must_use]
    pub fn tab_index(&self) -> Option<i32> {
        self.inner.tab_index.get()
    }

    /// Mark whether an anchor has an `href` (href-less anchors are skipped by
    /// tab scanning; href-carrying ones are stripped from auto-focus).
    pub fn set_href(&self, has_href: bool) {
        self.inner.has_href.set(has_href);
    }

    /// Whether this element navigates on activation.
    #[must_use]
    pub fn has_href(&self) -> bool {
        self.inner.has_href.get()
    }

    /// Set the rendered size used for the zero-dimension tabbability check.
    pub fn set_size(&self, width: u32, height: u32) {
        self.inner.size.set((width, height));
    }

    /// Rendered size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.inner.size.get()
    }

    // --- Computed-style slots ---

    /// Set the computed `display` value.
    pub fn set_display(&self, display: &str) {
        *self.inner.display.borrow_mut() = display.to_string();
    }

    /// Computed `display` value.
    #[must_use]
    pub fn display(&self) -> String {
        self.inner.display.borrow().clone()
    }

    /// Set the computed `animation-name` value (`"none"` when no animation
    /// applies).
    pub fn set_animation_name(&self, name: &str) {
        *self.inner.animation_name.borrow_mut() = name.to_string();
    }

    /// Computed `animation-name`; `"none"` when unset.
    #[must_use]
    pub fn animation_name(&self) -> String {
        self.inner.animation_name.borrow().clone()
    }

    /// Whether the element is rendered at all: `display` is not `"none"` and
    /// it has nonzero dimensions.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        let (w, h) = self.inner.size.get();
        *self.inner.display.borrow() != "none" && w > 0 && h > 0
    }

    // --- Text selection ---

    /// Whether focusing with `select` highlights the element's text.
    pub fn set_selectable(&self, selectable: bool) {
        self.inner.selectable.set(selectable);
    }

    /// Whether the element supports text selection.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.inner.selectable.get()
    }

    pub(crate) fn set_selected(&self, selected: bool) {
        self.inner.selected.set(selected);
    }

    /// Whether the element's text is currently selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.inner.selected.get()
    }

    // --- Focus semantics ---

    /// Whether `focus()` may land here: attached, enabled, rendered, and
    /// either intrinsically focusable or carrying any explicit tabindex.
    #[must_use]
    pub fn can_receive_focus(&self) -> bool {
        self.is_attached()
            && !self.is_disabled()
            && self.is_rendered()
            && (INTRINSICALLY_FOCUSABLE.contains(&self.inner.tag.as_str())
                || self.inner.tab_index.get().is_some())
    }

    /// Whether Tab navigation visits this element. Anchors without an `href`
    /// are excluded; they do not participate in the tab order.
    #[must_use]
    pub fn is_tabbable(&self) -> bool {
        if !self.can_receive_focus() {
            return false;
        }
        if self.inner.tag == "body" {
            return false;
        }
        if self.inner.tag == "a" && !self.inner.has_href.get() {
            return false;
        }
        !matches!(self.inner.tab_index.get(), Some(index) if index < 0)
    }

    // --- Events ---

    /// Listen for animation lifecycle events on this element.
    #[must_use]
    pub fn on_animation(&self, callback: impl Fn(&AnimationEvent) + 'static) -> Subscription {
        self.inner.animation_listeners.add(callback)
    }

    /// Fire an animation lifecycle event at this element, as the host does
    /// when a CSS animation starts, completes, or is canceled.
    pub fn dispatch_animation(&self, kind: AnimationEventKind, animation_name: &str) {
        let event = AnimationEvent {
            kind,
            animation_name: animation_name.to_string(),
            target: self.clone(),
        };
        self.inner.animation_listeners.emit(&event);
    }

    /// Install the keydown handler the host spreads onto this element.
    /// Replaces any previous handler.
    pub fn set_on_keydown(&self, handler: Rc<dyn Fn(&KeyEvent)>) {
        *self.inner.keydown.borrow_mut() = Some(handler);
    }

    /// Remove the keydown handler.
    pub fn clear_on_keydown(&self) {
        *self.inner.keydown.borrow_mut() = None;
    }

    pub(crate) fn keydown_handler(&self) -> Option<Rc<dyn Fn(&KeyEvent)>> {
        self.inner.keydown.borrow().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<&Element>) {
        *self.inner.parent.borrow_mut() = parent.map(|p| Rc::downgrade(&p.inner));
    }

    pub(crate) fn push_child(&self, child: Element) {
        self.inner.children.borrow_mut().push(child);
    }

    pub(crate) fn remove_child(&self, child: &Element) {
        self.inner.children.borrow_mut().retain(|c| c != child);
    }

    pub(crate) fn set_attached(&self, attached: bool) {
        self.inner.attached.set(attached);
    }
}
