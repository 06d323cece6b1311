#![forbid(unsafe_code)]

//! Collapsible: a trigger that shows and hides a content region.
//!
//! The content participates in the presence lifecycle, so a closing animation
//! plays out before the region unmounts. The measured content size is exposed
//! as custom properties for hosts that animate to/from the natural height.
//!
//! # Invariants
//!
//! 1. `aria-controls` on the trigger always names the content element's id.
//! 2. A disabled root ignores trigger activation entirely.
//! 3. The open-state animation is suppressed for the first frame after
//!    mount, so content that starts open does not animate into place.

use std::cell::Cell;
use std::rc::Rc;

use husk_core::{Document, FrameHandle};
use husk_presence::Presence;
use husk_runtime::{Observable, SubscriptionSet};
use tracing::trace;

use crate::attrs::{Props, aria_bool, data_disabled, data_state};
use crate::unique_id;

/// Shared state for one collapsible widget.
pub struct CollapsibleRoot {
    doc: Document,
    open: Observable<bool>,
    disabled: Observable<bool>,
    content_id: String,
}

impl CollapsibleRoot {
    /// Create the root. `open` and `disabled` stay owned by the caller; the
    /// widget reads and writes through them.
    #[must_use]
    pub fn new(doc: &Document, open: Observable<bool>, disabled: Observable<bool>) -> Self {
        Self {
            doc: doc.clone(),
            open,
            disabled,
            content_id: unique_id("husk-collapsible-content"),
        }
    }

    /// The generated id the content element must carry.
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// The open-state cell, for consumers that subscribe.
    #[must_use]
    pub fn open_cell(&self) -> Observable<bool> {
        self.open.clone()
    }

    /// Flip the open state.
    pub fn toggle_open(&self) {
        trace!(id = %self.content_id, open = !self.open.get(), "collapsible toggled");
        self.open.update(|open| !open);
    }

    /// Attributes for the root element.
    #[must_use]
    pub fn props(&self) -> Props {
        let mut props = Props::default();
        props.insert("data-collapsible-root", String::new());
        props.insert("data-state", data_state(self.is_open()).into());
        if let Some(marker) = data_disabled(self.is_disabled()) {
            props.insert("data-disabled", marker.into());
        }
        props
    }

    /// Create the content behavior for this root.
    #[must_use]
    pub fn content(&self, force_mount: bool) -> CollapsibleContent {
        CollapsibleContent::new(self, force_mount)
    }

    /// Create a trigger behavior for this root.
    #[must_use]
    pub fn trigger(&self) -> CollapsibleTrigger {
        CollapsibleTrigger::new(self)
    }
}

/// The collapsing content region; owns the presence lifecycle.
pub struct CollapsibleContent {
    open: Observable<bool>,
    disabled: Observable<bool>,
    content_id: String,
    presence: Presence,
    size: Rc<(Cell<u32>, Cell<u32>)>,
    mount_animation_prevented: Rc<Cell<bool>>,
    _mount_frame: FrameHandle,
    _subs: SubscriptionSet,
}

impl CollapsibleContent {
    /// Create the content behavior. With `force_mount` the region stays
    /// mounted regardless of open state (for hosts that animate with their
    /// own machinery).
    #[must_use]
    pub fn new(root: &CollapsibleRoot, force_mount: bool) -> Self {
        let present = Observable::new(force_mount || root.open.get());
        let mut subs = SubscriptionSet::new();
        let derived = present.clone();
        subs.subscribe(&root.open, move |open| derived.set(force_mount || *open));

        let node_id = Observable::new(root.content_id.clone());
        let presence = Presence::new(&root.doc, &present, &node_id);

        // Content that starts open must not play its open animation.
        let mount_animation_prevented = Rc::new(Cell::new(root.open.get()));
        let flag = Rc::clone(&mount_animation_prevented);
        let mount_frame = root.doc.scheduler().request_frame(move || flag.set(false));

        Self {
            open: root.open.clone(),
            disabled: root.disabled.clone(),
            content_id: root.content_id.clone(),
            presence,
            size: Rc::new((Cell::new(0), Cell::new(0))),
            mount_animation_prevented,
            _mount_frame: mount_frame,
            _subs: subs,
        }
    }

    /// Whether the region should currently be rendered (open, forced, or
    /// still animating closed).
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.presence.is_present()
    }

    /// Attributes for the content element. Measures the resolved element so
    /// the size custom properties track the natural content size.
    #[must_use]
    pub fn props(&self) -> Props {
        if let Some(node) = self.presence.node() {
            let (width, height) = node.size();
            self.size.0.set(width);
            self.size.1.set(height);
        }
        let mut props = Props::default();
        props.insert("id", self.content_id.clone());
        props.insert("data-state", data_state(self.open.get()).into());
        if let Some(marker) = data_disabled(self.disabled.get()) {
            props.insert("data-disabled", marker.into());
        }
        if !self.is_present() {
            props.insert("hidden", String::new());
        }
        props.insert(
            "--husk-collapsible-content-width",
            format!("{}px", self.size.0.get()),
        );
        props.insert(
            "--husk-collapsible-content-height",
            format!("{}px", self.size.1.get()),
        );
        if self.mount_animation_prevented.get() {
            props.insert("style", "animation-duration: 0s".into());
        }
        props
    }
}

/// The button that toggles the region.
pub struct CollapsibleTrigger {
    open: Observable<bool>,
    disabled: Observable<bool>,
    content_id: String,
    on_click: Option<Rc<dyn Fn()>>,
}

impl CollapsibleTrigger {
    #[must_use]
    pub fn new(root: &CollapsibleRoot) -> Self {
        Self {
            open: root.open.clone(),
            disabled: root.disabled.clone(),
            content_id: root.content_id.clone(),
            on_click: None,
        }
    }

    /// Consumer click handler; runs before the toggle.
    #[must_use]
    pub fn on_click(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(callback));
        self
    }

    /// Activate the trigger. Disabled triggers do nothing.
    pub fn click(&self) {
        if self.disabled.get() {
            return;
        }
        if let Some(callback) = &self.on_click {
            callback();
        }
        self.open.update(|open| !open);
    }

    /// Attributes for the trigger element.
    #[must_use]
    pub fn props(&self) -> Props {
        let open = self.open.get();
        let disabled = self.disabled.get();
        let mut props = Props::default();
        props.insert("aria-expanded", aria_bool(open).into());
        props.insert("aria-controls", self.content_id.clone());
        props.insert("data-state", data_state(open).into());
        if let Some(marker) = data_disabled(disabled) {
            props.insert("data-disabled", marker.into());
        }
        if disabled {
            props.insert("disabled", String::new());
        }
        props
    }
}
