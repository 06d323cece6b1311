#![forbid(unsafe_code)]

//! Modal dialog: presence-managed content plus a focus trap.
//!
//! While open, the content traps focus (Tab wraps at the edges) and pulls
//! back focus that escapes. Closing restores focus to the element that held
//! it before the dialog opened. Stacked dialogs hand keyboard ownership to
//! the innermost open one.

use husk_core::Document;
use husk_focus::{AutoFocusEvent, FocusScope, FocusScopeOptions};
use husk_presence::Presence;
use husk_runtime::Observable;
use tracing::trace;

use crate::attrs::{Props, aria_bool, data_state};
use crate::unique_id;

/// Shared state for one dialog.
pub struct DialogRoot {
    doc: Document,
    open: Observable<bool>,
    content_id: String,
    trigger_id: String,
}

impl DialogRoot {
    #[must_use]
    pub fn new(doc: &Document, open: Observable<bool>) -> Self {
        Self {
            doc: doc.clone(),
            open,
            content_id: unique_id("husk-dialog-content"),
            trigger_id: unique_id("husk-dialog-trigger"),
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
    pub fn open_cell(&self) -> Observable<bool> {
        self.open.clone()
    }

    pub fn open_dialog(&self) {
        trace!(id = %self.content_id, "dialog opening");
        self.open.set(true);
    }

    pub fn close_dialog(&self) {
        trace!(id = %self.content_id, "dialog closing");
        self.open.set(false);
    }

    /// Attributes for the trigger element.
    #[must_use]
    pub fn trigger_props(&self) -> Props {
        let mut props = Props::default();
        props.insert("id", self.trigger_id.clone());
        props.insert("aria-haspopup", "dialog".into());
        props.insert("aria-expanded", aria_bool(self.is_open()).into());
        props.insert("data-state", data_state(self.is_open()).into());
        props
    }
}

/// Builder for [`DialogContent`].
pub struct DialogContentOptions {
    loop_tab: bool,
    on_open_auto_focus: Option<Box<dyn Fn(&AutoFocusEvent)>>,
    on_close_auto_focus: Option<Box<dyn Fn(&AutoFocusEvent)>>,
}

impl Default for DialogContentOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogContentOptions {
    /// Defaults: Tab wraps, auto-focus on open and close uncustomized.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loop_tab: true,
            on_open_auto_focus: None,
            on_close_auto_focus: None,
        }
    }

    #[must_use]
    pub fn loop_tab(mut self, loop_tab: bool) -> Self {
        self.loop_tab = loop_tab;
        self
    }

    /// Cancelable hook before the trap focuses its first candidate.
    #[must_use]
    pub fn on_open_auto_focus(mut self, callback: impl Fn(&AutoFocusEvent) + 'static) -> Self {
        self.on_open_auto_focus = Some(Box::new(callback));
        self
    }

    /// Cancelable hook before focus is restored on close.
    #[must_use]
    pub fn on_close_auto_focus(mut self, callback: impl Fn(&AutoFocusEvent) + 'static) -> Self {
        self.on_close_auto_focus = Some(Box::new(callback));
        self
    }
}

/// The dialog surface; owns the presence lifecycle and the focus trap.
pub struct DialogContent {
    open: Observable<bool>,
    content_id: String,
    presence: Presence,
    _scope: FocusScope,
}

impl DialogContent {
    #[must_use]
    pub fn new(root: &DialogRoot, options: DialogContentOptions) -> Self {
        let node_id = Observable::new(root.content_id.clone());
        let presence = Presence::new(&root.doc, &root.open, &node_id);

        let mut scope_options = FocusScopeOptions::new(root.content_id.clone())
            .enabled(root.open.clone())
            .loop_tab(Observable::new(options.loop_tab));
        if let Some(callback) = options.on_open_auto_focus {
            scope_options = scope_options.on_open_auto_focus(callback);
        }
        if let Some(callback) = options.on_close_auto_focus {
            scope_options = scope_options.on_close_auto_focus(callback);
        }
        let scope = FocusScope::new(&root.doc, scope_options);

        Self {
            open: root.open.clone(),
            content_id: root.content_id.clone(),
            presence,
            _scope: scope,
        }
    }

    /// Whether the surface should currently be rendered (open or still
    /// animating closed).
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.presence.is_present()
    }

    /// Attributes for the content element.
    #[must_use]
    pub fn props(&self) -> Props {
        let mut props = Props::default();
        props.insert("id", self.content_id.clone());
        props.insert("role", "dialog".into());
        props.insert("aria-modal", "true".into());
        props.insert("data-state", data_state(self.open.get()).into());
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use husk_core::{AnimationEventKind, Element, KeyCode, KeyEvent, Modifiers};

    struct Mounted {
        doc: Document,
        root: DialogRoot,
        content: DialogContent,
        surface: Element,
        confirm: Element,
        cancel: Element,
    }

    // Simulates the host: mounts the surface when the dialog opens.
    fn open_dialog(doc: &Document) -> Mounted {
        let root = DialogRoot::new(doc, Observable::new(false));
        let content = DialogContent::new(&root, DialogContentOptions::new());

        root.open_dialog();
        let surface = doc.create_element("div", root.content_id());
        let confirm = doc.create_element("button", "confirm");
        let cancel = doc.create_element("button", "cancel");
        doc.append_child(&surface, &confirm);
        doc.append_child(&surface, &cancel);
        doc.append_child(&doc.body(), &surface);
        doc.scheduler().flush_microtasks();

        Mounted {
            doc: doc.clone(),
            root,
            content,
            surface,
            confirm,
            cancel,
        }
    }

    #[test]
    fn opening_focuses_first_control() {
        let doc = Document::new();
        let d = open_dialog(&doc);
        assert!(d.content.is_present());
        assert_eq!(d.doc.active_element(), d.confirm);
    }

    #[test]
    fn content_props_mark_modal_dialog() {
        let doc = Document::new();
        let d = open_dialog(&doc);
        let props = d.content.props();
        assert_eq!(props["role"], "dialog");
        assert_eq!(props["aria-modal"], "true");
        assert_eq!(props["data-state"], "open");
        assert_eq!(props["id"], d.root.content_id());
    }

    #[test]
    fn tab_wraps_inside_dialog() {
        let doc = Document::new();
        let d = open_dialog(&doc);
        d.doc.focus(&d.cancel, false);

        let event = KeyEvent::new(KeyCode::Tab, Modifiers::empty());
        d.doc.dispatch_keydown(&d.cancel, &event);
        assert!(event.default_prevented());
        assert_eq!(d.doc.active_element(), d.confirm);
    }

    #[test]
    fn closing_restores_focus_to_opener() {
        let doc = Document::new();
        let opener = doc.create_element("button", "opener");
        doc.append_child(&doc.body(), &opener);
        doc.focus(&opener, false);

        let d = open_dialog(&doc);
        assert_eq!(d.doc.active_element(), d.confirm);

        d.root.close_dialog();
        d.doc.remove(&d.surface);
        d.doc.scheduler().flush_macrotasks();
        assert_eq!(d.doc.active_element(), opener);
    }

    #[test]
    fn exit_animation_keeps_surface_present() {
        let doc = Document::new();
        let d = open_dialog(&doc);

        d.surface.set_animation_name("dialog-out");
        d.root.close_dialog();
        assert!(d.content.is_present());
        assert_eq!(d.content.props()["data-state"], "closed");

        d.surface
            .dispatch_animation(AnimationEventKind::End, "dialog-out");
        assert!(!d.content.is_present());
    }

    #[test]
    fn nested_dialog_owns_focus_then_hands_back() {
        let doc = Document::new();
        let outer = open_dialog(&doc);

        let inner_root = DialogRoot::new(&doc, Observable::new(false));
        let _inner_content = DialogContent::new(&inner_root, DialogContentOptions::new());
        inner_root.open_dialog();
        let inner_surface = doc.create_element("div", inner_root.content_id());
        let inner_button = doc.create_element("button", "inner-ok");
        doc.append_child(&inner_surface, &inner_button);
        doc.append_child(&doc.body(), &inner_surface);
        doc.scheduler().flush_microtasks();
        assert_eq!(doc.active_element(), inner_button);

        // Only the inner trap enforces containment now.
        doc.focus(&outer.confirm, false);
        assert_eq!(doc.active_element(), inner_button);

        inner_root.close_dialog();
        doc.remove(&inner_surface);
        doc.scheduler().flush_macrotasks();
        assert_eq!(doc.active_element(), outer.confirm);

        // And the outer trap is live again.
        let elsewhere = doc.create_element("button", "elsewhere");
        doc.append_child(&doc.body(), &elsewhere);
        doc.focus(&elsewhere, false);
        assert_eq!(doc.active_element(), outer.confirm);
    }

    #[test]
    fn open_auto_focus_hook_can_take_over() {
        let doc = Document::new();
        let root = DialogRoot::new(&doc, Observable::new(false));
        let content = DialogContent::new(
            &root,
            DialogContentOptions::new().on_open_auto_focus(|event| event.prevent_default()),
        );
        root.open_dialog();
        let surface = doc.create_element("div", root.content_id());
        let button = doc.create_element("button", "b");
        doc.append_child(&surface, &button);
        doc.append_child(&doc.body(), &surface);
        doc.scheduler().flush_microtasks();

        assert!(content.is_present());
        assert_eq!(doc.active_element(), doc.body());
    }
}
