#![forbid(unsafe_code)]

//! Headless UI behavior engines.
//!
//! `husk` separates *what a widget does* from *what it looks like*. The
//! crates re-exported here provide the doing: reactive state cells, an
//! animation-aware mount/unmount lifecycle, focus trapping with restore, and
//! widget behavior objects that expose the attributes a renderer spreads onto
//! its elements.
//!
//! The usual entry points:
//!
//! - [`Observable`] and friends for state the engines react to.
//! - [`Presence`] to keep an element mounted until its exit animation ends.
//! - [`FocusScope`] to confine and restore keyboard focus for overlays.
//! - [`CollapsibleRoot`] / [`DialogRoot`] for assembled widget behaviors.
//!
//! Everything is single-threaded and fail-soft: missing elements, vanished
//! restore targets, and unknown state transitions all degrade to no-ops.

pub use husk_core::{
    AnimationEvent, AnimationEventKind, Document, Element, FocusEvent, FrameHandle, KeyCode,
    KeyEvent, Listeners, Modifiers, Scheduler, focus, focus_first, remove_links,
    tabbable_candidates, tabbable_edges,
};
pub use husk_focus::{AutoFocusEvent, AutoFocusPhase, FocusScope, FocusScopeOptions};
pub use husk_machine::{Machine, TransitionTable};
pub use husk_presence::{Presence, PresenceEvent, PresenceState};
pub use husk_runtime::{
    Computed, Observable, Subscription, SubscriptionSet, watch, watch_immediate,
};
pub use husk_widgets::{
    CollapsibleContent, CollapsibleRoot, CollapsibleTrigger, DialogContent, DialogContentOptions,
    DialogRoot, Props, attrs,
};
