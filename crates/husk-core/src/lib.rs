#![forbid(unsafe_code)]

//! DOM-adjacent substrate for husk behavior engines.
//!
//! The behavior engines (presence, focus scope) are written against a host
//! document, but never own one. This crate provides the document surface they
//! need: an element tree with id lookup, computed-style slots, focus state,
//! event listener registries with RAII detachment, and a cooperative deferred
//! scheduler. Host adapters drive it from real UI events; tests drive it
//! directly.
//!
//! Everything here is single-threaded (`Rc`-based); mutation only happens
//! inside event handlers and scheduled callbacks, which run to completion
//! without preemption.

pub mod document;
pub mod element;
pub mod event;
pub mod focus;
pub mod scheduler;

pub use document::Document;
pub use element::Element;
pub use event::{
    AnimationEvent, AnimationEventKind, FocusEvent, KeyCode, KeyEvent, Listeners, Modifiers,
};
pub use focus::{focus, focus_first, remove_links, tabbable_candidates, tabbable_edges};
pub use scheduler::{FrameHandle, Scheduler};
