#![forbid(unsafe_code)]

//! Focus trapping and restoration for overlay surfaces.
//!
//! A [`FocusScope`] confines keyboard focus to one container while it is
//! active: Tab wraps (or stops) at the edges, focus that escapes is pulled
//! back, and on deactivation focus returns to wherever it was before.
//! Simultaneously active scopes form a stack; only the most recently
//! activated one enforces containment, so nested overlays behave like the
//! innermost one owns the keyboard.
//!
//! Everything here is fail-soft: a scope whose container never resolves, or
//! whose restore target has vanished, degrades to doing nothing.

mod scope;
mod stack;

pub use scope::{AutoFocusEvent, AutoFocusPhase, FocusScope, FocusScopeOptions};
