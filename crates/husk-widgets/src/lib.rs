#![forbid(unsafe_code)]

//! Headless widget behaviors.
//!
//! Each widget is a set of behavior objects (root, trigger, content) that own
//! state and engines and expose the attributes a renderer should spread onto
//! its elements. Nothing here renders; the host applies `props()` maps and
//! forwards events back in.

use std::cell::Cell;

pub mod attrs;
pub mod collapsible;
pub mod dialog;

pub use attrs::Props;
pub use collapsible::{CollapsibleContent, CollapsibleRoot, CollapsibleTrigger};
pub use dialog::{DialogContent, DialogContentOptions, DialogRoot};

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Generate a document-unique element id with the given prefix.
pub(crate) fn unique_id(prefix: &str) -> String {
    NEXT_ID.with(|next| {
        let n = next.get();
        next.set(n + 1);
        format!("{prefix}-{n}")
    })
}
