#![forbid(unsafe_code)]

//! Focus primitives: null-checked focus, tabbable scanning, link stripping.
//!
//! These are the leaf helpers the focus-scope engine (and auto-focus logic)
//! is built from. They are pure queries over the element tree plus one
//! side-effecting wrapper around [`Document::focus`]; none of them signal
//! failure; a missing or unfocusable target degrades to "do nothing".

use crate::document::Document;
use crate::element::Element;

/// Focus an optional target; `None` or an unfocusable element is a no-op.
pub fn focus(doc: &Document, target: Option<&Element>, select: bool) {
    if let Some(el) = target {
        doc.focus(el, select);
    }
}

/// Collect the tabbable descendants of `container` in tree (tab) order.
///
/// Skips disabled elements, zero-dimension elements, href-less anchors, and
/// entire `display: none` subtrees. The container itself is not a candidate.
#[must_use]
pub fn tabbable_candidates(container: &Element) -> Vec<Element> {
    let mut out = Vec::new();
    for child in container.children() {
        collect_tabbable(&child, &mut out);
    }
    out
}

fn collect_tabbable(element: &Element, out: &mut Vec<Element>) {
    if element.display() == "none" {
        return;
    }
    if element.is_tabbable() {
        out.push(element.clone());
    }
    for child in element.children() {
        collect_tabbable(&child, out);
    }
}

/// First and last tabbable descendants of `container`, if any.
#[must_use]
pub fn tabbable_edges(container: &Element) -> (Option<Element>, Option<Element>) {
    let candidates = tabbable_candidates(container);
    (candidates.first().cloned(), candidates.last().cloned())
}

/// Strip anchors that navigate (elements with an `href`) from an auto-focus
/// candidate list, so auto-focusing a leading link cannot trigger navigation.
#[must_use]
pub fn remove_links(candidates: Vec<Element>) -> Vec<Element> {
    candidates.into_iter().filter(|el| !el.has_href()).collect()
}

/// Focus candidates in order until one actually takes focus. Returns whether
/// focus moved.
pub fn focus_first(doc: &Document, candidates: &[Element], select: bool) -> bool {
    let previously_focused = doc.active_element();
    for candidate in candidates {
        doc.focus(candidate, select);
        if doc.active_element() != previously_focused {
            return true;
        }
    }
    false
}
