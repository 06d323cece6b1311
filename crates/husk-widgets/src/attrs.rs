#![forbid(unsafe_code)]

//! Shared attribute vocabulary.
//!
//! Widgets style themselves through data attributes rather than classes, so
//! the string values are part of the public contract.

use ahash::AHashMap;

/// Attribute map a renderer spreads onto the corresponding element. Keys are
/// attribute names; an empty value models a bare presence attribute.
pub type Props = AHashMap<&'static str, String>;

/// The `data-state` value for an openable surface.
#[must_use]
pub fn data_state(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

/// Boolean ARIA attribute value.
#[must_use]
pub fn aria_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// The `data-disabled` presence marker: present (empty) when disabled,
/// absent otherwise.
#[must_use]
pub fn data_disabled(disabled: bool) -> Option<&'static str> {
    disabled.then_some("")
}
