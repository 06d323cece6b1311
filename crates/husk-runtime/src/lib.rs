#![forbid(unsafe_code)]

//! Reactive state cells for husk behavior engines.
//!
//! Everything in this crate is single-threaded and cooperative: callbacks run
//! synchronously and to completion, and all shared ownership is `Rc`-based.
//!
//! - [`Observable`]: a shared value cell with change notification.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Computed`]: a memoized derived value, dirty-marked by its sources.
//! - [`watch`] / [`watch_immediate`]: change callbacks that also see the
//!   previous value.
//! - [`SubscriptionSet`]: collects subscriptions for a logical owner so
//!   teardown is symmetric with setup.
//!
//! # Invariants
//!
//! 1. Setting a value equal to the current one is a no-op (no notification).
//! 2. Subscribers are notified in registration order, synchronously.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. `Computed::get()` never returns a stale value.

pub mod computed;
pub mod observable;
pub mod scope;
pub mod watch;

pub use computed::Computed;
pub use observable::{Observable, Subscription};
pub use scope::SubscriptionSet;
pub use watch::{watch, watch_immediate};
