#![forbid(unsafe_code)]

//! Generic table-driven state machine.
//!
//! A [`Machine`] pairs an immutable [`TransitionTable`] with a reactive state
//! cell. `dispatch` is a total function of `(current state, event)`: pairs
//! absent from the table leave the state unchanged and return it, with no error
//! or panic. Callers dispatch speculative events freely; any conditional
//! logic lives in the caller that decides *which* event to dispatch.
//!
//! The machine is domain-agnostic; the presence lifecycle is one
//! instantiation, not a special case.
//!
//! # Invariants
//!
//! 1. Totality: for every `(state, event)` pair not in the table,
//!    `dispatch(event)` is the identity on state.
//! 2. The table never changes after construction.
//! 3. State-cell subscribers observe every transition, in dispatch order.

use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use husk_runtime::Observable;
use tracing::trace;

/// Immutable mapping from `(state, event)` to the next state.
///
/// Built once with [`on`](Self::on) chains, then handed to [`Machine::new`].
#[derive(Debug, Clone)]
pub struct TransitionTable<S, E> {
    transitions: AHashMap<S, AHashMap<E, S>>,
}

impl<S: Copy + Eq + Hash, E: Copy + Eq + Hash> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Copy + Eq + Hash, E: Copy + Eq + Hash> TransitionTable<S, E> {
    /// Create an empty table (every dispatch is a no-op).
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: AHashMap::new(),
        }
    }

    /// Add one transition: in `from`, `event` moves to `to`.
    /// Re-adding a pair overwrites the earlier target.
    #[must_use]
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.entry(from).or_default().insert(event, to);
        self
    }

    /// Look up the next state for `(from, event)`, if the pair is listed.
    #[must_use]
    pub fn next(&self, from: S, event: E) -> Option<S> {
        self.transitions.get(&from).and_then(|row| row.get(&event)).copied()
    }
}

/// A state machine instance: current state (reactive) + transition table.
///
/// Cheap to clone; clones share the same state cell.
pub struct Machine<S, E> {
    state: Observable<S>,
    table: Rc<TransitionTable<S, E>>,
}

impl<S, E> Clone for Machine<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            table: Rc::clone(&self.table),
        }
    }
}

impl<S, E> Machine<S, E>
where
    S: Copy + Eq + Hash + std::fmt::Debug + 'static,
    E: Copy + Eq + Hash + std::fmt::Debug + 'static,
{
    /// Create a machine in `initial` with the given table.
    #[must_use]
    pub fn new(initial: S, table: TransitionTable<S, E>) -> Self {
        Self {
            state: Observable::new(initial),
            table: Rc::new(table),
        }
    }

    /// The reactive state cell. Subscribe to observe transitions.
    #[must_use]
    pub fn state(&self) -> Observable<S> {
        self.state.clone()
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> S {
        self.state.get()
    }

    /// Dispatch an event. Returns the resulting state: the new one on a
    /// table hit, the unchanged current state on a miss.
    pub fn dispatch(&self, event: E) -> S {
        let current = self.state.get();
        match self.table.next(current, event) {
            Some(next) => {
                trace!(?current, ?event, ?next, "transition");
                self.state.set(next);
                next
            }
            None => current,
        }
    }
}

impl<S, E> std::fmt::Debug for Machine<S, E>
where
    S: Copy + Eq + Hash + std::fmt::Debug + 'static,
    E: Copy + Eq + Hash + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine").field("state", &self.current()).finish()
    }
}
