#![forbid(unsafe_code)]

//! Reentrancy guard for two-way synchronized properties.
//!
//! Every two-way property of a bound scope owns one [`SyncGuard`]. Both
//! directions of the property run through it:
//!
//! - **push** (model → external): an observable changed, call the setter;
//! - **pull** (external → model): the object fired its change event, write
//!   the observable.
//!
//! A guard that is already in flight turns the other direction into a no-op,
//! so a setter that synchronously echoes its own change event does not write
//! back into the model, and a model write performed by a pull does not bounce
//! back into the setter.
//!
//! # Invariants
//!
//! 1. At most one of {pushing, pulling} is active per property.
//! 2. The guard is [`SyncDirection::Idle`] whenever control returns to the
//!    caller, including on unwind.
//! 3. Guards of different properties are independent.
//!
//! # Failure Modes
//!
//! - Suppressed reentrant sync: returns `false`, logged at `trace`.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// What a guard is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncDirection {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Model → external in flight.
    Pushing,
    /// External → model in flight.
    Pulling,
}

/// Reentrancy flag for one synchronized property.
///
/// Cloning yields another handle to the same flag; the push subscription and
/// the pull listener of a property each hold one.
#[derive(Clone, Default)]
pub struct SyncGuard {
    property: &'static str,
    state: Rc<Cell<SyncDirection>>,
}

impl SyncGuard {
    /// Create an idle guard for `property`.
    #[must_use]
    pub fn new(property: &'static str) -> Self {
        Self {
            property,
            state: Rc::new(Cell::new(SyncDirection::Idle)),
        }
    }

    /// Property this guard protects.
    #[must_use]
    pub fn property(&self) -> &'static str {
        self.property
    }

    /// Current direction.
    #[must_use]
    pub fn direction(&self) -> SyncDirection {
        self.state.get()
    }

    /// Whether a push or pull is in flight.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.state.get() != SyncDirection::Idle
    }

    /// Run a model → external update unless one is already in flight.
    ///
    /// Returns whether `f` ran.
    pub fn push(&self, f: impl FnOnce()) -> bool {
        self.run(SyncDirection::Pushing, f)
    }

    /// Run an external → model update unless one is already in flight.
    ///
    /// Returns whether `f` ran.
    pub fn pull(&self, f: impl FnOnce()) -> bool {
        self.run(SyncDirection::Pulling, f)
    }

    fn run(&self, direction: SyncDirection, f: impl FnOnce()) -> bool {
        let current = self.state.get();
        if current != SyncDirection::Idle {
            tracing::trace!(
                property = self.property,
                ?current,
                suppressed = ?direction,
                "reentrant sync suppressed"
            );
            return false;
        }
        self.state.set(direction);
        let _reset = ResetOnDrop(&self.state);
        f();
        true
    }
}

impl fmt::Debug for SyncGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncGuard")
            .field("property", &self.property)
            .field("direction", &self.state.get())
            .finish()
    }
}

struct ResetOnDrop<'a>(&'a Cell<SyncDirection>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(SyncDirection::Idle);
    }
}

/// The guards of one bound scope, keyed by property.
#[derive(Default, Debug)]
pub struct GuardTable {
    guards: IndexMap<&'static str, SyncGuard>,
}

impl GuardTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The guard for `property`, created on first use.
    pub fn guard(&mut self, property: &'static str) -> SyncGuard {
        self.guards
            .entry(property)
            .or_insert_with(|| SyncGuard::new(property))
            .clone()
    }

    /// Direction of `property`'s guard; `Idle` when it has none.
    #[must_use]
    pub fn direction(&self, property: &str) -> SyncDirection {
        self.guards
            .get(property)
            .map_or(SyncDirection::Idle, SyncGuard::direction)
    }

    /// Number of guarded properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no property is guarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}
