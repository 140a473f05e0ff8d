#![forbid(unsafe_code)]

//! Per-instance binding scope.
//!
//! A [`BoundScope`] is created once per bound visual object, right after the
//! external object is constructed. It owns everything the binding installed:
//! listeners on the external object, subscriptions to model observables,
//! the sync guards and the `removeHandlers` list handed to child contexts.
//!
//! # State machine
//!
//! ```text
//! Uninitialized -> OptionsBuilt -> Constructed -> Wired -> Active -> Disposed
//!                                                   \___________________^
//! ```
//!
//! Every transition is checked. Skipping or revisiting a state is a
//! [`BindingError::InvalidTransition`].

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use mapsync_core::api::{EventTarget, ListenerId, NativeListener};

use crate::context::DisposalList;
use crate::error::BindingError;
use crate::guard::{GuardTable, SyncGuard};
use crate::reactive::{Subscription, SubscriptionSet};

static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a bound scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        Self(SCOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Lifecycle state of a bound scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeState {
    /// Nothing done yet.
    #[default]
    Uninitialized,
    /// Option record assembled.
    OptionsBuilt,
    /// External object constructed.
    Constructed,
    /// Creation hooks ran.
    Wired,
    /// Live and synchronizing.
    Active,
    /// Torn down.
    Disposed,
}

impl ScopeState {
    /// Whether `self -> to` is a legal transition.
    #[must_use]
    pub const fn can_advance_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Uninitialized, Self::OptionsBuilt)
                | (Self::OptionsBuilt, Self::Constructed)
                | (Self::Constructed, Self::Wired)
                | (Self::Wired, Self::Active)
                | (Self::Wired | Self::Active, Self::Disposed)
        )
    }
}

/// Checked lifecycle state for one binding of `kind`.
#[derive(Debug, Clone)]
pub struct ScopeLifecycle {
    id: ScopeId,
    kind: &'static str,
    state: ScopeState,
}

impl ScopeLifecycle {
    /// Start a new lifecycle in [`ScopeState::Uninitialized`].
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            id: ScopeId::next(),
            kind,
            state: ScopeState::Uninitialized,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ScopeState {
        self.state
    }

    /// Move to `to`, or fail without changing state.
    pub fn advance(&mut self, to: ScopeState) -> Result<(), BindingError> {
        if !self.state.can_advance_to(to) {
            return Err(BindingError::InvalidTransition {
                kind: self.kind,
                from: self.state,
                to,
            });
        }
        tracing::debug!(
            kind = self.kind,
            scope = self.id.get(),
            from = ?self.state,
            ?to,
            "scope transition"
        );
        self.state = to;
        Ok(())
    }
}

/// Everything one bound visual object owns.
pub struct BoundScope<O: ?Sized> {
    lifecycle: ScopeLifecycle,
    object: Rc<O>,
    listeners: Vec<ListenerId>,
    subscriptions: SubscriptionSet,
    guards: GuardTable,
    flags: IndexMap<&'static str, Rc<Cell<bool>>>,
    children: DisposalList,
}

impl<O: ?Sized + EventTarget> BoundScope<O> {
    /// Wrap a freshly constructed object.
    #[must_use]
    pub fn new(lifecycle: ScopeLifecycle, object: Rc<O>) -> Self {
        Self {
            lifecycle,
            object,
            listeners: Vec::new(),
            subscriptions: SubscriptionSet::new(),
            guards: GuardTable::new(),
            flags: IndexMap::new(),
            children: DisposalList::new(),
        }
    }

    /// Scope identifier.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.lifecycle.id
    }

    /// Visual object kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.lifecycle.kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScopeState {
        self.lifecycle.state()
    }

    /// Checked state transition.
    pub fn advance(&mut self, to: ScopeState) -> Result<(), BindingError> {
        self.lifecycle.advance(to)
    }

    /// The external object.
    #[must_use]
    pub fn object(&self) -> &Rc<O> {
        &self.object
    }

    /// A weak handle for closures registered on the external object.
    #[must_use]
    pub fn weak_object(&self) -> Weak<O> {
        Rc::downgrade(&self.object)
    }

    /// The sync guard for `property`.
    pub fn guard(&mut self, property: &'static str) -> SyncGuard {
        self.guards.guard(property)
    }

    /// The guard table.
    #[must_use]
    pub fn guards(&self) -> &GuardTable {
        &self.guards
    }

    /// Register a listener and remember it for teardown.
    pub fn listen(&mut self, event: &str, listener: NativeListener) -> ListenerId {
        let id = self.object.add_listener(event, listener);
        self.listeners.push(id);
        id
    }

    /// Register a one-shot listener and remember it for teardown.
    pub fn listen_once(&mut self, event: &str, listener: NativeListener) -> ListenerId {
        let id = self.object.add_listener_once(event, listener);
        self.listeners.push(id);
        id
    }

    /// Number of listeners installed on the external object.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Keep a model subscription alive for the scope's lifetime.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.hold(subscription);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// A named boolean cell shared with wiring closures, created with
    /// `initial` on first use.
    pub fn flag(&mut self, name: &'static str, initial: bool) -> Rc<Cell<bool>> {
        Rc::clone(
            self.flags
                .entry(name)
                .or_insert_with(|| Rc::new(Cell::new(initial))),
        )
    }

    /// Current value of a named flag; `false` when it does not exist.
    #[must_use]
    pub fn flag_value(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(|flag| flag.get())
    }

    /// The `removeHandlers` list handed to child contexts.
    #[must_use]
    pub fn children(&self) -> &DisposalList {
        &self.children
    }

    /// Remove every listener and drop every subscription.
    pub fn release(&mut self) {
        for id in self.listeners.drain(..).rev() {
            self.object.remove_listener(id);
        }
        self.subscriptions.clear();
    }
}

impl<O: ?Sized> fmt::Debug for BoundScope<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundScope")
            .field("id", &self.lifecycle.id)
            .field("kind", &self.lifecycle.kind)
            .field("state", &self.lifecycle.state)
            .field("listeners", &self.listeners.len())
            .field("subscriptions", &self.subscriptions.len())
            .field("guards", &self.guards.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_is_legal() {
        let mut lc = ScopeLifecycle::new("map");
        for to in [
            ScopeState::OptionsBuilt,
            ScopeState::Constructed,
            ScopeState::Wired,
            ScopeState::Active,
            ScopeState::Disposed,
        ] {
            lc.advance(to).unwrap();
        }
        assert_eq!(lc.state(), ScopeState::Disposed);
    }

    #[test]
    fn skipping_is_rejected() {
        let mut lc = ScopeLifecycle::new("marker");
        let err = lc.advance(ScopeState::Constructed).unwrap_err();
        assert!(matches!(
            err,
            BindingError::InvalidTransition {
                from: ScopeState::Uninitialized,
                to: ScopeState::Constructed,
                ..
            }
        ));
        assert_eq!(lc.state(), ScopeState::Uninitialized);
    }

    #[test]
    fn disposed_only_from_wired_or_active() {
        assert!(ScopeState::Wired.can_advance_to(ScopeState::Disposed));
        assert!(ScopeState::Active.can_advance_to(ScopeState::Disposed));
        assert!(!ScopeState::Constructed.can_advance_to(ScopeState::Disposed));
        assert!(!ScopeState::Disposed.can_advance_to(ScopeState::Disposed));
    }

    #[test]
    fn ids_are_unique() {
        let a = ScopeLifecycle::new("map");
        let b = ScopeLifecycle::new("map");
        assert_ne!(a.id, b.id);
    }
}
