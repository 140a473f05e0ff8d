#![forbid(unsafe_code)]

//! Reactive model layer for mapsync.
//!
//! This module provides the small piece of a declarative binding engine the
//! map bindings need:
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Bindings`] / [`BindingValue`]: the declarative bindings object a view
//!   attaches to a visual object kind.
//! - [`SubscriptionSet`]: the subscriptions owned by one bound scope.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` callbacks and cleaned up lazily during
//! notification, so dropping a [`Subscription`] is enough to disconnect.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod binding;
pub mod observable;

pub use binding::{BindingValue, Bindings, EventHandler, SubscriptionSet};
pub use observable::{Observable, Subscription};
