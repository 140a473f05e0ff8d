#![forbid(unsafe_code)]

//! Two-way bindings between observable application state and an
//! externally-owned map object graph.
//!
//! # Role in mapsync
//! `mapsync-runtime` is the binding layer. It assembles construction options
//! from a declarative [`Bindings`] object, constructs the external object
//! through a [`MapsApi`](mapsync_core::api::MapsApi), wires push and pull
//! paths through per-property [`SyncGuard`]s, and tears everything down
//! exactly once.
//!
//! # Primary responsibilities
//! - **Lifecycle**: build options, construct, wire, dispose
//!   ([`LifecycleController`]).
//! - **Synchronization**: reentrancy-guarded push/pull per property
//!   ([`guard`], [`wiring`]).
//! - **Collections**: incremental bind/unbind of collection members
//!   ([`diff`], [`reconcile`]).
//! - **Events**: user handlers for mouse events ([`events`]).
//!
//! # How it fits in the system
//! `mapsync-core` supplies the value types and the mapping-API traits. A host
//! implements those traits and drives bindings through a
//! [`BindingRegistry`]. Nothing here is thread-safe; everything runs on the
//! host's single UI thread.

pub mod config;
pub mod context;
pub mod descriptor;
pub mod diff;
pub mod error;
pub mod events;
pub mod guard;
pub mod kinds;
pub mod lifecycle;
pub mod options;
pub mod reactive;
pub mod reconcile;
pub mod registry;
pub mod scope;
pub mod wiring;

pub use config::BindingDefaults;
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use context::{BindingContext, Descendants, DisposalList, NoDescendants, ViewModel};
pub use descriptor::{BindingDescriptor, DescriptorTable};
pub use diff::{DiffStatus, Difference, LcsDiff, MoveAwareDiff, SequenceDiff};
pub use error::{BindingError, TeardownError};
pub use events::MouseEvent;
pub use guard::{GuardTable, SyncDirection, SyncGuard};
pub use kinds::{
    BindingAccessor, BindingHandler, InfoWindowBinding, InitOutcome, MapBinding, MapItemsBinding,
    MarkerBinding,
};
pub use lifecycle::{Bound, LifecycleController, VisualKind};
pub use reactive::{BindingValue, Bindings, EventHandler, Observable, Subscription};
pub use reconcile::{ItemRef, ItemsSource, ReconcileReport, Reconciler};
pub use registry::BindingRegistry;
pub use scope::{BoundScope, ScopeId, ScopeState};
