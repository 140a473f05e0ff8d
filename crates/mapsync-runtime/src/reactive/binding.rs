#![forbid(unsafe_code)]

//! Declarative bindings objects and subscription lifetimes.
//!
//! A [`Bindings`] value is the declarative object a view attaches to a visual
//! object kind: an insertion-ordered set of named entries, each either a
//! plain [`Value`], an [`Observable`] the binding keeps in sync, an event
//! handler, or an anchor marker.
//!
//! # Usage
//!
//! ```ignore
//! let center = Observable::new(Value::from(Position::new(48.85, 2.35)));
//! let bindings = Bindings::new()
//!     .with("center", center.clone())
//!     .with("zoom", 12)
//!     .with("click", BindingValue::handler(|event| event.stop()));
//!
//! assert!(bindings.is_observable("center"));
//! assert_eq!(bindings.value("zoom"), Some(Value::from(12)));
//! ```
//!
//! # Invariants
//!
//! 1. [`Bindings::value`] unwraps exactly one level of observable
//!    indirection.
//! 2. Handlers and anchors are never reported as values.
//! 3. Cloning a `Bindings` shares its observables (handles, not copies).
//! 4. A [`SubscriptionSet`] releases its subscriptions in reverse
//!    registration order on drop.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use mapsync_core::api::MarkerObject;
use mapsync_core::transform::boolify;
use mapsync_core::{Bounds, Position, Size, Value};

use super::observable::{Observable, Subscription};
use crate::events::MouseEvent;

/// User-supplied event handler.
pub type EventHandler = Rc<dyn Fn(&MouseEvent<'_>)>;

// ---------------------------------------------------------------------------
// BindingValue
// ---------------------------------------------------------------------------

/// One entry of a [`Bindings`] object.
#[derive(Clone)]
pub enum BindingValue {
    /// A plain value, read once.
    Static(Value),
    /// A reactive value kept in sync with the external object.
    Observable(Observable<Value>),
    /// An event handler.
    Handler(EventHandler),
    /// A marker used as an info-window anchor.
    Anchor(Rc<dyn MarkerObject>),
}

impl BindingValue {
    /// Wrap a closure as an event handler.
    pub fn handler(f: impl Fn(&MouseEvent<'_>) + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    /// Whether this entry is reactive.
    #[must_use]
    pub const fn is_observable(&self) -> bool {
        matches!(self, Self::Observable(_))
    }

    /// Current value, unwrapping one level of observable indirection.
    #[must_use]
    pub fn unwrap_value(&self) -> Option<Value> {
        match self {
            Self::Static(v) => Some(v.clone()),
            Self::Observable(obs) => Some(obs.get()),
            Self::Handler(_) | Self::Anchor(_) => None,
        }
    }
}

impl fmt::Debug for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Observable(obs) => f.debug_tuple("Observable").field(obs).finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::Anchor(_) => f.write_str("Anchor"),
        }
    }
}

macro_rules! static_binding_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for BindingValue {
                fn from(value: $ty) -> Self {
                    Self::Static(Value::from(value))
                }
            }
        )*
    };
}

static_binding_from!(bool, f64, i32, &str, String, Position, Bounds, Size);

impl From<Value> for BindingValue {
    fn from(value: Value) -> Self {
        Self::Static(value)
    }
}

impl From<Observable<Value>> for BindingValue {
    fn from(value: Observable<Value>) -> Self {
        Self::Observable(value)
    }
}

impl From<&Observable<Value>> for BindingValue {
    fn from(value: &Observable<Value>) -> Self {
        Self::Observable(value.clone())
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A declarative bindings object.
#[derive(Clone, Default, Debug)]
pub struct Bindings {
    entries: IndexMap<String, BindingValue>,
}

impl Bindings {
    /// Create an empty bindings object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<BindingValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<BindingValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Raw entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindingValue> {
        self.entries.get(name)
    }

    /// Current value of an entry, unwrapping an observable.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(BindingValue::unwrap_value)
    }

    /// The entry's observable, if it is reactive.
    #[must_use]
    pub fn observable(&self, name: &str) -> Option<&Observable<Value>> {
        match self.get(name) {
            Some(BindingValue::Observable(obs)) => Some(obs),
            _ => None,
        }
    }

    /// The entry's handler, if it is one.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        match self.get(name) {
            Some(BindingValue::Handler(handler)) => Some(handler),
            _ => None,
        }
    }

    /// The entry's anchor marker, if it is one.
    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<&Rc<dyn MarkerObject>> {
        match self.get(name) {
            Some(BindingValue::Anchor(marker)) => Some(marker),
            _ => None,
        }
    }

    /// Whether the entry is reactive.
    #[must_use]
    pub fn is_observable(&self, name: &str) -> bool {
        self.get(name).is_some_and(BindingValue::is_observable)
    }

    /// Truthiness of the entry's current value; absent entries are falsy.
    #[must_use]
    pub fn is_truthy(&self, name: &str) -> bool {
        self.value(name).is_some_and(|v| boolify(&v))
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SubscriptionSet
// ---------------------------------------------------------------------------

/// Collects the observable subscriptions of one bound scope.
///
/// When the set is cleared or dropped every held subscription is released,
/// disconnecting the push paths that belonged to the scope.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the set is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to `source` and hold the subscription.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let sub = source.subscribe(callback);
        self.subscriptions.push(sub);
        self
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything, newest first.
    pub fn clear(&mut self) {
        while let Some(sub) = self.subscriptions.pop() {
            drop(sub);
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn value_unwraps_observable() {
        let zoom = Observable::new(Value::from(4));
        let bindings = Bindings::new().with("zoom", &zoom).with("title", "home");

        assert_eq!(bindings.value("zoom"), Some(Value::from(4)));
        zoom.set(Value::from(9));
        assert_eq!(bindings.value("zoom"), Some(Value::from(9)));
        assert_eq!(bindings.value("title"), Some(Value::from("home")));
        assert_eq!(bindings.value("missing"), None);
    }

    #[test]
    fn handlers_are_not_values() {
        let bindings = Bindings::new().with("click", BindingValue::handler(|_| {}));
        assert!(bindings.handler("click").is_some());
        assert_eq!(bindings.value("click"), None);
        assert!(!bindings.is_truthy("click"));
    }

    #[test]
    fn observability_is_reported_per_entry() {
        let bindings = Bindings::new()
            .with("center", Observable::new(Value::from(Position::new(1.0, 2.0))))
            .with("zoom", 3);
        assert!(bindings.is_observable("center"));
        assert!(!bindings.is_observable("zoom"));
        assert!(bindings.observable("zoom").is_none());
    }

    #[test]
    fn truthiness_reads_current_value() {
        let pan = Observable::new(Value::Bool(true));
        let bindings = Bindings::new().with("panCenter", &pan);
        assert!(bindings.is_truthy("panCenter"));
        pan.set(Value::Bool(false));
        assert!(!bindings.is_truthy("panCenter"));
        assert!(!bindings.is_truthy("absent"));
    }

    #[test]
    fn names_keep_insertion_order() {
        let bindings = Bindings::new().with("b", 1).with("a", 2).with("c", 3);
        assert_eq!(bindings.names().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn subscription_set_releases_on_clear() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let mut set = SubscriptionSet::new();
        let s = Rc::clone(&seen);
        set.subscribe(&obs, move |v| s.set(*v));
        assert_eq!(set.len(), 1);

        obs.set(5);
        set.clear();
        obs.set(9);
        assert_eq!(seen.get(), 5);
        assert!(set.is_empty());
    }

    #[test]
    fn subscription_set_releases_on_drop() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        {
            let mut set = SubscriptionSet::new();
            let s = Rc::clone(&seen);
            set.hold(obs.subscribe(move |v| s.set(*v)));
            obs.set(1);
        }
        obs.set(2);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn debug_format() {
        let mut set = SubscriptionSet::new();
        let obs = Observable::new(0);
        set.subscribe(&obs, |_| {});
        set.subscribe(&obs, |_| {});
        assert!(format!("{set:?}").contains("len: 2"));
    }
}
