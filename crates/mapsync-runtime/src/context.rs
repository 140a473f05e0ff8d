#![forbid(unsafe_code)]

//! Binding contexts and disposal lists.
//!
//! A [`BindingContext`] carries the named values a binding inherits from its
//! ancestors: the enclosing map (`$map`), the enclosing marker (`$marker`),
//! the current data item (`$data`) and the `removeHandlers` list that the
//! enclosing scope runs when it is torn down.
//!
//! # Invariants
//!
//! 1. Extending a context never mutates the parent; it returns a copy.
//! 2. A [`DisposalList`] runs each pushed callback at most once.
//! 3. Callbacks pushed after disposal run immediately.
//! 4. Dropping the last handle of an undisposed list runs its pending
//!    callbacks with no view model.
//!
//! The owner of the root context keeps it alive for as long as the bound
//! objects should exist and calls [`DisposalList::dispose`] on its
//! `removeHandlers` when they should go. Dropping the root instead still
//! tears everything down, but failures can only be logged.
//!
//! # Failure Modes
//!
//! - Callback returns `Err`: logged at `warn`, collected into the
//!   [`TeardownError`], the remaining callbacks still run.
//! - Double dispose: logged at `warn`, returns `Ok(false)`.
//! - Undisposed list dropped with pending callbacks: logged at `warn`, each
//!   failure logged at `warn`. Skipped entirely while panicking.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use mapsync_core::api::{Content, MapCanvas, MarkerObject};

use crate::error::{BindingError, TeardownError};

/// The data item bound to a subtree.
pub type ViewModel = Rc<dyn Any>;

/// A disposal callback. Receives the view model of the scope being removed.
pub type RemoveHandler = Box<dyn FnOnce(Option<&ViewModel>) -> Result<(), BindingError>>;

// ---------------------------------------------------------------------------
// DisposalList
// ---------------------------------------------------------------------------

/// Ordered, run-once list of disposal callbacks.
///
/// Cloning yields another handle to the same list.
#[derive(Clone, Default)]
pub struct DisposalList {
    inner: Rc<ListState>,
}

#[derive(Default)]
struct ListState {
    handlers: RefCell<Vec<RemoveHandler>>,
    disposed: Cell<bool>,
}

impl Drop for ListState {
    fn drop(&mut self) {
        let handlers = std::mem::take(self.handlers.get_mut());
        if self.disposed.get() || handlers.is_empty() {
            return;
        }
        if std::thread::panicking() {
            tracing::warn!(
                pending = handlers.len(),
                "undisposed disposal list dropped while panicking; callbacks skipped"
            );
            return;
        }
        tracing::warn!(
            pending = handlers.len(),
            "disposal list dropped without dispose; running pending callbacks"
        );
        self.disposed.set(true);
        for handler in handlers {
            if let Err(err) = handler(None) {
                tracing::warn!(error = %err, "disposal callback failed on drop");
            }
        }
    }
}

impl DisposalList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback. After disposal the callback runs immediately.
    pub fn push(
        &self,
        handler: impl FnOnce(Option<&ViewModel>) -> Result<(), BindingError> + 'static,
    ) {
        if self.inner.disposed.get() {
            if let Err(err) = handler(None) {
                tracing::warn!(error = %err, "late disposal callback failed");
            }
            return;
        }
        self.inner.handlers.borrow_mut().push(Box::new(handler));
    }

    /// Number of pending callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.handlers.borrow().is_empty()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Run every pending callback in registration order.
    ///
    /// Returns `Ok(true)` on the first call, `Ok(false)` on any later call.
    /// Every callback runs even when an earlier one fails.
    pub fn dispose(&self, view_model: Option<&ViewModel>) -> Result<bool, TeardownError> {
        if self.inner.disposed.replace(true) {
            tracing::warn!("disposal list already disposed");
            return Ok(false);
        }
        let handlers = std::mem::take(&mut *self.inner.handlers.borrow_mut());
        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(err) = handler(view_model) {
                tracing::warn!(error = %err, "disposal callback failed");
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(true)
        } else {
            Err(TeardownError { failures })
        }
    }
}

impl fmt::Debug for DisposalList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposalList")
            .field("pending", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BindingContext
// ---------------------------------------------------------------------------

/// Named values inherited by a binding from its ancestors.
#[derive(Clone, Default)]
pub struct BindingContext {
    map: Option<Rc<dyn MapCanvas>>,
    marker: Option<Rc<dyn MarkerObject>>,
    data: Option<ViewModel>,
    remove_handlers: DisposalList,
}

impl BindingContext {
    /// A root context with no ancestors.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// The enclosing map, if any.
    #[must_use]
    pub fn map(&self) -> Option<&Rc<dyn MapCanvas>> {
        self.map.as_ref()
    }

    /// The enclosing marker, if any.
    #[must_use]
    pub fn marker(&self) -> Option<&Rc<dyn MarkerObject>> {
        self.marker.as_ref()
    }

    /// The data item bound to this subtree.
    #[must_use]
    pub fn data(&self) -> Option<&ViewModel> {
        self.data.as_ref()
    }

    /// The disposal list run when the enclosing scope is removed.
    #[must_use]
    pub fn remove_handlers(&self) -> &DisposalList {
        &self.remove_handlers
    }

    /// A copy with `$map` set.
    #[must_use]
    pub fn extend_map(&self, map: Rc<dyn MapCanvas>) -> Self {
        Self {
            map: Some(map),
            ..self.clone()
        }
    }

    /// A copy with `$marker` set.
    #[must_use]
    pub fn extend_marker(&self, marker: Rc<dyn MarkerObject>) -> Self {
        Self {
            marker: Some(marker),
            ..self.clone()
        }
    }

    /// A copy with a different `removeHandlers` list.
    #[must_use]
    pub fn with_remove_handlers(&self, remove_handlers: DisposalList) -> Self {
        Self {
            remove_handlers,
            ..self.clone()
        }
    }

    /// A child context for one collection member.
    #[must_use]
    pub fn child(&self, data: ViewModel, remove_handlers: DisposalList) -> Self {
        Self {
            data: Some(data),
            remove_handlers,
            ..self.clone()
        }
    }

    /// The enclosing map, or a [`BindingError::MissingAncestor`] for `binding`.
    pub fn require_map(&self, binding: &'static str) -> Result<&Rc<dyn MapCanvas>, BindingError> {
        self.map.as_ref().ok_or(BindingError::MissingAncestor {
            binding,
            ancestor: "map",
        })
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("has_map", &self.map.is_some())
            .field("has_marker", &self.marker.is_some())
            .field("has_data", &self.data.is_some())
            .field("remove_handlers", &self.remove_handlers)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Descendants
// ---------------------------------------------------------------------------

/// Applies bindings to the subtree under a bound element.
///
/// The returned content, if any, is what an info window displays.
pub trait Descendants {
    /// Bind the subtree in `context`.
    fn apply(&self, context: &BindingContext) -> Result<Option<Content>, BindingError>;
}

impl<F> Descendants for F
where
    F: Fn(&BindingContext) -> Result<Option<Content>, BindingError>,
{
    fn apply(&self, context: &BindingContext) -> Result<Option<Content>, BindingError> {
        self(context)
    }
}

/// A subtree with nothing to bind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDescendants;

impl Descendants for NoDescendants {
    fn apply(&self, _context: &BindingContext) -> Result<Option<Content>, BindingError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> RemoveHandler {
        let log = Rc::clone(log);
        Box::new(move |_| {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    #[test]
    fn dispose_runs_in_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = DisposalList::new();
        list.push(recording(&log, "a"));
        list.push(recording(&log, "b"));

        assert!(matches!(list.dispose(None), Ok(true)));
        assert!(matches!(list.dispose(None), Ok(false)));
        assert_eq!(*log.borrow(), ["a", "b"]);
        assert!(list.is_empty());
    }

    #[test]
    fn failures_do_not_stop_teardown() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = DisposalList::new();
        list.push(|_| Err(BindingError::Template("first".into())));
        list.push(recording(&log, "second"));
        list.push(|_| Err(BindingError::Template("third".into())));

        let err = list.dispose(None).unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert_eq!(*log.borrow(), ["second"]);
    }

    #[test]
    fn late_push_runs_immediately() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = DisposalList::new();
        list.dispose(None).unwrap();
        list.push(recording(&log, "late"));
        assert_eq!(*log.borrow(), ["late"]);
    }

    #[test]
    fn dropping_the_last_handle_runs_pending_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = DisposalList::new();
        let other = list.clone();
        list.push(recording(&log, "a"));
        list.push(|_| Err(BindingError::Template("broken".into())));
        list.push(recording(&log, "b"));

        drop(list);
        assert!(log.borrow().is_empty());
        drop(other);
        assert_eq!(*log.borrow(), ["a", "b"]);
    }

    #[test]
    fn dropping_a_disposed_list_runs_nothing_again() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = DisposalList::new();
        list.push(recording(&log, "once"));
        list.dispose(None).unwrap();
        drop(list);
        assert_eq!(*log.borrow(), ["once"]);
    }

    #[test]
    fn view_model_is_passed_through() {
        let seen = Rc::new(Cell::new(0));
        let list = DisposalList::new();
        let s = Rc::clone(&seen);
        list.push(move |vm| {
            let value = vm.and_then(|vm| vm.downcast_ref::<i32>()).copied();
            s.set(value.unwrap_or(-1));
            Ok(())
        });
        let vm: ViewModel = Rc::new(42_i32);
        list.dispose(Some(&vm)).unwrap();
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn root_context_has_no_map() {
        let ctx = BindingContext::root();
        let err = ctx.require_map("marker").err().unwrap();
        assert!(matches!(
            err,
            BindingError::MissingAncestor {
                binding: "marker",
                ancestor: "map"
            }
        ));
    }

    #[test]
    fn child_keeps_ancestors_and_swaps_handlers() {
        let parent = BindingContext::root();
        let handlers = DisposalList::new();
        handlers.push(|_| Ok(()));
        let child = parent.child(Rc::new("item"), handlers);
        assert!(child.data().is_some());
        assert_eq!(child.remove_handlers().len(), 1);
        assert!(parent.data().is_none());
        assert!(parent.remove_handlers().is_empty());
    }

    #[test]
    fn closures_are_descendants() {
        let apply = |_: &BindingContext| -> Result<Option<Content>, BindingError> {
            Ok(Some(Rc::new("content") as Content))
        };
        assert!(apply.apply(&BindingContext::root()).unwrap().is_some());
        assert!(NoDescendants.apply(&BindingContext::root()).unwrap().is_none());
    }
}
