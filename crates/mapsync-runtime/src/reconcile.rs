#![forbid(unsafe_code)]

//! Incremental binding of collection members.
//!
//! A [`Reconciler`] keeps the last observed snapshot of a collection and, per
//! member identity, the disposal lists of the scopes bound for it. On every
//! update it diffs old against new by reference identity and binds or
//! unbinds exactly the added or removed members.
//!
//! # Invariants
//!
//! 1. Identity is pointer identity of the member's `Rc`, never equality of
//!    its contents.
//! 2. Retained members receive no callbacks. Equal snapshots do no work.
//! 3. A member bound twice (duplicates) owns two disposal lists, released
//!    oldest first.
//! 4. If a member is added while a deletion of the same identity is still
//!    pending in the same pass, the deletion runs first.
//! 5. After a pass the stored snapshot is a shallow copy of the new
//!    sequence, whether or not a callback failed.
//!
//! # Failure Modes
//!
//! - Template failure for one member: that member's partial bindings are
//!   disposed, the pass continues, the first error is returned.
//! - Disposal failure: collected and returned as the first error; the pass
//!   continues.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::context::{BindingContext, Descendants, DisposalList, ViewModel};
use crate::diff::{DiffStatus, LcsDiff, SequenceDiff};
use crate::error::{BindingError, TeardownError};
use crate::reactive::Observable;

// ---------------------------------------------------------------------------
// ItemRef
// ---------------------------------------------------------------------------

/// A collection member compared by identity.
#[derive(Clone)]
pub struct ItemRef(Rc<dyn Any>);

impl ItemRef {
    /// Wrap a shared member.
    #[must_use]
    pub fn new<T: 'static>(item: Rc<T>) -> Self {
        Self(item)
    }

    /// The member as `T`, if it is one.
    #[must_use]
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.0).downcast::<T>().ok()
    }

    /// Identity key (address of the shared allocation).
    #[must_use]
    pub fn key(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Whether both refer to the same member.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    /// The member as a view model for its child context.
    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        Rc::clone(&self.0)
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for ItemRef {}

impl fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemRef({:#x})", self.key())
    }
}

/// Where the members of a `mapItems` binding come from.
#[derive(Clone, Debug)]
pub enum ItemsSource {
    /// A fixed list, bound once.
    Static(Vec<ItemRef>),
    /// A live list, reconciled on every change.
    Observable(Observable<Vec<ItemRef>>),
}

impl ItemsSource {
    /// Current members.
    #[must_use]
    pub fn items(&self) -> Vec<ItemRef> {
        match self {
            Self::Static(items) => items.clone(),
            Self::Observable(items) => items.get(),
        }
    }

    /// Whether the source can change.
    #[must_use]
    pub const fn is_observable(&self) -> bool {
        matches!(self, Self::Observable(_))
    }
}

impl From<Vec<ItemRef>> for ItemsSource {
    fn from(value: Vec<ItemRef>) -> Self {
        Self::Static(value)
    }
}

impl From<Observable<Vec<ItemRef>>> for ItemsSource {
    fn from(value: Observable<Vec<ItemRef>>) -> Self {
        Self::Observable(value)
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Members bound.
    pub added: usize,
    /// Members unbound.
    pub deleted: usize,
}

impl ReconcileReport {
    /// Whether the pass touched nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added == 0 && self.deleted == 0
    }
}

/// Binds and unbinds collection members as the collection changes.
pub struct Reconciler<D = LcsDiff> {
    context: BindingContext,
    template: Rc<dyn Descendants>,
    diff: D,
    snapshot: Vec<ItemRef>,
    scopes: AHashMap<usize, VecDeque<DisposalList>>,
}

impl<D: SequenceDiff> Reconciler<D> {
    /// Create a reconciler that binds each member with `template` in a
    /// child of `context`.
    #[must_use]
    pub fn new(context: BindingContext, template: Rc<dyn Descendants>, diff: D) -> Self {
        Self {
            context,
            template,
            diff,
            snapshot: Vec::new(),
            scopes: AHashMap::new(),
        }
    }

    /// Bind every member of the initial collection.
    pub fn bind_initial(&mut self, items: &[ItemRef]) -> Result<ReconcileReport, BindingError> {
        let span = tracing::debug_span!("reconcile_initial", items = items.len());
        let _enter = span.enter();

        let mut first_error = None;
        for item in items {
            if let Err(err) = self.bind_item(item) {
                first_error.get_or_insert(err);
            }
        }
        self.snapshot = items.to_vec();
        tracing::debug!(added = items.len(), "initial members bound");
        match first_error {
            Some(err) => Err(err),
            None => Ok(ReconcileReport {
                added: items.len(),
                deleted: 0,
            }),
        }
    }

    /// Reconcile against a new snapshot.
    pub fn update(&mut self, items: &[ItemRef]) -> Result<ReconcileReport, BindingError> {
        if self.snapshot.as_slice() == items {
            return Ok(ReconcileReport::default());
        }
        let span = tracing::debug_span!(
            "reconcile",
            old = self.snapshot.len(),
            new = items.len()
        );
        let _enter = span.enter();

        let script = self.diff.diff(&self.snapshot, items, &ItemRef::same);

        let mut pending: AHashMap<usize, usize> = AHashMap::new();
        for entry in &script {
            if entry.status == DiffStatus::Deleted {
                *pending.entry(entry.value.key()).or_default() += 1;
            }
        }

        let mut report = ReconcileReport::default();
        let mut first_error: Option<BindingError> = None;
        for entry in script {
            let key = entry.value.key();
            match entry.status {
                DiffStatus::Retained => {}
                DiffStatus::Deleted => {
                    let Some(remaining) = pending.get_mut(&key) else {
                        continue;
                    };
                    if *remaining == 0 {
                        // Already torn down ahead of a re-add.
                        continue;
                    }
                    *remaining -= 1;
                    if let Err(err) = self.unbind_item(&entry.value) {
                        first_error.get_or_insert(err.into());
                    }
                    report.deleted += 1;
                }
                DiffStatus::Added => {
                    if let Some(remaining) = pending.get_mut(&key).filter(|n| **n > 0) {
                        *remaining -= 1;
                        if let Err(err) = self.unbind_item(&entry.value) {
                            first_error.get_or_insert(err.into());
                        }
                        report.deleted += 1;
                    }
                    if let Err(err) = self.bind_item(&entry.value) {
                        first_error.get_or_insert(err);
                    }
                    report.added += 1;
                }
            }
        }

        self.snapshot = items.to_vec();
        tracing::debug!(
            added = report.added,
            deleted = report.deleted,
            bound = self.bound_count(),
            "collection reconciled"
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Unbind every member, oldest scope first.
    pub fn dispose_all(&mut self) -> Result<(), TeardownError> {
        let mut failures = Vec::new();
        for item in std::mem::take(&mut self.snapshot) {
            if let Err(err) = self.unbind_item(&item) {
                failures.extend(err.failures);
            }
        }
        for (_, lists) in self.scopes.drain() {
            for list in lists {
                if let Err(err) = list.dispose(None) {
                    failures.extend(err.failures);
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownError { failures })
        }
    }

    /// Number of bound member scopes.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.scopes.values().map(VecDeque::len).sum()
    }

    /// The last reconciled snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &[ItemRef] {
        &self.snapshot
    }

    fn bind_item(&mut self, item: &ItemRef) -> Result<(), BindingError> {
        let list = DisposalList::new();
        let view_model = item.view_model();
        let child = self.context.child(Rc::clone(&view_model), list.clone());
        match self.template.apply(&child) {
            Ok(_) => {
                self.scopes.entry(item.key()).or_default().push_back(list);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "member template failed; disposing partial bindings");
                if let Err(teardown) = list.dispose(Some(&view_model)) {
                    tracing::warn!(error = %teardown, "partial member teardown failed");
                }
                Err(err)
            }
        }
    }

    fn unbind_item(&mut self, item: &ItemRef) -> Result<(), TeardownError> {
        let key = item.key();
        let Some(queue) = self.scopes.get_mut(&key) else {
            tracing::debug!(?item, "unbind of a member with no scope");
            return Ok(());
        };
        let list = queue.pop_front();
        if queue.is_empty() {
            self.scopes.remove(&key);
        }
        match list {
            Some(list) => list.dispose(Some(&item.view_model())).map(|_| ()),
            None => Ok(()),
        }
    }
}

impl<D> fmt::Debug for Reconciler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("snapshot", &self.snapshot.len())
            .field("scopes", &self.scopes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_core::api::Content;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Template that records bind/unbind of each `&'static str` member.
    fn recording_template(log: &Log) -> Rc<dyn Descendants> {
        let log = Rc::clone(log);
        Rc::new(move |ctx: &BindingContext| -> Result<Option<Content>, BindingError> {
            let name = ctx
                .data()
                .and_then(|vm| vm.downcast_ref::<&'static str>())
                .copied()
                .unwrap_or("?");
            log.borrow_mut().push(format!("bind {name}"));
            let log = Rc::clone(&log);
            ctx.remove_handlers().push(move |_| {
                log.borrow_mut().push(format!("unbind {name}"));
                Ok(())
            });
            Ok(None)
        })
    }

    fn items(names: &[&'static str]) -> Vec<ItemRef> {
        names.iter().map(|n| ItemRef::new(Rc::new(*n))).collect()
    }

    #[test]
    fn identity_not_equality() {
        let a = ItemRef::new(Rc::new(1));
        let b = ItemRef::new(Rc::new(1));
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
        assert_ne!(a, b);
        assert_eq!(a.downcast::<i32>().as_deref(), Some(&1));
        assert!(a.downcast::<u8>().is_none());
    }

    #[test]
    fn delete_and_add_only_touch_changed_members() {
        let log = Log::default();
        let mut rec = Reconciler::new(BindingContext::root(), recording_template(&log), LcsDiff);
        let abc = items(&["a", "b", "c"]);
        rec.bind_initial(&abc).unwrap();
        log.borrow_mut().clear();

        let d = items(&["d"]).remove(0);
        let next = vec![abc[0].clone(), abc[2].clone(), d];
        let report = rec.update(&next).unwrap();

        assert_eq!(report, ReconcileReport { added: 1, deleted: 1 });
        assert_eq!(*log.borrow(), ["unbind b", "bind d"]);
        assert_eq!(rec.bound_count(), 3);
        assert_eq!(rec.snapshot(), next.as_slice());
    }

    #[test]
    fn moved_member_is_released_before_it_is_rebound() {
        let log = Log::default();
        let mut rec = Reconciler::new(BindingContext::root(), recording_template(&log), LcsDiff);
        let xya = items(&["x", "y", "a"]);
        rec.bind_initial(&xya).unwrap();
        log.borrow_mut().clear();

        let next = vec![xya[2].clone(), xya[0].clone(), xya[1].clone()];
        let report = rec.update(&next).unwrap();

        assert_eq!(report, ReconcileReport { added: 1, deleted: 1 });
        assert_eq!(*log.borrow(), ["unbind a", "bind a"]);
        assert_eq!(rec.bound_count(), 3);
        assert_eq!(rec.snapshot(), next.as_slice());
    }

    #[test]
    fn equal_snapshot_short_circuits() {
        let log = Log::default();
        let mut rec = Reconciler::new(BindingContext::root(), recording_template(&log), LcsDiff);
        let abc = items(&["a", "b", "c"]);
        rec.bind_initial(&abc).unwrap();
        log.borrow_mut().clear();

        assert!(rec.update(&abc.clone()).unwrap().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn duplicates_release_oldest_first() {
        let log = Log::default();
        let mut rec = Reconciler::new(BindingContext::root(), recording_template(&log), LcsDiff);
        let a = items(&["a"]).remove(0);
        rec.bind_initial(&[a.clone(), a.clone()]).unwrap();
        assert_eq!(rec.bound_count(), 2);

        rec.update(&[a.clone()]).unwrap();
        assert_eq!(rec.bound_count(), 1);
        rec.dispose_all().unwrap();
        assert_eq!(rec.bound_count(), 0);
        assert_eq!(
            *log.borrow(),
            ["bind a", "bind a", "unbind a", "unbind a"]
        );
    }

    #[test]
    fn failed_template_is_disposed_and_reported() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = Rc::clone(&calls);
        let template = move |ctx: &BindingContext| -> Result<Option<Content>, BindingError> {
            let c = Rc::clone(&c);
            ctx.remove_handlers().push(move |_| {
                c.borrow_mut().push("partial teardown");
                Ok(())
            });
            Err(BindingError::Template("bad item".into()))
        };
        let mut rec = Reconciler::new(BindingContext::root(), Rc::new(template), LcsDiff);
        let err = rec.bind_initial(&items(&["x", "y"])).unwrap_err();

        assert!(matches!(err, BindingError::Template(_)));
        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(rec.bound_count(), 0);
        assert_eq!(rec.snapshot().len(), 2);
    }
}
