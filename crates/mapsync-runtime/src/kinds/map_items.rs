#![forbid(unsafe_code)]

//! The `mapItems` binding.
//!
//! Binds the element's template once per collection member, each in a child
//! context whose `$data` is the member. An observable source is reconciled
//! on every change; only added and removed members are touched.
//!
//! A member template may change the same collection while a pass is running.
//! The change is recorded and one more pass runs against the latest snapshot
//! once the current one finishes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{BindingAccessor, BindingHandler, InitOutcome};
use crate::context::{BindingContext, Descendants, DisposalList};
use crate::diff::{LcsDiff, SequenceDiff};
use crate::error::BindingError;
use crate::reactive::Observable;
use crate::reconcile::{ItemRef, ItemsSource, Reconciler};

/// The `mapItems` binding handler.
#[derive(Debug, Clone, Default)]
pub struct MapItemsBinding<D = LcsDiff> {
    diff: D,
}

impl<D: SequenceDiff + Clone + 'static> MapItemsBinding<D> {
    /// Binding name.
    pub const NAME: &'static str = "mapItems";

    /// A handler reconciling with `diff`.
    #[must_use]
    pub fn new(diff: D) -> Self {
        Self { diff }
    }

    /// Bind every member of `source` with `template`.
    ///
    /// On failure of the initial pass everything already bound is disposed
    /// and the first error is returned.
    pub fn bind(
        &self,
        context: &BindingContext,
        source: &ItemsSource,
        template: Rc<dyn Descendants>,
    ) -> Result<Rc<RefCell<Reconciler<D>>>, BindingError> {
        let reconciler = Rc::new(RefCell::new(Reconciler::new(
            context.with_remove_handlers(DisposalList::new()),
            template,
            self.diff.clone(),
        )));
        let pending = Rc::new(Cell::new(false));

        let subscription = match source {
            ItemsSource::Static(_) => None,
            ItemsSource::Observable(items) => Some(items.subscribe(rerun_on_change(
                &reconciler,
                items,
                &pending,
            ))),
        };

        let initial = reconciler.borrow_mut().bind_initial(&source.items());
        if let Err(err) = initial {
            drop(subscription);
            if let Err(teardown) = reconciler.borrow_mut().dispose_all() {
                tracing::warn!(error = %teardown, "mapItems rollback failed");
            }
            return Err(err);
        }
        if let ItemsSource::Observable(items) = source {
            drain(&mut reconciler.borrow_mut(), items, &pending);
        }

        let owned = Rc::clone(&reconciler);
        context.remove_handlers().push(move |_| {
            drop(subscription);
            let Ok(mut reconciler) = owned.try_borrow_mut() else {
                return Err(BindingError::Reentrant { kind: Self::NAME });
            };
            reconciler.dispose_all().map_err(BindingError::from)
        });
        Ok(reconciler)
    }
}

fn rerun_on_change<D: SequenceDiff + 'static>(
    reconciler: &Rc<RefCell<Reconciler<D>>>,
    source: &Observable<Vec<ItemRef>>,
    pending: &Rc<Cell<bool>>,
) -> impl Fn(&Vec<ItemRef>) + 'static {
    let weak = Rc::downgrade(reconciler);
    let source = source.clone();
    let pending = Rc::clone(pending);
    move |next: &Vec<ItemRef>| {
        let Some(reconciler) = weak.upgrade() else {
            return;
        };
        let Ok(mut reconciler) = reconciler.try_borrow_mut() else {
            tracing::trace!("mapItems change during a running pass; deferred");
            pending.set(true);
            return;
        };
        if let Err(err) = reconciler.update(next) {
            tracing::warn!(error = %err, "mapItems update failed");
        }
        drain(&mut reconciler, &source, &pending);
    }
}

/// Run passes until no change arrived during the last one.
fn drain<D: SequenceDiff>(
    reconciler: &mut Reconciler<D>,
    source: &Observable<Vec<ItemRef>>,
    pending: &Cell<bool>,
) {
    while pending.replace(false) {
        if let Err(err) = reconciler.update(&source.get()) {
            tracing::warn!(error = %err, "mapItems update failed");
        }
    }
}

impl<D: SequenceDiff + Clone + 'static> BindingHandler for MapItemsBinding<D> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(
        &self,
        context: &BindingContext,
        accessor: &BindingAccessor,
        descendants: Rc<dyn Descendants>,
    ) -> Result<InitOutcome, BindingError> {
        let source = accessor.items(Self::NAME)?;
        self.bind(context, source, descendants)?;
        Ok(InitOutcome::controls_descendants())
    }

    fn allows_virtual_elements(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_core::api::Content;

    type Log = Rc<RefCell<Vec<String>>>;

    fn label(ctx: &BindingContext) -> String {
        ctx.data()
            .and_then(|vm| vm.downcast_ref::<String>())
            .cloned()
            .unwrap_or_default()
    }

    fn recording(log: &Log) -> Rc<dyn Descendants> {
        let log = Rc::clone(log);
        Rc::new(move |ctx: &BindingContext| -> Result<Option<Content>, BindingError> {
            let name = label(ctx);
            log.borrow_mut().push(format!("+{name}"));
            let log = Rc::clone(&log);
            ctx.remove_handlers().push(move |_| {
                log.borrow_mut().push(format!("-{name}"));
                Ok(())
            });
            Ok(None)
        })
    }

    fn item(name: &str) -> ItemRef {
        ItemRef::new(Rc::new(name.to_owned()))
    }

    #[test]
    fn static_source_binds_once_and_tears_down() {
        let log = Log::default();
        let ctx = BindingContext::root();
        let source = ItemsSource::from(vec![item("a"), item("b")]);
        let reconciler = MapItemsBinding::<LcsDiff>::default()
            .bind(&ctx, &source, recording(&log))
            .unwrap();
        assert_eq!(reconciler.borrow().bound_count(), 2);

        ctx.remove_handlers().dispose(None).unwrap();
        assert_eq!(*log.borrow(), ["+a", "+b", "-a", "-b"]);
        assert_eq!(reconciler.borrow().bound_count(), 0);
    }

    #[test]
    fn observable_source_follows_changes() {
        let log = Log::default();
        let ctx = BindingContext::root();
        let (a, b, c) = (item("a"), item("b"), item("c"));
        let items = Observable::new(vec![a.clone(), b.clone()]);
        let reconciler = MapItemsBinding::new(LcsDiff)
            .bind(&ctx, &ItemsSource::from(items.clone()), recording(&log))
            .unwrap();
        log.borrow_mut().clear();

        items.set(vec![b, c]);
        assert_eq!(*log.borrow(), ["-a", "+c"]);

        ctx.remove_handlers().dispose(None).unwrap();
        log.borrow_mut().clear();
        items.set(vec![a]);
        assert!(log.borrow().is_empty());
        assert_eq!(reconciler.borrow().bound_count(), 0);
        assert_eq!(items.subscriber_count(), 0);
    }

    #[test]
    fn dropped_context_releases_members_and_subscription() {
        let log = Log::default();
        let ctx = BindingContext::root();
        let items = Observable::new(vec![item("a")]);
        let reconciler = MapItemsBinding::new(LcsDiff)
            .bind(&ctx, &ItemsSource::from(items.clone()), recording(&log))
            .unwrap();
        assert_eq!(items.subscriber_count(), 1);

        drop(ctx);
        assert_eq!(*log.borrow(), ["+a", "-a"]);
        assert_eq!(items.subscriber_count(), 0);
        assert_eq!(reconciler.borrow().bound_count(), 0);
    }

    #[test]
    fn change_from_a_member_template_gets_a_second_pass() {
        let log = Log::default();
        let items = Observable::new(Vec::new());
        let source = items.clone();
        let inner = recording(&log);
        let template = move |ctx: &BindingContext| -> Result<Option<Content>, BindingError> {
            if label(ctx) == "spawn" {
                source.update(|all| all.push(item("child")));
            }
            inner.apply(ctx)
        };
        let ctx = BindingContext::root();
        let reconciler = MapItemsBinding::new(LcsDiff)
            .bind(&ctx, &ItemsSource::from(items.clone()), Rc::new(template))
            .unwrap();

        items.set(vec![item("spawn")]);
        assert_eq!(*log.borrow(), ["+spawn", "+child"]);
        assert_eq!(reconciler.borrow().bound_count(), 2);
        assert_eq!(reconciler.borrow().snapshot().len(), 2);
    }

    #[test]
    fn failed_initial_pass_rolls_back() {
        let log = Log::default();
        let inner = recording(&log);
        let template = move |ctx: &BindingContext| -> Result<Option<Content>, BindingError> {
            inner.apply(ctx)?;
            if label(ctx) == "bad" {
                return Err(BindingError::Template("bad member".into()));
            }
            Ok(None)
        };
        let ctx = BindingContext::root();
        let source = ItemsSource::from(vec![item("ok"), item("bad")]);
        let err = MapItemsBinding::new(LcsDiff)
            .bind(&ctx, &source, Rc::new(template))
            .unwrap_err();

        assert!(matches!(err, BindingError::Template(_)));
        assert_eq!(*log.borrow(), ["+ok", "+bad", "-bad", "-ok"]);
        assert!(ctx.remove_handlers().is_empty());
    }

    #[test]
    fn handler_rejects_bindings_object() {
        let handler = MapItemsBinding::new(LcsDiff);
        let accessor = BindingAccessor::from(crate::reactive::Bindings::new());
        let err = handler
            .init(&BindingContext::root(), &accessor, Rc::new(crate::context::NoDescendants))
            .unwrap_err();
        assert!(matches!(err, BindingError::UnexpectedValue { .. }));
        assert!(handler.allows_virtual_elements());
    }
}
