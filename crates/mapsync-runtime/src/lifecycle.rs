#![forbid(unsafe_code)]

//! Three-phase binding lifecycle.
//!
//! [`LifecycleController::bind`] drives one visual object from bindings to a
//! live, synchronized external object:
//!
//! 1. **Build options**: every descriptor's `on_build_options`, in order.
//! 2. **Construct**: one call into the mapping API.
//! 3. **Wire**: every descriptor's `on_created`, in order.
//!
//! The teardown closure is pushed onto the context's `removeHandlers` list.
//! It owns the [`BoundScope`] and runs, in order: the scope's own child
//! list, every `on_removed` hook, the kind's implicit detach, and finally
//! listener and subscription release.
//!
//! # Failure Modes
//!
//! - Missing ancestor: returned before anything is constructed.
//! - Construction failure: returned as [`BindingError::Construction`];
//!   nothing is registered for teardown.
//! - Removal hook failure: collected; the remaining steps still run.

use std::fmt;
use std::rc::Rc;

use mapsync_core::Options;
use mapsync_core::api::{Content, EventTarget, MapsApi};

use crate::context::{BindingContext, DisposalList, ViewModel};
use crate::descriptor::DescriptorTable;
use crate::error::{BindingError, TeardownError};
use crate::reactive::Bindings;
use crate::scope::{BoundScope, ScopeId, ScopeLifecycle, ScopeState};

/// A kind of visual object the mapping API can construct.
pub trait VisualKind: 'static {
    /// The external object type.
    type Object: ?Sized + EventTarget + 'static;

    /// Binding name, used in errors and logs.
    const NAME: &'static str;

    /// Check the enclosing context before anything is built.
    fn check_context(context: &BindingContext) -> Result<(), BindingError>;

    /// Construct the external object from the assembled options.
    fn construct(
        api: &dyn MapsApi,
        context: &BindingContext,
        options: &Options,
        content: Option<Content>,
    ) -> Result<Rc<Self::Object>, BindingError>;

    /// Implicit detach step run after the removal hooks.
    fn detach(scope: &BoundScope<Self::Object>);
}

/// Handles returned by a successful [`LifecycleController::bind`].
pub struct Bound<O: ?Sized> {
    /// Scope identifier.
    pub id: ScopeId,
    /// The constructed external object.
    pub object: Rc<O>,
    /// The `removeHandlers` list for child bindings of this object.
    pub children: DisposalList,
}

impl<O: ?Sized> fmt::Debug for Bound<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("id", &self.id)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Drives binding and teardown for one visual object kind.
pub struct LifecycleController<K: VisualKind> {
    api: Rc<dyn MapsApi>,
    descriptors: Rc<DescriptorTable<K::Object>>,
}

impl<K: VisualKind> LifecycleController<K> {
    /// Create a controller over `descriptors`.
    #[must_use]
    pub fn new(api: Rc<dyn MapsApi>, descriptors: DescriptorTable<K::Object>) -> Self {
        Self {
            api,
            descriptors: Rc::new(descriptors),
        }
    }

    /// The descriptor table.
    #[must_use]
    pub fn descriptors(&self) -> &DescriptorTable<K::Object> {
        &self.descriptors
    }

    /// Build, construct and wire one visual object.
    pub fn bind(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        content: Option<Content>,
    ) -> Result<Bound<K::Object>, BindingError> {
        let span = tracing::debug_span!("bind", kind = K::NAME);
        let _enter = span.enter();

        K::check_context(context)?;
        let mut lifecycle = ScopeLifecycle::new(K::NAME);

        let mut options = Options::new();
        for descriptor in self.descriptors.iter() {
            descriptor.build_options(context, bindings, &mut options);
        }
        lifecycle.advance(ScopeState::OptionsBuilt)?;

        let object = K::construct(self.api.as_ref(), context, &options, content)?;
        lifecycle.advance(ScopeState::Constructed)?;

        let mut scope = BoundScope::new(lifecycle, object);
        for descriptor in self.descriptors.iter() {
            descriptor.created(context, bindings, &mut scope);
        }
        scope.advance(ScopeState::Wired)?;
        scope.advance(ScopeState::Active)?;

        let bound = Bound {
            id: scope.id(),
            object: Rc::clone(scope.object()),
            children: scope.children().clone(),
        };
        tracing::debug!(
            kind = K::NAME,
            scope = bound.id.get(),
            options = options.len(),
            listeners = scope.listener_count(),
            subscriptions = scope.subscription_count(),
            "bound"
        );

        let descriptors = Rc::clone(&self.descriptors);
        // The teardown context must not hold the list it is pushed onto.
        let removal_context = context.with_remove_handlers(DisposalList::new());
        let removal_bindings = bindings.clone();
        context.remove_handlers().push(move |view_model| {
            teardown::<K>(
                scope,
                &descriptors,
                &removal_context,
                &removal_bindings,
                view_model,
            )
        });

        Ok(bound)
    }
}

impl<K: VisualKind> Clone for LifecycleController<K> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            descriptors: Rc::clone(&self.descriptors),
        }
    }
}

impl<K: VisualKind> fmt::Debug for LifecycleController<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("kind", &K::NAME)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

fn teardown<K: VisualKind>(
    mut scope: BoundScope<K::Object>,
    descriptors: &DescriptorTable<K::Object>,
    context: &BindingContext,
    bindings: &Bindings,
    view_model: Option<&ViewModel>,
) -> Result<(), BindingError> {
    let span = tracing::debug_span!("teardown", kind = K::NAME, scope = scope.id().get());
    let _enter = span.enter();

    scope.advance(ScopeState::Disposed)?;

    let mut failures = Vec::new();
    if let Err(err) = scope.children().dispose(view_model) {
        failures.extend(err.failures);
    }
    for descriptor in descriptors.iter() {
        if let Err(err) = descriptor.removed(context, bindings, view_model, scope.object()) {
            failures.push(err);
        }
    }
    K::detach(&scope);
    scope.release();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(TeardownError { failures }.into())
    }
}
