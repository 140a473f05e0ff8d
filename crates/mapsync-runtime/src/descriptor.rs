#![forbid(unsafe_code)]

//! Property descriptors and per-kind descriptor tables.
//!
//! A [`BindingDescriptor`] names one bindable property and carries up to
//! three hooks:
//!
//! | Hook | Phase | Receives |
//! |------|-------|----------|
//! | `on_build_options` | before construction | the option record |
//! | `on_created` | after construction | the live [`BoundScope`] |
//! | `on_removed` | teardown | the view model and the external object |
//!
//! A [`DescriptorTable`] holds the descriptors of one visual object kind.
//! Iteration order is registration order and is the order hooks run in.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use mapsync_core::Options;

use crate::context::{BindingContext, ViewModel};
use crate::error::BindingError;
use crate::reactive::Bindings;
use crate::scope::BoundScope;

/// Build-options hook.
pub type BuildOptionsHook = Rc<dyn Fn(&BindingContext, &Bindings, &mut Options)>;

/// Creation hook.
pub type CreatedHook<O> = Rc<dyn Fn(&BindingContext, &Bindings, &mut BoundScope<O>)>;

/// Removal hook.
pub type RemovedHook<O> =
    Rc<dyn Fn(&BindingContext, &Bindings, Option<&ViewModel>, &O) -> Result<(), BindingError>>;

/// One bindable property of a visual object kind.
pub struct BindingDescriptor<O: ?Sized> {
    name: &'static str,
    build_options: Option<BuildOptionsHook>,
    created: Option<CreatedHook<O>>,
    removed: Option<RemovedHook<O>>,
}

impl<O: ?Sized> BindingDescriptor<O> {
    /// A descriptor with no hooks.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            build_options: None,
            created: None,
            removed: None,
        }
    }

    /// Set the build-options hook.
    #[must_use]
    pub fn on_build_options(
        mut self,
        hook: impl Fn(&BindingContext, &Bindings, &mut Options) + 'static,
    ) -> Self {
        self.build_options = Some(Rc::new(hook));
        self
    }

    /// Set the creation hook.
    #[must_use]
    pub fn on_created(
        mut self,
        hook: impl Fn(&BindingContext, &Bindings, &mut BoundScope<O>) + 'static,
    ) -> Self {
        self.created = Some(Rc::new(hook));
        self
    }

    /// Set the removal hook.
    #[must_use]
    pub fn on_removed(
        mut self,
        hook: impl Fn(&BindingContext, &Bindings, Option<&ViewModel>, &O) -> Result<(), BindingError>
        + 'static,
    ) -> Self {
        self.removed = Some(Rc::new(hook));
        self
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a build-options hook is set.
    #[must_use]
    pub fn has_build_options(&self) -> bool {
        self.build_options.is_some()
    }

    /// Run the build-options hook, if any.
    pub fn build_options(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        options: &mut Options,
    ) {
        if let Some(hook) = &self.build_options {
            hook(context, bindings, options);
        }
    }

    /// Run the creation hook, if any.
    pub fn created(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        scope: &mut BoundScope<O>,
    ) {
        if let Some(hook) = &self.created {
            hook(context, bindings, scope);
        }
    }

    /// Run the removal hook, if any.
    pub fn removed(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        view_model: Option<&ViewModel>,
        object: &O,
    ) -> Result<(), BindingError> {
        match &self.removed {
            Some(hook) => hook(context, bindings, view_model, object),
            None => Ok(()),
        }
    }
}

impl<O: ?Sized> Clone for BindingDescriptor<O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            build_options: self.build_options.clone(),
            created: self.created.clone(),
            removed: self.removed.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for BindingDescriptor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("name", &self.name)
            .field("build_options", &self.build_options.is_some())
            .field("created", &self.created.is_some())
            .field("removed", &self.removed.is_some())
            .finish()
    }
}

/// Insertion-ordered descriptors of one visual object kind.
pub struct DescriptorTable<O: ?Sized> {
    kind: &'static str,
    entries: IndexMap<&'static str, BindingDescriptor<O>>,
}

impl<O: ?Sized> DescriptorTable<O> {
    /// An empty table for `kind`.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Visual object kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Append a descriptor. Fails if the name is already registered.
    pub fn register(&mut self, descriptor: BindingDescriptor<O>) -> Result<(), BindingError> {
        let name = descriptor.name();
        if self.entries.contains_key(name) {
            return Err(BindingError::DuplicateDescriptor {
                kind: self.kind,
                name,
            });
        }
        self.entries.insert(name, descriptor);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, descriptor: BindingDescriptor<O>) -> Result<Self, BindingError> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Replace a descriptor in place, or append it if new.
    pub fn replace(&mut self, descriptor: BindingDescriptor<O>) -> Option<BindingDescriptor<O>> {
        self.entries.insert(descriptor.name(), descriptor)
    }

    /// Look up a descriptor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindingDescriptor<O>> {
        self.entries.get(name)
    }

    /// Descriptors in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &BindingDescriptor<O>> {
        self.entries.values()
    }

    /// Descriptor names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<O: ?Sized> Clone for DescriptorTable<O> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for DescriptorTable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorTable")
            .field("kind", &self.kind)
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
