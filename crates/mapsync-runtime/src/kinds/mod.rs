#![forbid(unsafe_code)]

//! Binding handlers for each visual object kind.
//!
//! | Name | Handler | Needs | Virtual elements |
//! |------|---------|-------|------------------|
//! | `map` | [`MapBinding`] | nothing | no |
//! | `marker` | [`MarkerBinding`] | `$map` | yes |
//! | `infoWindow` | [`InfoWindowBinding`] | `$map` | no |
//! | `mapItems` | [`MapItemsBinding`] | nothing | yes |
//!
//! Every handler takes over binding of its descendants.

use std::rc::Rc;

use crate::context::{BindingContext, Descendants};
use crate::error::BindingError;
use crate::reactive::Bindings;
use crate::reconcile::ItemsSource;

pub mod info_window;
pub mod map;
pub mod map_items;
pub mod marker;

pub use info_window::{InfoWindowBinding, InfoWindowKind};
pub use map::{MapBinding, MapKind};
pub use map_items::MapItemsBinding;
pub use marker::{MarkerBinding, MarkerKind};

/// The value a binding handler receives.
#[derive(Debug, Clone)]
pub enum BindingAccessor {
    /// A bindings object (`map`, `marker`, `infoWindow`).
    Bindings(Bindings),
    /// A collection source (`mapItems`).
    Items(ItemsSource),
}

impl BindingAccessor {
    /// The bindings object, or [`BindingError::UnexpectedValue`].
    pub fn bindings(&self, binding: &'static str) -> Result<&Bindings, BindingError> {
        match self {
            Self::Bindings(bindings) => Ok(bindings),
            Self::Items(_) => Err(BindingError::UnexpectedValue {
                binding,
                expected: "a bindings object",
            }),
        }
    }

    /// The collection source, or [`BindingError::UnexpectedValue`].
    pub fn items(&self, binding: &'static str) -> Result<&ItemsSource, BindingError> {
        match self {
            Self::Items(items) => Ok(items),
            Self::Bindings(_) => Err(BindingError::UnexpectedValue {
                binding,
                expected: "a collection",
            }),
        }
    }
}

impl From<Bindings> for BindingAccessor {
    fn from(value: Bindings) -> Self {
        Self::Bindings(value)
    }
}

impl From<ItemsSource> for BindingAccessor {
    fn from(value: ItemsSource) -> Self {
        Self::Items(value)
    }
}

/// What `init` tells the binding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitOutcome {
    /// The handler bound (or will bind) its descendants itself.
    pub controls_descendant_bindings: bool,
}

impl InitOutcome {
    /// Descendants are handled by the binding.
    #[must_use]
    pub const fn controls_descendants() -> Self {
        Self {
            controls_descendant_bindings: true,
        }
    }
}

/// A named binding the binding engine can apply to an element.
pub trait BindingHandler {
    /// Binding name as written in markup.
    fn name(&self) -> &'static str;

    /// Apply the binding in `context`. `descendants` binds the element's
    /// subtree.
    fn init(
        &self,
        context: &BindingContext,
        accessor: &BindingAccessor,
        descendants: Rc<dyn Descendants>,
    ) -> Result<InitOutcome, BindingError>;

    /// Whether the binding may be used on a virtual (comment) element.
    fn allows_virtual_elements(&self) -> bool {
        false
    }
}

/// Truthiness of a companion flag such as `panCenter`, or `default` when it
/// is absent or null.
pub(crate) fn truthy_or(bindings: &Bindings, name: &str, default: bool) -> bool {
    match bindings.value(name) {
        Some(value) if !value.is_null() => value.is_truthy(),
        _ => default,
    }
}
