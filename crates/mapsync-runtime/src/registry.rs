#![forbid(unsafe_code)]

//! Name-based lookup of the stock binding handlers.
//!
//! The binding engine of the host resolves binding names from markup through
//! a [`BindingRegistry`] and calls [`BindingRegistry::apply`].

use std::fmt;
use std::rc::Rc;

use mapsync_core::api::MapsApi;

use crate::config::BindingDefaults;
use crate::context::{BindingContext, Descendants};
use crate::diff::LcsDiff;
use crate::error::BindingError;
use crate::kinds::{
    BindingAccessor, BindingHandler, InfoWindowBinding, InitOutcome, MapBinding, MapItemsBinding,
    MarkerBinding,
};

/// The four stock handlers, addressable by binding name.
pub struct BindingRegistry {
    map: MapBinding,
    marker: MarkerBinding,
    info_window: InfoWindowBinding,
    map_items: MapItemsBinding,
}

impl BindingRegistry {
    /// Build every handler against `api` with `defaults`.
    pub fn new(api: Rc<dyn MapsApi>, defaults: &BindingDefaults) -> Result<Self, BindingError> {
        let registry = Self {
            map: MapBinding::new(Rc::clone(&api), defaults)?,
            marker: MarkerBinding::new(Rc::clone(&api), defaults)?,
            info_window: InfoWindowBinding::new(api, defaults)?,
            map_items: MapItemsBinding::default(),
        };
        tracing::debug!(handlers = ?registry.names().collect::<Vec<_>>(), "binding registry ready");
        Ok(registry)
    }

    /// The handler registered as `name`.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&dyn BindingHandler> {
        match name {
            MapBinding::NAME => Some(&self.map),
            MarkerBinding::NAME => Some(&self.marker),
            InfoWindowBinding::NAME => Some(&self.info_window),
            _ if name == MapItemsBinding::<LcsDiff>::NAME => Some(&self.map_items),
            _ => None,
        }
    }

    /// Registered binding names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers().map(BindingHandler::name)
    }

    /// Whether `name` may be used on a virtual element. `false` for unknown
    /// names.
    #[must_use]
    pub fn allows_virtual_elements(&self, name: &str) -> bool {
        self.handler(name)
            .is_some_and(BindingHandler::allows_virtual_elements)
    }

    /// Apply the binding `name` to an element.
    pub fn apply(
        &self,
        name: &str,
        context: &BindingContext,
        accessor: &BindingAccessor,
        descendants: Rc<dyn Descendants>,
    ) -> Result<InitOutcome, BindingError> {
        let handler = self.handler(name).ok_or_else(|| BindingError::UnknownBinding {
            name: name.to_owned(),
        })?;
        handler.init(context, accessor, descendants)
    }

    /// The `map` handler.
    #[must_use]
    pub fn map(&self) -> &MapBinding {
        &self.map
    }

    /// The `marker` handler.
    #[must_use]
    pub fn marker(&self) -> &MarkerBinding {
        &self.marker
    }

    /// The `infoWindow` handler.
    #[must_use]
    pub fn info_window(&self) -> &InfoWindowBinding {
        &self.info_window
    }

    /// The `mapItems` handler.
    #[must_use]
    pub fn map_items(&self) -> &MapItemsBinding {
        &self.map_items
    }

    fn handlers(&self) -> impl Iterator<Item = &dyn BindingHandler> {
        [
            &self.map as &dyn BindingHandler,
            &self.marker,
            &self.info_window,
            &self.map_items,
        ]
        .into_iter()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoDescendants;
    use crate::reactive::Bindings;
    use mapsync_core::api::{ApiError, Content, InfoWindowObject, MapCanvas, MarkerObject};
    use mapsync_core::Options;

    /// An API that refuses to build anything.
    struct Refusing;

    impl MapsApi for Refusing {
        fn create_map(&self, _: &Options) -> Result<Rc<dyn MapCanvas>, ApiError> {
            Err(ApiError::new("offline"))
        }

        fn create_marker(
            &self,
            _: &Options,
            _: &Rc<dyn MapCanvas>,
        ) -> Result<Rc<dyn MarkerObject>, ApiError> {
            Err(ApiError::new("offline"))
        }

        fn create_info_window(
            &self,
            _: &Options,
            _: Option<Content>,
        ) -> Result<Rc<dyn InfoWindowObject>, ApiError> {
            Err(ApiError::new("offline"))
        }
    }

    fn registry() -> BindingRegistry {
        BindingRegistry::new(Rc::new(Refusing), &BindingDefaults::default()).unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let registry = registry();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["map", "marker", "infoWindow", "mapItems"]
        );
        assert!(registry.handler("marker").is_some());
        assert!(registry.handler("polyline").is_none());
        assert!(registry.allows_virtual_elements("marker"));
        assert!(registry.allows_virtual_elements("mapItems"));
        assert!(!registry.allows_virtual_elements("map"));
        assert!(!registry.allows_virtual_elements("polyline"));
    }

    #[test]
    fn unknown_binding_is_an_error() {
        let err = registry()
            .apply(
                "polyline",
                &BindingContext::root(),
                &Bindings::new().into(),
                Rc::new(NoDescendants),
            )
            .unwrap_err();
        assert!(matches!(err, BindingError::UnknownBinding { name } if name == "polyline"));
    }

    #[test]
    fn construction_failure_is_reported_with_kind() {
        let err = registry()
            .apply(
                "map",
                &BindingContext::root(),
                &Bindings::new().into(),
                Rc::new(NoDescendants),
            )
            .unwrap_err();
        assert!(matches!(err, BindingError::Construction { kind: "map", .. }));
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("mapping api rejected construction: offline".to_owned())
        );
    }
}
