#![forbid(unsafe_code)]

//! The `map` binding.
//!
//! Constructs the map canvas and exposes it to descendants as `$map`.
//! Descendants register their teardown on the map's own child list, so
//! removing the map removes everything bound inside it first.

use std::rc::Rc;

use mapsync_core::api::{Content, MapCanvas, MapsApi};
use mapsync_core::transform::{
    bool_option, bounds_from_external, bounds_option, bounds_to_external, position_from_external,
    position_option, position_to_external,
};
use mapsync_core::{OptionValue, Options, Value};

use super::{BindingAccessor, BindingHandler, InitOutcome, truthy_or};
use crate::config::BindingDefaults;
use crate::context::{BindingContext, Descendants};
use crate::descriptor::{BindingDescriptor, DescriptorTable};
use crate::error::BindingError;
use crate::events::try_register_mouse_event;
use crate::lifecycle::{Bound, LifecycleController, VisualKind};
use crate::options::{Transform, assign, assign_optional};
use crate::reactive::Bindings;
use crate::scope::BoundScope;
use crate::wiring::{pull_on_event, pull_once_on_event, push_on_change};

type MapDescriptor = BindingDescriptor<dyn MapCanvas>;

/// Construction-time map options that can also be updated via
/// `set_options`. Written only when bound.
const PASS_THROUGH_OPTIONS: [(&str, Option<Transform>); 9] = [
    ("draggable", Some(bool_option)),
    ("scrollwheel", Some(bool_option)),
    ("disableDefaultUI", Some(bool_option)),
    ("disableDoubleClickZoom", Some(bool_option)),
    ("keyboardShortcuts", Some(bool_option)),
    ("minZoom", None),
    ("maxZoom", None),
    ("heading", None),
    ("tilt", None),
];

const MOUSE_EVENTS: [&str; 3] = ["click", "dblclick", "rightclick"];

/// The map canvas kind.
#[derive(Debug, Clone, Copy)]
pub struct MapKind;

impl VisualKind for MapKind {
    type Object = dyn MapCanvas;
    const NAME: &'static str = "map";

    fn check_context(_context: &BindingContext) -> Result<(), BindingError> {
        Ok(())
    }

    fn construct(
        api: &dyn MapsApi,
        _context: &BindingContext,
        options: &Options,
        _content: Option<Content>,
    ) -> Result<Rc<dyn MapCanvas>, BindingError> {
        api.create_map(options)
            .map_err(|source| BindingError::Construction {
                kind: Self::NAME,
                source,
            })
    }

    fn detach(_scope: &BoundScope<dyn MapCanvas>) {}
}

/// The stock map descriptors, in evaluation order.
pub fn map_descriptors(
    defaults: &BindingDefaults,
) -> Result<DescriptorTable<dyn MapCanvas>, BindingError> {
    let mut table = DescriptorTable::new(MapKind::NAME);
    table.register(center(defaults.pan_center))?;
    table.register(zoom(defaults.zoom))?;
    table.register(map_type_id(defaults.map_type_id.clone()))?;
    table.register(bounds(defaults.pan_bounds))?;
    table.register(
        MapDescriptor::new("backgroundColor").on_build_options(|_, bindings, options| {
            assign_optional(bindings, "backgroundColor", options, None);
        }),
    )?;
    for (name, transform) in PASS_THROUGH_OPTIONS {
        table.register(pass_through(name, transform))?;
    }
    for event in MOUSE_EVENTS {
        table.register(MapDescriptor::new(event).on_created(move |_, bindings, scope| {
            try_register_mouse_event(bindings, event, event, scope);
        }))?;
    }
    Ok(table)
}

fn center(pan_default: bool) -> MapDescriptor {
    MapDescriptor::new("center")
        .on_build_options(move |_, bindings, options| {
            assign(bindings, "center", options, Value::Null, Some(position_option));
            assign(bindings, "panCenter", options, pan_default, Some(bool_option));
        })
        .on_created(move |_, bindings, scope| {
            let Some(center) = bindings.observable("center").cloned() else {
                return;
            };
            pull_on_event(scope, "center", "center_changed", &center, |map| {
                Value::from(position_from_external(map.center()))
            });
            let companions = bindings.clone();
            push_on_change(scope, "center", &center, move |map, value| {
                let target = position_to_external(value.as_position());
                if truthy_or(&companions, "panCenter", pan_default) {
                    map.pan_to(target);
                } else {
                    map.set_center(target);
                }
            });
        })
}

fn zoom(default: f64) -> MapDescriptor {
    MapDescriptor::new("zoom")
        .on_build_options(move |_, bindings, options| {
            assign(bindings, "zoom", options, default, None);
        })
        .on_created(|_, bindings, scope| {
            let Some(zoom) = bindings.observable("zoom").cloned() else {
                return;
            };
            pull_on_event(scope, "zoom", "zoom_changed", &zoom, |map| {
                Value::from(map.zoom())
            });
            push_on_change(scope, "zoom", &zoom, |map, value| {
                if let Some(level) = value.as_number() {
                    map.set_zoom(level);
                }
            });
        })
}

fn map_type_id(default: String) -> MapDescriptor {
    MapDescriptor::new("mapTypeId")
        .on_build_options(move |_, bindings, options| {
            assign(bindings, "mapTypeId", options, default.as_str(), None);
        })
        .on_created(|_, bindings, scope| {
            let Some(map_type) = bindings.observable("mapTypeId").cloned() else {
                return;
            };
            pull_on_event(scope, "mapTypeId", "maptypeid_changed", &map_type, |map| {
                Value::from(map.map_type_id())
            });
            push_on_change(scope, "mapTypeId", &map_type, |map, value| {
                if let Some(id) = value.as_text() {
                    map.set_map_type_id(id);
                }
            });
        })
}

fn bounds(pan_default: bool) -> MapDescriptor {
    MapDescriptor::new("bounds")
        .on_build_options(move |_, bindings, options| {
            assign(bindings, "bounds", options, Value::Null, Some(bounds_option));
            assign(bindings, "panBounds", options, pan_default, Some(bool_option));
        })
        .on_created(move |_, bindings, scope| {
            let Some(bounds) = bindings.observable("bounds").cloned() else {
                return;
            };
            // Seed the model once the map has sized itself.
            pull_once_on_event(scope, "bounds", "idle", &bounds, |map| read_bounds(map));
            pull_on_event(scope, "bounds", "bounds_changed", &bounds, |map| read_bounds(map));
            let companions = bindings.clone();
            push_on_change(scope, "bounds", &bounds, move |map, value| {
                let target = bounds_to_external(value.as_bounds());
                if truthy_or(&companions, "panBounds", pan_default) {
                    map.pan_to_bounds(target);
                } else {
                    map.fit_bounds(target);
                }
            });
        })
}

fn read_bounds(map: &dyn MapCanvas) -> Value {
    Value::from(bounds_from_external(map.bounds()))
}

fn pass_through(name: &'static str, transform: Option<Transform>) -> MapDescriptor {
    MapDescriptor::new(name)
        .on_build_options(move |_, bindings, options| {
            assign_optional(bindings, name, options, transform);
        })
        .on_created(move |_, bindings, scope| {
            let Some(observable) = bindings.observable(name).cloned() else {
                return;
            };
            push_on_change(scope, name, &observable, move |map, value| {
                let converted = match transform {
                    Some(transform) => transform(value),
                    None => OptionValue::from(value.clone()),
                };
                map.set_options(&Options::single(name, converted));
            });
        })
}

/// The `map` binding handler.
#[derive(Debug, Clone)]
pub struct MapBinding {
    controller: LifecycleController<MapKind>,
}

impl MapBinding {
    /// Binding name.
    pub const NAME: &'static str = MapKind::NAME;

    /// A handler with the stock descriptors.
    pub fn new(api: Rc<dyn MapsApi>, defaults: &BindingDefaults) -> Result<Self, BindingError> {
        Ok(Self::with_descriptors(api, map_descriptors(defaults)?))
    }

    /// A handler with a custom descriptor table.
    #[must_use]
    pub fn with_descriptors(
        api: Rc<dyn MapsApi>,
        descriptors: DescriptorTable<dyn MapCanvas>,
    ) -> Self {
        Self {
            controller: LifecycleController::new(api, descriptors),
        }
    }

    /// The lifecycle controller.
    #[must_use]
    pub fn controller(&self) -> &LifecycleController<MapKind> {
        &self.controller
    }

    /// Bind a map and then its descendants with `$map` set.
    pub fn bind(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        descendants: &dyn Descendants,
    ) -> Result<Bound<dyn MapCanvas>, BindingError> {
        let bound = self.controller.bind(context, bindings, None)?;
        let inner = context
            .extend_map(Rc::clone(&bound.object))
            .with_remove_handlers(bound.children.clone());
        descendants.apply(&inner)?;
        Ok(bound)
    }
}

impl BindingHandler for MapBinding {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(
        &self,
        context: &BindingContext,
        accessor: &BindingAccessor,
        descendants: Rc<dyn Descendants>,
    ) -> Result<InitOutcome, BindingError> {
        let bindings = accessor.bindings(Self::NAME)?;
        self.bind(context, bindings, descendants.as_ref())?;
        Ok(InitOutcome::controls_descendants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_table_order() {
        let table = map_descriptors(&BindingDefaults::default()).unwrap();
        let names: Vec<_> = table.names().collect();
        assert_eq!(&names[..5], ["center", "zoom", "mapTypeId", "bounds", "backgroundColor"]);
        assert_eq!(names.last().copied(), Some("rightclick"));
        assert_eq!(table.len(), 5 + PASS_THROUGH_OPTIONS.len() + MOUSE_EVENTS.len());
    }

    #[test]
    fn build_options_apply_defaults() {
        let table = map_descriptors(&BindingDefaults::default()).unwrap();
        let mut options = Options::new();
        let bindings = Bindings::new().with("tilt", 45);
        for descriptor in table.iter() {
            descriptor.build_options(&BindingContext::root(), &bindings, &mut options);
        }
        assert_eq!(options.number("zoom"), Some(8.0));
        assert_eq!(options.text("mapTypeId"), Some("roadmap"));
        assert_eq!(options.bool("panCenter"), Some(true));
        assert_eq!(options.number("tilt"), Some(45.0));
        assert!(!options.contains_key("heading"));
        assert!(!options.contains_key("backgroundColor"));
    }
}
