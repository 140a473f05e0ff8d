#![forbid(unsafe_code)]

//! The `marker` binding.

use std::rc::Rc;

use mapsync_core::api::{Content, MapsApi, MarkerObject};
use mapsync_core::transform::{
    bool_option, position_from_external, position_option, position_to_external,
};
use mapsync_core::{OptionValue, Options, Value};

use super::{BindingAccessor, BindingHandler, InitOutcome};
use crate::config::BindingDefaults;
use crate::context::{BindingContext, Descendants};
use crate::descriptor::{BindingDescriptor, DescriptorTable};
use crate::error::BindingError;
use crate::events::try_register_mouse_event;
use crate::lifecycle::{Bound, LifecycleController, VisualKind};
use crate::options::assign;
use crate::reactive::Bindings;
use crate::scope::BoundScope;
use crate::wiring::{pull_on_event, push_on_change, try_observe_binding};

type MarkerDescriptor = BindingDescriptor<dyn MarkerObject>;

/// Binding name → native event name.
const MOUSE_EVENTS: [(&str, &str); 7] = [
    ("click", "click"),
    ("doubleclick", "dblclick"),
    ("rightclick", "rightclick"),
    ("mousedown", "mousedown"),
    ("mouseout", "mouseout"),
    ("mouseover", "mouseover"),
    ("mouseup", "mouseup"),
];

/// The marker kind. Requires an enclosing map.
#[derive(Debug, Clone, Copy)]
pub struct MarkerKind;

impl VisualKind for MarkerKind {
    type Object = dyn MarkerObject;
    const NAME: &'static str = "marker";

    fn check_context(context: &BindingContext) -> Result<(), BindingError> {
        context.require_map(Self::NAME).map(|_| ())
    }

    fn construct(
        api: &dyn MapsApi,
        context: &BindingContext,
        options: &Options,
        _content: Option<Content>,
    ) -> Result<Rc<dyn MarkerObject>, BindingError> {
        let map = context.require_map(Self::NAME)?;
        api.create_marker(options, map)
            .map_err(|source| BindingError::Construction {
                kind: Self::NAME,
                source,
            })
    }

    fn detach(scope: &BoundScope<dyn MarkerObject>) {
        scope.object().set_map(None);
    }
}

/// The stock marker descriptors, in evaluation order.
pub fn marker_descriptors(
    defaults: &BindingDefaults,
) -> Result<DescriptorTable<dyn MarkerObject>, BindingError> {
    let mut table = DescriptorTable::new(MarkerKind::NAME);
    table.register(host_value("animation", |marker, v| marker.set_animation(v)))?;
    table.register(flag("clickable", defaults.marker_clickable, |marker, on| {
        marker.set_clickable(on);
    }))?;
    table.register(host_value("cursor", |marker, v| marker.set_cursor(v)))?;
    table.register(host_value("icon", |marker, v| marker.set_icon(v)))?;
    let raise_on_drag = defaults.marker_raise_on_drag;
    table.register(
        MarkerDescriptor::new("raiseOnDrag").on_build_options(move |_, bindings, options| {
            assign(bindings, "raiseOnDrag", options, raise_on_drag, Some(bool_option));
        }),
    )?;
    table.register(host_value("shadow", |marker, v| marker.set_shadow(v)))?;
    table.register(position())?;
    table.register(flag("draggable", defaults.marker_draggable, |marker, on| {
        marker.set_draggable(on);
    }))?;
    table.register(flag("flat", defaults.marker_flat, |marker, on| marker.set_flat(on)))?;
    table.register(title(defaults.marker_title.clone()))?;
    table.register(flag("visible", defaults.marker_visible, |marker, on| {
        marker.set_visible(on);
    }))?;
    for (binding, event) in MOUSE_EVENTS {
        table.register(MarkerDescriptor::new(binding).on_created(move |_, bindings, scope| {
            try_register_mouse_event(bindings, binding, event, scope);
        }))?;
    }
    Ok(table)
}

/// A property passed to the host as-is, `null` by default.
fn host_value(name: &'static str, set: fn(&dyn MarkerObject, &OptionValue)) -> MarkerDescriptor {
    MarkerDescriptor::new(name)
        .on_build_options(move |_, bindings, options| {
            assign(bindings, name, options, Value::Null, None);
        })
        .on_created(move |_, bindings, scope| {
            try_observe_binding(scope, bindings, name, None, move |marker, value| {
                set(marker, value);
            });
        })
}

/// A boolean property.
fn flag(name: &'static str, default: bool, set: fn(&dyn MarkerObject, bool)) -> MarkerDescriptor {
    MarkerDescriptor::new(name)
        .on_build_options(move |_, bindings, options| {
            assign(bindings, name, options, default, Some(bool_option));
        })
        .on_created(move |_, bindings, scope| {
            try_observe_binding(scope, bindings, name, Some(bool_option), move |marker, value| {
                set(marker, value.as_bool().unwrap_or(false));
            });
        })
}

fn title(default: String) -> MarkerDescriptor {
    MarkerDescriptor::new("title")
        .on_build_options(move |_, bindings, options| {
            assign(bindings, "title", options, default.as_str(), None);
        })
        .on_created(|_, bindings, scope| {
            try_observe_binding(scope, bindings, "title", None, |marker, value| {
                marker.set_title(value.as_text().unwrap_or_default());
            });
        })
}

fn position() -> MarkerDescriptor {
    MarkerDescriptor::new("position")
        .on_build_options(|_, bindings, options| {
            assign(bindings, "position", options, Value::Null, Some(position_option));
        })
        .on_created(|_, bindings, scope| {
            let Some(position) = bindings.observable("position").cloned() else {
                return;
            };
            push_on_change(scope, "position", &position, |marker, value| {
                marker.set_position(position_to_external(value.as_position()));
            });
            let event = if bindings.is_truthy("positionUpdateOnDragEnd") {
                "dragend"
            } else {
                "position_changed"
            };
            pull_on_event(scope, "position", event, &position, |marker| {
                Value::from(position_from_external(marker.position()))
            });
        })
}

/// The `marker` binding handler.
#[derive(Debug, Clone)]
pub struct MarkerBinding {
    controller: LifecycleController<MarkerKind>,
}

impl MarkerBinding {
    /// Binding name.
    pub const NAME: &'static str = MarkerKind::NAME;

    /// A handler with the stock descriptors.
    pub fn new(api: Rc<dyn MapsApi>, defaults: &BindingDefaults) -> Result<Self, BindingError> {
        Ok(Self::with_descriptors(api, marker_descriptors(defaults)?))
    }

    /// A handler with a custom descriptor table.
    #[must_use]
    pub fn with_descriptors(
        api: Rc<dyn MapsApi>,
        descriptors: DescriptorTable<dyn MarkerObject>,
    ) -> Self {
        Self {
            controller: LifecycleController::new(api, descriptors),
        }
    }

    /// The lifecycle controller.
    #[must_use]
    pub fn controller(&self) -> &LifecycleController<MarkerKind> {
        &self.controller
    }

    /// Bind a marker and then its descendants with `$marker` set.
    pub fn bind(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        descendants: &dyn Descendants,
    ) -> Result<Bound<dyn MarkerObject>, BindingError> {
        let bound = self.controller.bind(context, bindings, None)?;
        let inner = context.extend_marker(Rc::clone(&bound.object));
        descendants.apply(&inner)?;
        Ok(bound)
    }
}

impl BindingHandler for MarkerBinding {
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

    fn allows_virtual_elements(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_table_has_every_property() {
        let table = marker_descriptors(&BindingDefaults::default()).unwrap();
        for name in [
            "animation",
            "clickable",
            "cursor",
            "icon",
            "raiseOnDrag",
            "shadow",
            "position",
            "draggable",
            "flat",
            "title",
            "visible",
            "doubleclick",
            "mouseup",
        ] {
            assert!(table.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn build_options_cast_flags() {
        let table = marker_descriptors(&BindingDefaults::default()).unwrap();
        let bindings = Bindings::new().with("draggable", 1).with("title", "home");
        let mut options = Options::new();
        for descriptor in table.iter() {
            descriptor.build_options(&BindingContext::root(), &bindings, &mut options);
        }
        assert_eq!(options.bool("draggable"), Some(true));
        assert_eq!(options.bool("clickable"), Some(true));
        assert_eq!(options.bool("flat"), Some(false));
        assert_eq!(options.text("title"), Some("home"));
        assert_eq!(options.get("icon"), Some(&OptionValue::Null));
    }
}
