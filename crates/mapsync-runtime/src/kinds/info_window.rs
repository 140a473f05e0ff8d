#![forbid(unsafe_code)]

//! The `infoWindow` binding.
//!
//! The element's subtree is bound first, in the enclosing context, and the
//! result becomes the window's content. `visible` opens the window on
//! `$map`, anchored to the `anchor` binding or else the enclosing marker.

use std::rc::Rc;

use mapsync_core::api::{Content, InfoWindowObject, MapsApi, NativeEvent};
use mapsync_core::transform::{bool_option, position_option, position_to_external, size_option};
use mapsync_core::{OptionValue, Options, Value};

use super::{BindingAccessor, BindingHandler, InitOutcome};
use crate::config::BindingDefaults;
use crate::context::{BindingContext, Descendants};
use crate::descriptor::{BindingDescriptor, DescriptorTable};
use crate::error::BindingError;
use crate::lifecycle::{Bound, LifecycleController, VisualKind};
use crate::options::{Transform, assign};
use crate::reactive::Bindings;
use crate::scope::BoundScope;
use crate::wiring::{pull_on_event, push_on_change};

type InfoWindowDescriptor = BindingDescriptor<dyn InfoWindowObject>;

/// Scope flag tracking whether the window is open.
const OPEN: &str = "open";

/// The info-window kind. Requires an enclosing map.
#[derive(Debug, Clone, Copy)]
pub struct InfoWindowKind;

impl VisualKind for InfoWindowKind {
    type Object = dyn InfoWindowObject;
    const NAME: &'static str = "infoWindow";

    fn check_context(context: &BindingContext) -> Result<(), BindingError> {
        context.require_map(Self::NAME).map(|_| ())
    }

    fn construct(
        api: &dyn MapsApi,
        _context: &BindingContext,
        options: &Options,
        content: Option<Content>,
    ) -> Result<Rc<dyn InfoWindowObject>, BindingError> {
        api.create_info_window(options, content)
            .map_err(|source| BindingError::Construction {
                kind: Self::NAME,
                source,
            })
    }

    fn detach(scope: &BoundScope<dyn InfoWindowObject>) {
        if scope.flag_value(OPEN) {
            scope.object().close();
        }
    }
}

/// The stock info-window descriptors, in evaluation order.
pub fn info_window_descriptors(
    defaults: &BindingDefaults,
) -> Result<DescriptorTable<dyn InfoWindowObject>, BindingError> {
    let mut table = DescriptorTable::new(InfoWindowKind::NAME);
    table.register(visible())?;
    table.register(reconfigurable(
        "disableAutoPan",
        Value::from(defaults.info_window_disable_auto_pan),
        Some(bool_option),
    ))?;
    table.register(reconfigurable(
        "maxWidth",
        Value::from(defaults.info_window_max_width),
        None,
    ))?;
    table.register(reconfigurable(
        "pixelOffset",
        Value::from(defaults.info_window_pixel_offset),
        Some(size_option),
    ))?;
    table.register(position())?;
    Ok(table)
}

fn visible() -> InfoWindowDescriptor {
    InfoWindowDescriptor::new("visible").on_created(|context, bindings, scope| {
        let Some(map) = context.map().cloned() else {
            return;
        };
        let anchor = bindings
            .anchor("anchor")
            .or_else(|| context.marker())
            .cloned();
        let open = scope.flag(OPEN, false);

        let show = move |window: &dyn InfoWindowObject, visible: bool| {
            if visible && !open.get() {
                window.open(&map, anchor.clone());
                open.set(true);
            } else if !visible && open.get() {
                window.close();
                open.set(false);
            }
        };
        show(scope.object().as_ref(), bindings.is_truthy("visible"));

        let closed = scope.flag(OPEN, false);
        scope.listen(
            "closeclick",
            Rc::new(move |_: &dyn NativeEvent| closed.set(false)),
        );

        if let Some(visible) = bindings.observable("visible").cloned() {
            push_on_change(scope, "visible", &visible, move |window, value| {
                show(window, value.is_truthy());
            });
            pull_on_event(scope, "visible", "closeclick", &visible, |_| Value::Bool(false));
        }
    })
}

/// An option fixed at construction and updated later via `set_options`.
fn reconfigurable(
    name: &'static str,
    default: Value,
    transform: Option<Transform>,
) -> InfoWindowDescriptor {
    InfoWindowDescriptor::new(name)
        .on_build_options(move |_, bindings, options| {
            assign(bindings, name, options, default.clone(), transform);
        })
        .on_created(move |_, bindings, scope| {
            let Some(observable) = bindings.observable(name).cloned() else {
                return;
            };
            push_on_change(scope, name, &observable, move |window, value| {
                let converted = match transform {
                    Some(transform) => transform(value),
                    None => OptionValue::from(value.clone()),
                };
                window.set_options(&Options::single(name, converted));
            });
        })
}

fn position() -> InfoWindowDescriptor {
    InfoWindowDescriptor::new("position")
        .on_build_options(|_, bindings, options| {
            assign(bindings, "position", options, Value::Null, Some(position_option));
        })
        .on_created(|_, bindings, scope| {
            let Some(position) = bindings.observable("position").cloned() else {
                return;
            };
            push_on_change(scope, "position", &position, |window, value| {
                window.set_position(position_to_external(value.as_position()));
            });
        })
}

/// The `infoWindow` binding handler.
#[derive(Debug, Clone)]
pub struct InfoWindowBinding {
    controller: LifecycleController<InfoWindowKind>,
}

impl InfoWindowBinding {
    /// Binding name.
    pub const NAME: &'static str = InfoWindowKind::NAME;

    /// A handler with the stock descriptors.
    pub fn new(api: Rc<dyn MapsApi>, defaults: &BindingDefaults) -> Result<Self, BindingError> {
        Ok(Self::with_descriptors(api, info_window_descriptors(defaults)?))
    }

    /// A handler with a custom descriptor table.
    #[must_use]
    pub fn with_descriptors(
        api: Rc<dyn MapsApi>,
        descriptors: DescriptorTable<dyn InfoWindowObject>,
    ) -> Self {
        Self {
            controller: LifecycleController::new(api, descriptors),
        }
    }

    /// The lifecycle controller.
    #[must_use]
    pub fn controller(&self) -> &LifecycleController<InfoWindowKind> {
        &self.controller
    }

    /// Bind the content subtree, then construct the window around it.
    pub fn bind(
        &self,
        context: &BindingContext,
        bindings: &Bindings,
        descendants: &dyn Descendants,
    ) -> Result<Bound<dyn InfoWindowObject>, BindingError> {
        InfoWindowKind::check_context(context)?;
        let content = descendants.apply(context)?;
        self.controller.bind(context, bindings, content)
    }
}

impl BindingHandler for InfoWindowBinding {
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
    use mapsync_core::Size;
    use mapsync_core::api::PixelSize;

    #[test]
    fn build_options_use_defaults() {
        let defaults = BindingDefaults {
            info_window_pixel_offset: Size::new(0, 12),
            ..BindingDefaults::default()
        };
        let table = info_window_descriptors(&defaults).unwrap();
        let mut options = Options::new();
        for descriptor in table.iter() {
            descriptor.build_options(&BindingContext::root(), &Bindings::new(), &mut options);
        }
        assert_eq!(options.bool("disableAutoPan"), Some(false));
        assert_eq!(options.number("maxWidth"), Some(0.0));
        assert_eq!(options.size("pixelOffset"), Some(PixelSize::new(0, 12)));
        assert!(options.get("position").is_some_and(OptionValue::is_null));
        assert!(!options.contains_key("visible"));
    }
}
