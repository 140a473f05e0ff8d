#![forbid(unsafe_code)]

//! Event bridge from native mouse events to user handlers.
//!
//! A listener is registered only when the bindings object carries a handler
//! under the binding name; absent handlers cost nothing. Dispatch is
//! synchronous, in the mapping API's own event callback.

use std::fmt;
use std::rc::Rc;

use mapsync_core::Position;
use mapsync_core::api::{EventTarget, NativeEvent};
use mapsync_core::transform::position_from_external;

use crate::reactive::Bindings;
use crate::scope::BoundScope;

/// Model-facing view of a native mouse event.
pub struct MouseEvent<'a> {
    position: Option<Position>,
    native: &'a dyn NativeEvent,
}

impl<'a> MouseEvent<'a> {
    /// Wrap a native event, converting its coordinate to a model position.
    #[must_use]
    pub fn from_native(native: &'a dyn NativeEvent) -> Self {
        Self {
            position: position_from_external(native.lat_lng()),
            native,
        }
    }

    /// Position under the pointer, if the event carries one.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Stop the mapping API from propagating the event.
    pub fn stop(&self) {
        self.native.stop();
    }
}

impl fmt::Debug for MouseEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseEvent")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Register `event_name` on the scope's object if `bindings` has a handler
/// named `binding_name`.
///
/// Returns whether a listener was registered.
pub fn try_register_mouse_event<O>(
    bindings: &Bindings,
    binding_name: &str,
    event_name: &str,
    scope: &mut BoundScope<O>,
) -> bool
where
    O: ?Sized + EventTarget + 'static,
{
    let Some(handler) = bindings.handler(binding_name) else {
        return false;
    };
    let handler = Rc::clone(handler);
    scope.listen(
        event_name,
        Rc::new(move |native: &dyn NativeEvent| {
            handler(&MouseEvent::from_native(native));
        }),
    );
    tracing::trace!(
        kind = scope.kind(),
        binding = binding_name,
        event = event_name,
        "mouse handler registered"
    );
    true
}
