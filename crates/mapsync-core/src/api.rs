#![forbid(unsafe_code)]

//! Seam to the externally-owned mapping API.
//!
//! The mapping API owns the visual objects (map canvas, markers, info
//! windows) and their native geometry. mapsync only consumes it through the
//! traits below; a host provides the implementation (a `wasm-bindgen`
//! wrapper in the browser, a recording mock in tests).
//!
//! # Conventions
//!
//! - All object methods take `&self`. Host objects are shared handles with
//!   interior mutability, the same way browser objects are.
//! - Change notifications are delivered through [`EventTarget`]. A host may
//!   fire them synchronously from inside a setter; the binding layer is
//!   written to tolerate that.
//! - Nothing here is `Send`. All work happens on one logical thread.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::options::Options;

/// Opaque content node handed to an info window (a DOM subtree in the browser).
pub type Content = Rc<dyn Any>;

/// Native latitude/longitude pair of the mapping API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Create a native coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in degrees.
    #[inline]
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline]
    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }
}

/// Native bounds of the mapping API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    south_west: LatLng,
    north_east: LatLng,
}

impl LatLngBounds {
    /// Create native bounds from two corners.
    #[must_use]
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// South-west corner.
    #[must_use]
    pub const fn south_west(self) -> LatLng {
        self.south_west
    }

    /// North-east corner.
    #[must_use]
    pub const fn north_east(self) -> LatLng {
        self.north_east
    }
}

/// Native pixel size of the mapping API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSize {
    width: u32,
    height: u32,
}

impl PixelSize {
    /// Create a native size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }
}

/// Handle of a listener registered on an [`EventTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw host listener id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// An event delivered by the mapping API.
///
/// Mouse events carry the coordinate under the pointer; property change
/// notifications (`center_changed`, `idle`, ...) carry none.
pub trait NativeEvent {
    /// Coordinate associated with the event, if any.
    fn lat_lng(&self) -> Option<LatLng>;

    /// Stop the mapping API from propagating the event further.
    fn stop(&self);
}

/// Callback registered with [`EventTarget::add_listener`].
pub type NativeListener = Rc<dyn Fn(&dyn NativeEvent)>;

/// Event registration on a mapping API object.
pub trait EventTarget {
    /// Register a listener that fires on every occurrence of `event`.
    fn add_listener(&self, event: &str, listener: NativeListener) -> ListenerId;

    /// Register a listener that fires on the next occurrence of `event` only.
    fn add_listener_once(&self, event: &str, listener: NativeListener) -> ListenerId;

    /// Remove a previously registered listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// The map canvas.
pub trait MapCanvas: EventTarget {
    /// Current center.
    fn center(&self) -> Option<LatLng>;
    /// Jump to a new center.
    fn set_center(&self, center: Option<LatLng>);
    /// Animate to a new center.
    fn pan_to(&self, center: Option<LatLng>);
    /// Current zoom level.
    fn zoom(&self) -> f64;
    /// Set the zoom level.
    fn set_zoom(&self, zoom: f64);
    /// Current map type id (`"roadmap"`, `"satellite"`, ...).
    fn map_type_id(&self) -> String;
    /// Set the map type id.
    fn set_map_type_id(&self, map_type_id: &str);
    /// Currently visible bounds; `None` until the map has laid itself out.
    fn bounds(&self) -> Option<LatLngBounds>;
    /// Jump so that `bounds` fills the viewport.
    fn fit_bounds(&self, bounds: Option<LatLngBounds>);
    /// Animate so that `bounds` becomes visible.
    fn pan_to_bounds(&self, bounds: Option<LatLngBounds>);
    /// Update construction-time options after the fact.
    fn set_options(&self, options: &Options);
}

/// A marker placed on a map.
pub trait MarkerObject: EventTarget {
    /// Current position.
    fn position(&self) -> Option<LatLng>;
    /// Move the marker.
    fn set_position(&self, position: Option<LatLng>);
    /// Attach to a map, or detach with `None`.
    fn set_map(&self, map: Option<Rc<dyn MapCanvas>>);
    /// Set the animation (host-specific value).
    fn set_animation(&self, animation: &crate::value::OptionValue);
    /// Toggle click handling.
    fn set_clickable(&self, clickable: bool);
    /// Set the hover cursor.
    fn set_cursor(&self, cursor: &crate::value::OptionValue);
    /// Set the icon (url or host-specific icon record).
    fn set_icon(&self, icon: &crate::value::OptionValue);
    /// Set the shadow image.
    fn set_shadow(&self, shadow: &crate::value::OptionValue);
    /// Toggle dragging.
    fn set_draggable(&self, draggable: bool);
    /// Toggle flat rendering.
    fn set_flat(&self, flat: bool);
    /// Set the rollover title.
    fn set_title(&self, title: &str);
    /// Show or hide.
    fn set_visible(&self, visible: bool);
}

/// An info-window overlay.
pub trait InfoWindowObject: EventTarget {
    /// Open on `map`, optionally anchored to a marker.
    fn open(&self, map: &Rc<dyn MapCanvas>, anchor: Option<Rc<dyn MarkerObject>>);
    /// Close the window.
    fn close(&self);
    /// Move the window.
    fn set_position(&self, position: Option<LatLng>);
    /// Update construction-time options after the fact.
    fn set_options(&self, options: &Options);
}

/// Error reported by the mapping API when an object cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mapping api rejected construction: {message}")]
pub struct ApiError {
    message: String,
}

impl ApiError {
    /// Create an error with a host-provided message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Host-provided message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Factory for mapping API objects.
///
/// Each call constructs exactly one object from a fully assembled option
/// record. Most options cannot be changed afterwards.
pub trait MapsApi {
    /// Construct a map canvas.
    fn create_map(&self, options: &Options) -> Result<Rc<dyn MapCanvas>, ApiError>;

    /// Construct a marker attached to `map`.
    fn create_marker(
        &self,
        options: &Options,
        map: &Rc<dyn MapCanvas>,
    ) -> Result<Rc<dyn MarkerObject>, ApiError>;

    /// Construct an info window showing `content`.
    fn create_info_window(
        &self,
        options: &Options,
        content: Option<Content>,
    ) -> Result<Rc<dyn InfoWindowObject>, ApiError>;
}

impl fmt::Debug for dyn MapsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapsApi")
    }
}
