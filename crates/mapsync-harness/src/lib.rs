#![forbid(unsafe_code)]

//! Recording mock of the mapping API.
//!
//! Every object created through [`MockMapsApi`] writes each call it receives
//! into one shared [`CallLog`], so tests can assert on exact call sequences
//! across objects. Setters echo the corresponding change event synchronously,
//! the way the browser API does; [`MockMap::set_echo`] and friends turn that
//! off.
//!
//! User interaction is simulated with the `simulate_*` methods, which update
//! the object's state without logging a call and then fire the events the
//! real API would fire.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use mapsync_core::Options;
//! use mapsync_core::api::{LatLng, MapCanvas, MapsApi};
//! use mapsync_harness::MockMapsApi;
//!
//! let api = MockMapsApi::new();
//! let map = api.create_map(&Options::new()).unwrap();
//! map.set_zoom(4.0);
//! assert_eq!(api.log().count("set_zoom"), 1);
//! api.last_map().unwrap().simulate_center(LatLng::new(1.0, 2.0));
//! assert_eq!(map.center(), Some(LatLng::new(1.0, 2.0)));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use mapsync_core::api::{
    ApiError, Content, EventTarget, InfoWindowObject, LatLng, LatLngBounds, ListenerId, MapCanvas,
    MapsApi, MarkerObject, NativeEvent, NativeListener,
};
use mapsync_core::{OptionValue, Options};

// ---------------------------------------------------------------------------
// CallLog
// ---------------------------------------------------------------------------

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Receiver (`"api"`, `"map#0"`, `"marker#1"`, ...).
    pub object: String,
    /// Method name.
    pub method: &'static str,
    /// Argument, `Debug`-formatted.
    pub argument: String,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.object, self.method, self.argument)
    }
}

/// Shared, ordered record of calls into mock objects.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, object: &str, method: &'static str, argument: impl fmt::Debug) {
        let call = Call {
            object: object.to_owned(),
            method,
            argument: format!("{argument:?}"),
        };
        tracing::trace!(call = %call, "mock call");
        self.calls.borrow_mut().push(call);
    }

    /// Every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls rendered as `object.method(argument)`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    /// Method names in call order.
    #[must_use]
    pub fn methods(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|call| call.method).collect()
    }

    /// Number of calls to `method` on any object.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Number of calls to `method` on `object`.
    #[must_use]
    pub fn count_on(&self, object: &str, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.object == object && call.method == method)
            .count()
    }

    /// Number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A native event with an optional coordinate.
#[derive(Debug, Default)]
pub struct MockNativeEvent {
    lat_lng: Option<LatLng>,
    stopped: Cell<bool>,
}

impl MockNativeEvent {
    /// A mouse event at `lat_lng`.
    #[must_use]
    pub fn at(lat_lng: LatLng) -> Self {
        Self {
            lat_lng: Some(lat_lng),
            stopped: Cell::new(false),
        }
    }

    /// A property change notification.
    #[must_use]
    pub fn change() -> Self {
        Self::default()
    }

    /// Whether a listener called [`NativeEvent::stop`].
    #[must_use]
    pub fn was_stopped(&self) -> bool {
        self.stopped.get()
    }
}

impl NativeEvent for MockNativeEvent {
    fn lat_lng(&self) -> Option<LatLng> {
        self.lat_lng
    }

    fn stop(&self) {
        self.stopped.set(true);
    }
}

struct Registration {
    id: ListenerId,
    event: String,
    listener: NativeListener,
    once: bool,
}

/// Listener registry backing every mock object.
#[derive(Default)]
pub struct EventHub {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Registration>>,
}

impl EventHub {
    fn add(&self, event: &str, listener: NativeListener, once: bool) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(id.get() + 1);
        self.listeners.borrow_mut().push(Registration {
            id,
            event: event.to_owned(),
            listener,
            once,
        });
        id
    }

    fn remove(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|r| r.id != id);
    }

    /// Deliver `event` to its listeners in registration order. Returns how
    /// many ran.
    ///
    /// Listeners registered while delivering do not see this occurrence.
    pub fn fire(&self, event: &str, payload: &dyn NativeEvent) -> usize {
        let targets: Vec<NativeListener> = {
            let mut listeners = self.listeners.borrow_mut();
            let targets = listeners
                .iter()
                .filter(|r| r.event == event)
                .map(|r| Rc::clone(&r.listener))
                .collect();
            listeners.retain(|r| !(r.once && r.event == event));
            targets
        };
        for listener in &targets {
            listener(payload);
        }
        targets.len()
    }

    /// Live listeners for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Live listeners for any event.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

macro_rules! event_target {
    ($ty:ty) => {
        impl EventTarget for $ty {
            fn add_listener(&self, event: &str, listener: NativeListener) -> ListenerId {
                self.common.events.add(event, listener, false)
            }

            fn add_listener_once(&self, event: &str, listener: NativeListener) -> ListenerId {
                self.common.events.add(event, listener, true)
            }

            fn remove_listener(&self, id: ListenerId) {
                self.common.events.remove(id);
            }
        }
    };
}

/// State shared by every mock object.
#[derive(Debug)]
struct Common {
    name: String,
    log: CallLog,
    events: EventHub,
    echo: Cell<bool>,
    options: RefCell<Options>,
}

impl Common {
    fn new(name: String, log: CallLog, options: &Options) -> Self {
        Self {
            name,
            log,
            events: EventHub::default(),
            echo: Cell::new(true),
            options: RefCell::new(options.clone()),
        }
    }

    fn record(&self, method: &'static str, argument: impl fmt::Debug) {
        self.log.record(&self.name, method, argument);
    }

    fn echo(&self, event: &str) {
        if self.echo.get() {
            self.events.fire(event, &MockNativeEvent::change());
        }
    }

    fn set_option(&self, key: &str, value: impl Into<OptionValue>) {
        self.options.borrow_mut().insert(key, value);
    }
}

// ---------------------------------------------------------------------------
// MockMap
// ---------------------------------------------------------------------------

/// Recording map canvas.
#[derive(Debug)]
pub struct MockMap {
    common: Common,
    center: Cell<Option<LatLng>>,
    zoom: Cell<f64>,
    map_type_id: RefCell<String>,
    bounds: Cell<Option<LatLngBounds>>,
    normalize: Cell<bool>,
}

/// Zoom range the normalizing map clamps to.
pub const ZOOM_RANGE: (f64, f64) = (0.0, 22.0);

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

impl MockMap {
    fn new(name: String, log: CallLog, options: &Options) -> Self {
        Self {
            center: Cell::new(options.lat_lng("center")),
            zoom: Cell::new(options.number("zoom").unwrap_or(0.0)),
            map_type_id: RefCell::new(options.text("mapTypeId").unwrap_or("roadmap").to_owned()),
            bounds: Cell::new(options.bounds("bounds")),
            normalize: Cell::new(false),
            common: Common::new(name, log, options),
        }
    }

    /// Store what a real map would: zoom clamped to [`ZOOM_RANGE`],
    /// longitude wrapped into `[-180, 180)`. The echo then carries the
    /// normalized value rather than the one written.
    pub fn set_normalize(&self, normalize: bool) {
        self.normalize.set(normalize);
    }

    /// Options as constructed, with later `set_options` merged in.
    #[must_use]
    pub fn options(&self) -> Options {
        self.common.options.borrow().clone()
    }

    /// Turn synchronous change echoes on or off.
    pub fn set_echo(&self, echo: bool) {
        self.common.echo.set(echo);
    }

    /// Live listeners for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.common.events.listener_count(event)
    }

    /// Live listeners for any event.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.common.events.total_listeners()
    }

    /// The user dragged the map to `center`.
    pub fn simulate_center(&self, center: LatLng) {
        self.center.set(Some(center));
        self.fire_change("center_changed");
    }

    /// The user zoomed to `zoom`.
    pub fn simulate_zoom(&self, zoom: f64) {
        self.zoom.set(zoom);
        self.fire_change("zoom_changed");
    }

    /// The user picked another map type.
    pub fn simulate_map_type(&self, map_type_id: &str) {
        *self.map_type_id.borrow_mut() = map_type_id.to_owned();
        self.fire_change("maptypeid_changed");
    }

    /// The viewport changed to `bounds`.
    pub fn simulate_bounds(&self, bounds: LatLngBounds) {
        self.bounds.set(Some(bounds));
        self.fire_change("bounds_changed");
    }

    /// The map finished laying itself out with `bounds` visible.
    pub fn simulate_idle(&self, bounds: LatLngBounds) {
        self.bounds.set(Some(bounds));
        self.fire_change("idle");
    }

    /// Fire a mouse event at `lat_lng`. Returns the event for inspection.
    pub fn fire(&self, event: &str, lat_lng: LatLng) -> MockNativeEvent {
        let payload = MockNativeEvent::at(lat_lng);
        self.common.events.fire(event, &payload);
        payload
    }

    fn normalized_center(&self, center: Option<LatLng>) -> Option<LatLng> {
        match center {
            Some(c) if self.normalize.get() => Some(LatLng::new(c.lat(), wrap_lng(c.lng()))),
            other => other,
        }
    }

    fn fire_change(&self, event: &str) {
        self.common.events.fire(event, &MockNativeEvent::change());
    }
}

event_target!(MockMap);

impl MapCanvas for MockMap {
    fn center(&self) -> Option<LatLng> {
        self.center.get()
    }

    fn set_center(&self, center: Option<LatLng>) {
        self.common.record("set_center", center);
        self.center.set(self.normalized_center(center));
        self.common.echo("center_changed");
    }

    fn pan_to(&self, center: Option<LatLng>) {
        self.common.record("pan_to", center);
        self.center.set(self.normalized_center(center));
        self.common.echo("center_changed");
    }

    fn zoom(&self) -> f64 {
        self.zoom.get()
    }

    fn set_zoom(&self, zoom: f64) {
        self.common.record("set_zoom", zoom);
        let zoom = if self.normalize.get() {
            zoom.clamp(ZOOM_RANGE.0, ZOOM_RANGE.1)
        } else {
            zoom
        };
        self.zoom.set(zoom);
        self.common.echo("zoom_changed");
    }

    fn map_type_id(&self) -> String {
        self.map_type_id.borrow().clone()
    }

    fn set_map_type_id(&self, map_type_id: &str) {
        self.common.record("set_map_type_id", map_type_id);
        *self.map_type_id.borrow_mut() = map_type_id.to_owned();
        self.common.echo("maptypeid_changed");
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds.get()
    }

    fn fit_bounds(&self, bounds: Option<LatLngBounds>) {
        self.common.record("fit_bounds", bounds);
        self.bounds.set(bounds);
        self.common.echo("bounds_changed");
    }

    fn pan_to_bounds(&self, bounds: Option<LatLngBounds>) {
        self.common.record("pan_to_bounds", bounds);
        self.bounds.set(bounds);
        self.common.echo("bounds_changed");
    }

    fn set_options(&self, options: &Options) {
        self.common.record("set_options", options);
        self.common.options.borrow_mut().merge(options);
    }
}

// ---------------------------------------------------------------------------
// MockMarker
// ---------------------------------------------------------------------------

/// Recording marker.
#[derive(Debug)]
pub struct MockMarker {
    common: Common,
    position: Cell<Option<LatLng>>,
    attached: Cell<bool>,
}

impl MockMarker {
    fn new(name: String, log: CallLog, options: &Options) -> Self {
        Self {
            position: Cell::new(options.lat_lng("position")),
            attached: Cell::new(true),
            common: Common::new(name, log, options),
        }
    }

    /// Current value of a property, as constructed or last set.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<OptionValue> {
        self.common.options.borrow().get(name).cloned()
    }

    /// Whether the marker is attached to a map.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Turn synchronous change echoes on or off.
    pub fn set_echo(&self, echo: bool) {
        self.common.echo.set(echo);
    }

    /// Live listeners for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.common.events.listener_count(event)
    }

    /// Live listeners for any event.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.common.events.total_listeners()
    }

    /// The user dragged the marker to `to`: `position_changed` while
    /// moving, `dragend` on release.
    pub fn simulate_drag(&self, to: LatLng) {
        self.position.set(Some(to));
        self.common
            .events
            .fire("position_changed", &MockNativeEvent::change());
        self.common.events.fire("dragend", &MockNativeEvent::at(to));
    }

    /// Fire a mouse event at the marker's position.
    pub fn fire(&self, event: &str) -> MockNativeEvent {
        let payload = MockNativeEvent {
            lat_lng: self.position.get(),
            stopped: Cell::new(false),
        };
        self.common.events.fire(event, &payload);
        payload
    }

    fn set_property(&self, method: &'static str, name: &str, value: impl Into<OptionValue>) {
        let value = value.into();
        self.common.record(method, &value);
        self.common.set_option(name, value);
    }
}

event_target!(MockMarker);

impl MarkerObject for MockMarker {
    fn position(&self) -> Option<LatLng> {
        self.position.get()
    }

    fn set_position(&self, position: Option<LatLng>) {
        self.common.record("set_position", position);
        self.position.set(position);
        self.common.echo("position_changed");
    }

    fn set_map(&self, map: Option<Rc<dyn MapCanvas>>) {
        self.common.record("set_map", map.as_ref().map(|_| "map"));
        self.attached.set(map.is_some());
    }

    fn set_animation(&self, animation: &OptionValue) {
        self.set_property("set_animation", "animation", animation.clone());
    }

    fn set_clickable(&self, clickable: bool) {
        self.set_property("set_clickable", "clickable", clickable);
    }

    fn set_cursor(&self, cursor: &OptionValue) {
        self.set_property("set_cursor", "cursor", cursor.clone());
    }

    fn set_icon(&self, icon: &OptionValue) {
        self.set_property("set_icon", "icon", icon.clone());
    }

    fn set_shadow(&self, shadow: &OptionValue) {
        self.set_property("set_shadow", "shadow", shadow.clone());
    }

    fn set_draggable(&self, draggable: bool) {
        self.set_property("set_draggable", "draggable", draggable);
    }

    fn set_flat(&self, flat: bool) {
        self.set_property("set_flat", "flat", flat);
    }

    fn set_title(&self, title: &str) {
        self.set_property("set_title", "title", title);
    }

    fn set_visible(&self, visible: bool) {
        self.set_property("set_visible", "visible", visible);
    }
}

// ---------------------------------------------------------------------------
// MockInfoWindow
// ---------------------------------------------------------------------------

/// Recording info window.
#[derive(Debug)]
pub struct MockInfoWindow {
    common: Common,
    content: Option<Content>,
    open: Cell<bool>,
    anchored: Cell<bool>,
    position: Cell<Option<LatLng>>,
}

impl MockInfoWindow {
    fn new(name: String, log: CallLog, options: &Options, content: Option<Content>) -> Self {
        Self {
            position: Cell::new(options.lat_lng("position")),
            common: Common::new(name, log, options),
            content,
            open: Cell::new(false),
            anchored: Cell::new(false),
        }
    }

    /// Whether the window is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Whether the last `open` passed an anchor.
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchored.get()
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Option<LatLng> {
        self.position.get()
    }

    /// The content handed to the constructor, as `T`.
    #[must_use]
    pub fn content<T: 'static>(&self) -> Option<Rc<T>> {
        self.content
            .as_ref()
            .and_then(|content| Rc::clone(content).downcast::<T>().ok())
    }

    /// Options as constructed, with later `set_options` merged in.
    #[must_use]
    pub fn options(&self) -> Options {
        self.common.options.borrow().clone()
    }

    /// Live listeners for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.common.events.listener_count(event)
    }

    /// Live listeners for any event.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.common.events.total_listeners()
    }

    /// The user clicked the close button.
    pub fn simulate_close_click(&self) {
        self.open.set(false);
        self.common
            .events
            .fire("closeclick", &MockNativeEvent::change());
    }
}

event_target!(MockInfoWindow);

impl InfoWindowObject for MockInfoWindow {
    fn open(&self, _map: &Rc<dyn MapCanvas>, anchor: Option<Rc<dyn MarkerObject>>) {
        self.common
            .record("open", anchor.as_ref().map(|_| "anchor"));
        self.open.set(true);
        self.anchored.set(anchor.is_some());
    }

    fn close(&self) {
        self.common.record("close", ());
        self.open.set(false);
    }

    fn set_position(&self, position: Option<LatLng>) {
        self.common.record("set_position", position);
        self.position.set(position);
    }

    fn set_options(&self, options: &Options) {
        self.common.record("set_options", options);
        self.common.options.borrow_mut().merge(options);
    }
}

// ---------------------------------------------------------------------------
// MockMapsApi
// ---------------------------------------------------------------------------

/// Mapping API that builds recording mocks.
#[derive(Debug, Default)]
pub struct MockMapsApi {
    log: CallLog,
    maps: RefCell<Vec<Rc<MockMap>>>,
    markers: RefCell<Vec<Rc<MockMarker>>>,
    info_windows: RefCell<Vec<Rc<MockInfoWindow>>>,
    failure: RefCell<Option<String>>,
}

impl MockMapsApi {
    /// Create an API with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared call log.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Make every later construction fail with `message`.
    pub fn fail_construction(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_owned());
    }

    /// Undo [`fail_construction`](Self::fail_construction).
    pub fn allow_construction(&self) {
        *self.failure.borrow_mut() = None;
    }

    /// Objects constructed so far.
    #[must_use]
    pub fn construction_count(&self) -> usize {
        self.maps.borrow().len() + self.markers.borrow().len() + self.info_windows.borrow().len()
    }

    /// The `index`th map.
    #[must_use]
    pub fn map(&self, index: usize) -> Option<Rc<MockMap>> {
        self.maps.borrow().get(index).cloned()
    }

    /// The most recent map.
    #[must_use]
    pub fn last_map(&self) -> Option<Rc<MockMap>> {
        self.maps.borrow().last().cloned()
    }

    /// The `index`th marker.
    #[must_use]
    pub fn marker(&self, index: usize) -> Option<Rc<MockMarker>> {
        self.markers.borrow().get(index).cloned()
    }

    /// The most recent marker.
    #[must_use]
    pub fn last_marker(&self) -> Option<Rc<MockMarker>> {
        self.markers.borrow().last().cloned()
    }

    /// Number of markers built.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.borrow().len()
    }

    /// The most recent info window.
    #[must_use]
    pub fn last_info_window(&self) -> Option<Rc<MockInfoWindow>> {
        self.info_windows.borrow().last().cloned()
    }

    fn check(&self, method: &'static str, options: &Options) -> Result<(), ApiError> {
        self.log.record("api", method, options);
        match self.failure.borrow().as_deref() {
            Some(message) => Err(ApiError::new(message)),
            None => Ok(()),
        }
    }
}

impl MapsApi for MockMapsApi {
    fn create_map(&self, options: &Options) -> Result<Rc<dyn MapCanvas>, ApiError> {
        self.check("create_map", options)?;
        let name = format!("map#{}", self.maps.borrow().len());
        let map = Rc::new(MockMap::new(name, self.log.clone(), options));
        self.maps.borrow_mut().push(Rc::clone(&map));
        Ok(map)
    }

    fn create_marker(
        &self,
        options: &Options,
        _map: &Rc<dyn MapCanvas>,
    ) -> Result<Rc<dyn MarkerObject>, ApiError> {
        self.check("create_marker", options)?;
        let name = format!("marker#{}", self.markers.borrow().len());
        let marker = Rc::new(MockMarker::new(name, self.log.clone(), options));
        self.markers.borrow_mut().push(Rc::clone(&marker));
        Ok(marker)
    }

    fn create_info_window(
        &self,
        options: &Options,
        content: Option<Content>,
    ) -> Result<Rc<dyn InfoWindowObject>, ApiError> {
        self.check("create_info_window", options)?;
        let name = format!("infoWindow#{}", self.info_windows.borrow().len());
        let window = Rc::new(MockInfoWindow::new(name, self.log.clone(), options, content));
        self.info_windows.borrow_mut().push(Rc::clone(&window));
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_listeners_fire_once() {
        let hub = EventHub::default();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        hub.add("idle", Rc::new(move |_: &dyn NativeEvent| h.set(h.get() + 1)), true);
        assert_eq!(hub.fire("idle", &MockNativeEvent::change()), 1);
        assert_eq!(hub.fire("idle", &MockNativeEvent::change()), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn removed_listener_is_silent() {
        let hub = EventHub::default();
        let id = hub.add("click", Rc::new(|_: &dyn NativeEvent| {}), false);
        hub.remove(id);
        assert_eq!(hub.fire("click", &MockNativeEvent::change()), 0);
        assert_eq!(hub.total_listeners(), 0);
    }

    #[test]
    fn longitude_wraps_into_half_open_range() {
        assert_eq!(wrap_lng(190.0), -170.0);
        assert_eq!(wrap_lng(-190.0), 170.0);
        assert_eq!(wrap_lng(180.0), -180.0);
        assert_eq!(wrap_lng(45.0), 45.0);
    }

    #[test]
    fn setters_echo_unless_disabled() {
        let api = MockMapsApi::new();
        let map = api.create_map(&Options::new()).unwrap();
        let echoes = Rc::new(Cell::new(0));
        let e = Rc::clone(&echoes);
        map.add_listener("zoom_changed", Rc::new(move |_: &dyn NativeEvent| e.set(e.get() + 1)));

        map.set_zoom(3.0);
        api.last_map().unwrap().set_echo(false);
        map.set_zoom(4.0);

        assert_eq!(echoes.get(), 1);
        assert_eq!(map.zoom(), 4.0);
        assert_eq!(api.log().count_on("map#0", "set_zoom"), 2);
    }

    #[test]
    fn construction_can_be_refused() {
        let api = MockMapsApi::new();
        api.fail_construction("no container");
        assert!(api.create_map(&Options::new()).is_err());
        assert_eq!(api.construction_count(), 0);
        assert_eq!(api.log().methods(), ["create_map"]);
    }

    #[test]
    fn marker_records_properties() {
        let api = MockMapsApi::new();
        let map = api.create_map(&Options::new()).unwrap();
        let marker = api.create_marker(&Options::new(), &map).unwrap();
        marker.set_title("home");
        marker.set_map(None);

        let mock = api.last_marker().unwrap();
        assert_eq!(mock.property("title"), Some(OptionValue::from("home")));
        assert!(!mock.is_attached());
        assert_eq!(
            api.log().lines().last().map(String::as_str),
            Some("marker#0.set_map(None)")
        );
    }
}
