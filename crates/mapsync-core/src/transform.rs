#![forbid(unsafe_code)]

//! Pure conversions between model geometry and native mapping-API geometry.
//!
//! # Invariants
//!
//! 1. Every function is total. `None` in gives `None` out; nothing panics.
//! 2. For finite input, `*_from_external(*_to_external(x)) == x`.
//! 3. Coordinates are not validated. Non-finite or out-of-range values are
//!    passed through unchanged for the mapping API to deal with.
//!
//! The `*_option` functions lift the conversions to [`Value`] →
//! [`OptionValue`] so they can be used as option-assembly transforms. A value
//! of the wrong shape maps to [`OptionValue::Null`].

use crate::api::{LatLng, LatLngBounds, PixelSize};
use crate::geometry::{Bounds, Position, Size};
use crate::value::{OptionValue, Value};

/// Model position → native coordinate.
#[must_use]
pub const fn position_to_lat_lng(position: Position) -> LatLng {
    LatLng::new(position.latitude, position.longitude)
}

/// Native coordinate → model position.
#[must_use]
pub const fn position_from_lat_lng(lat_lng: LatLng) -> Position {
    Position::new(lat_lng.lat(), lat_lng.lng())
}

/// Model bounds → native bounds.
#[must_use]
pub const fn bounds_to_lat_lng_bounds(bounds: Bounds) -> LatLngBounds {
    LatLngBounds::new(
        position_to_lat_lng(bounds.south_west),
        position_to_lat_lng(bounds.north_east),
    )
}

/// Native bounds → model bounds.
#[must_use]
pub const fn bounds_from_lat_lng_bounds(bounds: LatLngBounds) -> Bounds {
    Bounds::new(
        position_from_lat_lng(bounds.south_west()),
        position_from_lat_lng(bounds.north_east()),
    )
}

/// Model size → native size.
#[must_use]
pub const fn size_to_pixel_size(size: Size) -> PixelSize {
    PixelSize::new(size.width, size.height)
}

/// Native size → model size.
#[must_use]
pub const fn size_from_pixel_size(size: PixelSize) -> Size {
    Size::new(size.width(), size.height())
}

/// Null-propagating [`position_to_lat_lng`].
#[must_use]
pub fn position_to_external(position: Option<Position>) -> Option<LatLng> {
    position.map(position_to_lat_lng)
}

/// Null-propagating [`position_from_lat_lng`].
#[must_use]
pub fn position_from_external(lat_lng: Option<LatLng>) -> Option<Position> {
    lat_lng.map(position_from_lat_lng)
}

/// Null-propagating [`bounds_to_lat_lng_bounds`].
#[must_use]
pub fn bounds_to_external(bounds: Option<Bounds>) -> Option<LatLngBounds> {
    bounds.map(bounds_to_lat_lng_bounds)
}

/// Null-propagating [`bounds_from_lat_lng_bounds`].
#[must_use]
pub fn bounds_from_external(bounds: Option<LatLngBounds>) -> Option<Bounds> {
    bounds.map(bounds_from_lat_lng_bounds)
}

/// Null-propagating [`size_to_pixel_size`].
#[must_use]
pub fn size_to_external(size: Option<Size>) -> Option<PixelSize> {
    size.map(size_to_pixel_size)
}

/// Null-propagating [`size_from_pixel_size`].
#[must_use]
pub fn size_from_external(size: Option<PixelSize>) -> Option<Size> {
    size.map(size_from_pixel_size)
}

/// Coerce any value to a canonical boolean.
#[must_use]
pub fn boolify(value: &Value) -> bool {
    value.is_truthy()
}

/// Option transform: position value → native coordinate.
#[must_use]
pub fn position_option(value: &Value) -> OptionValue {
    position_to_external(value.as_position()).map_or(OptionValue::Null, OptionValue::LatLng)
}

/// Option transform: bounds value → native bounds.
#[must_use]
pub fn bounds_option(value: &Value) -> OptionValue {
    bounds_to_external(value.as_bounds()).map_or(OptionValue::Null, OptionValue::Bounds)
}

/// Option transform: size value → native size.
#[must_use]
pub fn size_option(value: &Value) -> OptionValue {
    size_to_external(value.as_size()).map_or(OptionValue::Null, OptionValue::Size)
}

/// Option transform: any value → canonical boolean.
#[must_use]
pub fn bool_option(value: &Value) -> OptionValue {
    OptionValue::Bool(boolify(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn finite() -> impl Strategy<Value = f64> {
        -1.0e9f64..1.0e9f64
    }

    fn position() -> impl Strategy<Value = Position> {
        (finite(), finite()).prop_map(|(lat, lng)| Position::new(lat, lng))
    }

    proptest! {
        #[test]
        fn position_round_trip(p in position()) {
            prop_assert_eq!(position_from_external(position_to_external(Some(p))), Some(p));
        }

        #[test]
        fn bounds_round_trip(sw in position(), ne in position()) {
            let b = Bounds::new(sw, ne);
            prop_assert_eq!(bounds_from_external(bounds_to_external(Some(b))), Some(b));
        }

        #[test]
        fn size_round_trip(w in any::<u32>(), h in any::<u32>()) {
            let s = Size::new(w, h);
            prop_assert_eq!(size_from_external(size_to_external(Some(s))), Some(s));
        }
    }

    #[test]
    fn null_propagates() {
        assert_eq!(position_to_external(None), None);
        assert_eq!(position_from_external(None), None);
        assert_eq!(bounds_to_external(None), None);
        assert_eq!(bounds_from_external(None), None);
        assert_eq!(size_to_external(None), None);
        assert_eq!(size_from_external(None), None);
    }

    #[test]
    fn non_finite_passes_through() {
        let ll = position_to_lat_lng(Position::new(f64::INFINITY, 0.0));
        assert_eq!(ll.lat(), f64::INFINITY);
    }

    #[test]
    fn option_transforms_reject_wrong_shape() {
        assert_eq!(position_option(&Value::from("here")), OptionValue::Null);
        assert_eq!(bounds_option(&Value::Null), OptionValue::Null);
        assert_eq!(
            size_option(&Value::Size(Size::new(4, 2))),
            OptionValue::Size(PixelSize::new(4, 2))
        );
    }

    #[test]
    fn boolify_uses_truthiness() {
        assert!(!boolify(&Value::Null));
        assert!(boolify(&Value::from(1)));
        assert_eq!(bool_option(&Value::from("")), OptionValue::Bool(false));
        assert_eq!(bool_option(&Value::from("x")), OptionValue::Bool(true));
    }
}
