#![forbid(unsafe_code)]

//! Dynamic values carried by bindings and option records.
//!
//! [`Value`] is what a view model exposes (plain data, model geometry).
//! [`OptionValue`] is what the mapping API receives (plain data, native
//! geometry). Geometry crosses between the two only through
//! [`crate::transform`].
//!
//! # Truthiness
//!
//! [`Value::is_truthy`] follows double-negation semantics: `Null`, `false`,
//! `0`, `NaN` and the empty string are falsy; everything else, including
//! every geometry value, is truthy.

use crate::api::{LatLng, LatLngBounds, PixelSize};
use crate::geometry::{Bounds, Position, Size};

/// A model-facing dynamic value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Number (zoom levels, widths, headings).
    Number(f64),
    /// Text (map type ids, titles, colors).
    Text(String),
    /// Model position.
    Position(Position),
    /// Model bounds.
    Bounds(Bounds),
    /// Model size.
    Size(Size),
}

impl Value {
    /// Whether this is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness under double-negation semantics.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Position(_) | Self::Bounds(_) | Self::Size(_) => true,
        }
    }

    /// The boolean, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is a `Number`.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text, if this is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The position, if this is a `Position`.
    #[must_use]
    pub const fn as_position(&self) -> Option<Position> {
        match self {
            Self::Position(p) => Some(*p),
            _ => None,
        }
    }

    /// The bounds, if this is `Bounds`.
    #[must_use]
    pub const fn as_bounds(&self) -> Option<Bounds> {
        match self {
            Self::Bounds(b) => Some(*b),
            _ => None,
        }
    }

    /// The size, if this is a `Size`.
    #[must_use]
    pub const fn as_size(&self) -> Option<Size> {
        match self {
            Self::Size(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Position> for Value {
    fn from(value: Position) -> Self {
        Self::Position(value)
    }
}

impl From<Bounds> for Value {
    fn from(value: Bounds) -> Self {
        Self::Bounds(value)
    }
}

impl From<Size> for Value {
    fn from(value: Size) -> Self {
        Self::Size(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A value written into an [`Options`](crate::options::Options) record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OptionValue {
    /// Unset.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Text.
    Text(String),
    /// Native coordinate.
    LatLng(LatLng),
    /// Native bounds.
    Bounds(LatLngBounds),
    /// Native pixel size.
    Size(PixelSize),
}

impl OptionValue {
    /// Whether this is [`OptionValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is a `Number`.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text, if this is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The coordinate, if this is a `LatLng`.
    #[must_use]
    pub const fn as_lat_lng(&self) -> Option<LatLng> {
        match self {
            Self::LatLng(ll) => Some(*ll),
            _ => None,
        }
    }

    /// The bounds, if this is `Bounds`.
    #[must_use]
    pub const fn as_bounds(&self) -> Option<LatLngBounds> {
        match self {
            Self::Bounds(b) => Some(*b),
            _ => None,
        }
    }

    /// The size, if this is a `Size`.
    #[must_use]
    pub const fn as_size(&self) -> Option<PixelSize> {
        match self {
            Self::Size(s) => Some(*s),
            _ => None,
        }
    }
}

/// Untransformed pass-through. Model geometry maps to its native form.
impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::Text(s) => Self::Text(s),
            Value::Position(p) => Self::LatLng(crate::transform::position_to_lat_lng(p)),
            Value::Bounds(b) => Self::Bounds(crate::transform::bounds_to_lat_lng_bounds(b)),
            Value::Size(s) => Self::Size(crate::transform::size_to_pixel_size(s)),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<LatLng> for OptionValue {
    fn from(value: LatLng) -> Self {
        Self::LatLng(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_double_negation() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Position(Position::default()).is_truthy());
        assert!(Value::Size(Size::new(0, 0)).is_truthy());
    }

    #[test]
    fn option_conversion_is_null_preserving() {
        assert_eq!(Value::from(None::<Position>), Value::Null);
        assert_eq!(
            Value::from(Some(Position::new(1.0, 2.0))),
            Value::Position(Position::new(1.0, 2.0))
        );
    }

    #[test]
    fn pass_through_converts_geometry() {
        let ov = OptionValue::from(Value::Position(Position::new(3.0, 4.0)));
        assert_eq!(ov.as_lat_lng(), Some(LatLng::new(3.0, 4.0)));

        let ov = OptionValue::from(Value::from("roadmap"));
        assert_eq!(ov.as_text(), Some("roadmap"));
    }

    #[test]
    fn accessors_reject_other_shapes() {
        let v = Value::from(8);
        assert_eq!(v.as_number(), Some(8.0));
        assert_eq!(v.as_text(), None);
        assert_eq!(v.as_position(), None);
        assert_eq!(OptionValue::Null.as_bool(), None);
    }
}
