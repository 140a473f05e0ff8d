#![forbid(unsafe_code)]

//! Option assembly.
//!
//! Runs during the build-options phase, strictly before construction. Each
//! call reads one property from the bindings object, substitutes a default
//! when it is absent, converts it and writes it into the option record.

use mapsync_core::{OptionValue, Options, Value};

use crate::reactive::Bindings;

/// Value → option conversion used during assembly.
pub type Transform = fn(&Value) -> OptionValue;

/// Resolve `property` from `bindings` and write it into `options`.
///
/// A missing entry and [`Value::Null`] both resolve to `default`. Without a
/// transform the value passes through unchanged.
pub fn assign(
    bindings: &Bindings,
    property: &str,
    options: &mut Options,
    default: impl Into<Value>,
    transform: Option<Transform>,
) {
    let value = match bindings.value(property) {
        Some(value) if !value.is_null() => value,
        _ => default.into(),
    };
    options.insert(property, convert(&value, transform));
}

/// Like [`assign`], but writes nothing when the property is absent.
///
/// Returns whether an entry was written.
pub fn assign_optional(
    bindings: &Bindings,
    property: &str,
    options: &mut Options,
    transform: Option<Transform>,
) -> bool {
    match bindings.value(property) {
        Some(value) if !value.is_null() => {
            options.insert(property, convert(&value, transform));
            true
        }
        _ => false,
    }
}

fn convert(value: &Value, transform: Option<Transform>) -> OptionValue {
    match transform {
        Some(transform) => transform(value),
        None => OptionValue::from(value.clone()),
    }
}
