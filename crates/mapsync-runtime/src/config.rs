#![forbid(unsafe_code)]

//! Defaults substituted by the option assembler.
//!
//! [`BindingDefaults::default`] carries the stock values. With the
//! `policy-config` feature a partial TOML or JSON document can override any
//! subset of them; missing fields keep their defaults.
//!
//! ```toml
//! zoom = 12.0
//! map_type_id = "satellite"
//! marker_draggable = true
//!
//! [info_window_pixel_offset]
//! width = 0
//! height = 10
//! ```

use mapsync_core::Size;

/// Per-property defaults for every bindable kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct BindingDefaults {
    /// Map zoom level.
    pub zoom: f64,
    /// Map type id.
    pub map_type_id: String,
    /// Animate center changes when `panCenter` is not bound.
    pub pan_center: bool,
    /// Animate bounds changes when `panBounds` is not bound.
    pub pan_bounds: bool,
    /// Marker `clickable`.
    pub marker_clickable: bool,
    /// Marker `draggable`.
    pub marker_draggable: bool,
    /// Marker `flat`.
    pub marker_flat: bool,
    /// Marker `raiseOnDrag`.
    pub marker_raise_on_drag: bool,
    /// Marker `visible`.
    pub marker_visible: bool,
    /// Marker `title`.
    pub marker_title: String,
    /// Info-window `disableAutoPan`.
    pub info_window_disable_auto_pan: bool,
    /// Info-window `maxWidth` (0 = unlimited).
    pub info_window_max_width: f64,
    /// Info-window `pixelOffset`.
    pub info_window_pixel_offset: Size,
}

impl Default for BindingDefaults {
    fn default() -> Self {
        Self {
            zoom: 8.0,
            map_type_id: "roadmap".to_owned(),
            pan_center: true,
            pan_bounds: true,
            marker_clickable: true,
            marker_draggable: false,
            marker_flat: false,
            marker_raise_on_drag: true,
            marker_visible: true,
            marker_title: String::new(),
            info_window_disable_auto_pan: false,
            info_window_max_width: 0.0,
            info_window_pixel_offset: Size::new(0, 0),
        }
    }
}

/// Errors from loading [`BindingDefaults`].
#[cfg(feature = "policy-config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse or shape error.
    #[error("invalid binding defaults (toml): {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse or shape error.
    #[error("invalid binding defaults (json): {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "policy-config")]
impl BindingDefaults {
    /// Parse a partial TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse a partial JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_values() {
        let d = BindingDefaults::default();
        assert_eq!(d.zoom, 8.0);
        assert_eq!(d.map_type_id, "roadmap");
        assert!(d.pan_center && d.pan_bounds);
        assert!(d.marker_clickable && d.marker_visible && d.marker_raise_on_drag);
        assert!(!d.marker_draggable && !d.marker_flat);
        assert_eq!(d.info_window_pixel_offset, Size::new(0, 0));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_overrides_subset() {
        let d = BindingDefaults::from_toml_str(
            "zoom = 12.0\nmarker_draggable = true\n\n[info_window_pixel_offset]\nwidth = 4\nheight = 2\n",
        )
        .unwrap();
        assert_eq!(d.zoom, 12.0);
        assert!(d.marker_draggable);
        assert_eq!(d.map_type_id, "roadmap");
        assert_eq!(d.info_window_pixel_offset, Size::new(4, 2));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_overrides_subset() {
        let d = BindingDefaults::from_json_str(r#"{"map_type_id":"satellite"}"#).unwrap();
        assert_eq!(d.map_type_id, "satellite");
        assert_eq!(d.zoom, 8.0);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            BindingDefaults::from_toml_str("zoom = \"high\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            BindingDefaults::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_round_trip() {
        let d = BindingDefaults {
            zoom: 3.0,
            ..BindingDefaults::default()
        };
        let text = d.to_toml_string().unwrap();
        assert_eq!(BindingDefaults::from_toml_str(&text).unwrap(), d);
    }
}
