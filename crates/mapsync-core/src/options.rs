#![forbid(unsafe_code)]

//! Construction option record.

use indexmap::IndexMap;
use indexmap::map::Iter;

use crate::api::{LatLng, LatLngBounds, PixelSize};
use crate::value::OptionValue;

/// Insertion-ordered option record passed to a mapping API constructor.
///
/// Keys are the mapping API's option names (`center`, `zoom`, `mapTypeId`,
/// ...). Writing a key twice keeps its original position and replaces the
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: IndexMap<String, OptionValue>,
}

impl Options {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A record holding a single entry.
    #[must_use]
    pub fn single(key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let mut options = Self::new();
        options.insert(key, value);
        options
    }

    /// Write an entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Whether `key` has been written.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Boolean entry.
    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    /// Numeric entry.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(OptionValue::as_number)
    }

    /// Text entry.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_text)
    }

    /// Coordinate entry.
    #[must_use]
    pub fn lat_lng(&self, key: &str) -> Option<LatLng> {
        self.get(key).and_then(OptionValue::as_lat_lng)
    }

    /// Bounds entry.
    #[must_use]
    pub fn bounds(&self, key: &str) -> Option<LatLngBounds> {
        self.get(key).and_then(OptionValue::as_bounds)
    }

    /// Size entry.
    #[must_use]
    pub fn size(&self, key: &str) -> Option<PixelSize> {
        self.get(key).and_then(OptionValue::as_size)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> Iter<'_, String, OptionValue> {
        self.entries.iter()
    }

    /// Entry keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into `self`, replacing existing keys.
    pub fn merge(&mut self, other: &Options) {
        for (key, value) in other.iter() {
            self.entries.insert(key.clone(), value.clone());
        }
    }
}

impl<'a> IntoIterator for &'a Options {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_kept() {
        let mut options = Options::new();
        options.insert("zoom", 8.0);
        options.insert("center", LatLng::new(1.0, 2.0));
        options.insert("mapTypeId", "roadmap");
        options.insert("zoom", 10.0);

        let keys: Vec<&str> = options.keys().collect();
        assert_eq!(keys, ["zoom", "center", "mapTypeId"]);
        assert_eq!(options.number("zoom"), Some(10.0));
    }

    #[test]
    fn typed_lookups() {
        let mut options = Options::single("visible", true);
        options.insert("title", "home");
        assert_eq!(options.bool("visible"), Some(true));
        assert_eq!(options.text("title"), Some("home"));
        assert_eq!(options.number("title"), None);
        assert_eq!(options.lat_lng("missing"), None);
    }

    #[test]
    fn merge_overwrites() {
        let mut base = Options::single("maxWidth", 0.0);
        base.insert("disableAutoPan", false);
        base.merge(&Options::single("maxWidth", 240.0));
        assert_eq!(base.number("maxWidth"), Some(240.0));
        assert_eq!(base.len(), 2);
    }
}
