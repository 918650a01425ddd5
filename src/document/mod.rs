pub mod parser;

mod csv_table;
mod json;
mod toml_table;
mod xml;
mod yaml;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownFormat;

/// Declared format of a document.
///
/// This is the closed set the parser supports; a format picker must offer
/// exactly [`Format::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
    Toml,
    Xml,
    Csv,
}

impl Format {
    /// All supported formats, in picker order.
    pub const ALL: [Format; 5] = [Format::Json, Format::Yaml, Format::Toml, Format::Xml, Format::Csv];

    pub fn label(self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
            Format::Xml => "XML",
            Format::Csv => "CSV",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
            Format::Xml => "xml",
            Format::Csv => "csv",
        }
    }

    /// Guess the format from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            "xml" => Some(Format::Xml),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_extension(s.trim()).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Raw text as handed over by the editor, tagged with its format and the
/// revision it was assigned on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub format: Format,
    pub revision: u64,
}

/// Ordered string-keyed mapping. Keys are unique; inserting an existing key
/// replaces its value and keeps its original position.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    entries: Vec<(String, NormalizedValue)>,
    /// key → position in `entries`
    positions: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with last-write-wins semantics. Returns the replaced value.
    pub fn insert(&mut self, key: impl Into<String>, value: NormalizedValue) -> Option<NormalizedValue> {
        let key = key.into();
        match self.positions.get(&key) {
            Some(&at) => Some(std::mem::replace(&mut self.entries[at].1, value)),
            None => {
                self.push_unique(key, value);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.positions.get(key).map(|&at| &self.entries[at].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NormalizedValue> {
        let at = *self.positions.get(key)?;
        Some(&mut self.entries[at].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &NormalizedValue)> + ExactSizeIterator {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Append a key known not to be present yet, for callers feeding maps
    /// their library already deduplicated.
    pub(crate) fn push_unique(&mut self, key: String, value: NormalizedValue) {
        debug_assert!(!self.positions.contains_key(&key), "duplicate key {key}");
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

impl FromIterator<(String, NormalizedValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, NormalizedValue)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Canonical parsed value, independent of the source format.
///
/// Numbers keep the textual form the source gave them so that no precision
/// is lost and equality is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedValue {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Sequence(Vec<NormalizedValue>),
    Mapping(Mapping),
}

impl NormalizedValue {
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    /// Number of direct children (0 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(items) => items.len(),
            Self::Mapping(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of a scalar as a viewer shows it; `None` for containers.
    pub fn scalar_text(&self) -> Option<&str> {
        match self {
            Self::Null => Some("null"),
            Self::Bool(true) => Some("true"),
            Self::Bool(false) => Some("false"),
            Self::Number(n) => Some(n),
            Self::String(s) => Some(s),
            Self::Sequence(_) | Self::Mapping(_) => None,
        }
    }

    /// Container nesting: 0 for a scalar, 1 for a flat object or array,
    /// and one more for every container level below.
    ///
    /// Walks with an explicit stack so arbitrarily deep values are safe.
    pub fn nesting(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((value, above)) = stack.pop() {
            match value {
                Self::Sequence(items) => {
                    deepest = deepest.max(above + 1);
                    stack.extend(items.iter().map(|v| (v, above + 1)));
                }
                Self::Mapping(map) => {
                    deepest = deepest.max(above + 1);
                    stack.extend(map.iter().map(|(_, v)| (v, above + 1)));
                }
                _ => {}
            }
        }
        deepest
    }

    /// Total number of values in the tree, this one included.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            total += 1;
            match value {
                Self::Sequence(items) => stack.extend(items.iter()),
                Self::Mapping(map) => stack.extend(map.iter().map(|(_, v)| v)),
                _ => {}
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_last_write_wins_keeps_position() {
        let mut map = Mapping::new();
        map.insert("a", NormalizedValue::Number("1".into()));
        map.insert("b", NormalizedValue::Null);
        let old = map.insert("a", NormalizedValue::Number("2".into()));
        assert_eq!(old, Some(NormalizedValue::Number("1".into())));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&NormalizedValue::Number("2".into())));
    }

    #[test]
    fn many_distinct_keys_keep_order_and_lookup() {
        let map: Mapping = (0..10_000)
            .map(|i| (format!("k{i}"), NormalizedValue::Number(i.to_string())))
            .collect();
        assert_eq!(map.len(), 10_000);
        assert_eq!(map.keys().nth(9_999), Some("k9999"));
        assert_eq!(map.get("k4321"), Some(&NormalizedValue::Number("4321".into())));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(Format::default(), Format::Json);
    }

    #[test]
    fn nesting_counts_container_levels() {
        assert_eq!(NormalizedValue::Null.nesting(), 0);
        let inner = NormalizedValue::Sequence(vec![NormalizedValue::Sequence(vec![])]);
        assert_eq!(inner.nesting(), 2);
        let map: Mapping = [("x".to_string(), inner)].into_iter().collect();
        assert_eq!(NormalizedValue::Mapping(map).nesting(), 3);
    }

    #[test]
    fn format_names_round_trip() {
        for format in Format::ALL {
            assert_eq!(format.extension().parse::<Format>(), Ok(format));
        }
        assert_eq!("YML".parse::<Format>(), Ok(Format::Yaml));
        assert!("ini".parse::<Format>().is_err());
    }

    #[test]
    fn scalar_text_of_values() {
        assert_eq!(NormalizedValue::Bool(false).scalar_text(), Some("false"));
        assert_eq!(NormalizedValue::Number("1.5".into()).scalar_text(), Some("1.5"));
        assert_eq!(NormalizedValue::Sequence(vec![]).scalar_text(), None);
    }
}
