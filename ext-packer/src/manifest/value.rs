//! Static value model for `ext_emconf.php` descriptors.
//!
//! Descriptors only ever contain literal data: scalars and ordered arrays.
//! Arrays keep insertion order and accept integer or string keys, with the
//! same key normalisation and auto-indexing rules the descriptor format
//! has always had (numeric string keys become integer keys).

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Array key: either a positional integer or a textual name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Build a key from a string literal, normalising canonical decimal
    /// integers (`"7"`, `"-3"`, but not `"07"` or `"+1"`) to [`Key::Int`].
    pub fn from_text(text: &str) -> Self {
        if is_canonical_int(text) {
            if let Ok(n) = text.parse::<i64>() {
                return Key::Int(n);
            }
        }
        Key::Str(text.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

fn is_canonical_int(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits == "0" {
        return !text.starts_with('-');
    }
    !digits.starts_with('0')
}

/// Ordered associative array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    entries: Vec<(Key, ManifestValue)>,
    next_index: i64,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append with the next free integer index.
    pub fn push(&mut self, value: ManifestValue) {
        let key = Key::Int(self.next_index);
        self.insert(key, value);
    }

    /// Insert or overwrite. Overwriting keeps the original position.
    pub fn insert(&mut self, key: Key, value: ManifestValue) {
        if let Key::Int(n) = key {
            if n >= self.next_index {
                self.next_index = n.saturating_add(1);
            }
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by name (the name is normalised like a literal key).
    pub fn get(&self, name: &str) -> Option<&ManifestValue> {
        let key = Key::from_text(name);
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &ManifestValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when keys are exactly `0..len` in order.
    fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64))
    }
}

impl FromIterator<(Key, ManifestValue)> for Array {
    fn from_iter<I: IntoIterator<Item = (Key, ManifestValue)>>(iter: I) -> Self {
        let mut array = Array::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

/// A literal value from a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Array),
}

impl ManifestValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ManifestValue::Null)
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            ManifestValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Boolean coercion: null, false, 0, 0.0, "", "0" and empty arrays are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            ManifestValue::Null => false,
            ManifestValue::Bool(b) => *b,
            ManifestValue::Int(n) => *n != 0,
            ManifestValue::Float(f) => *f != 0.0,
            ManifestValue::String(s) => !(s.is_empty() || s == "0"),
            ManifestValue::Array(a) => !a.is_empty(),
        }
    }

    /// Text rendering of a scalar; `None` for arrays.
    pub fn to_text(&self) -> Option<String> {
        match self {
            ManifestValue::Null => Some(String::new()),
            ManifestValue::Bool(true) => Some("1".to_string()),
            ManifestValue::Bool(false) => Some(String::new()),
            ManifestValue::Int(n) => Some(n.to_string()),
            ManifestValue::Float(f) => Some(f.to_string()),
            ManifestValue::String(s) => Some(s.clone()),
            ManifestValue::Array(_) => None,
        }
    }
}

impl From<&str> for ManifestValue {
    fn from(s: &str) -> Self {
        ManifestValue::String(s.to_string())
    }
}

impl From<bool> for ManifestValue {
    fn from(b: bool) -> Self {
        ManifestValue::Bool(b)
    }
}

impl From<i64> for ManifestValue {
    fn from(n: i64) -> Self {
        ManifestValue::Int(n)
    }
}

impl From<Array> for ManifestValue {
    fn from(a: Array) -> Self {
        ManifestValue::Array(a)
    }
}

impl Serialize for ManifestValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ManifestValue::Null => serializer.serialize_unit(),
            ManifestValue::Bool(b) => serializer.serialize_bool(*b),
            ManifestValue::Int(n) => serializer.serialize_i64(*n),
            ManifestValue::Float(f) => serializer.serialize_f64(*f),
            ManifestValue::String(s) => serializer.serialize_str(s),
            ManifestValue::Array(a) => a.serialize(serializer),
        }
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for (_, value) in self.iter() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}
