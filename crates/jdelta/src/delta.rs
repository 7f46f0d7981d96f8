//! The encoded delta and its shape classifier.
//!
//! A delta is itself JSON, so any JSON writer can persist it:
//!
//! | Kind | Encoding |
//! |------|----------|
//! | added | `[new]` |
//! | modified | `[old, new]` |
//! | deleted | `[old, 0, 0]` |
//! | array move | `["", newIndex, 3]` (or `[value, newIndex, 3]`) |
//! | text diff | `[patchText, 0, 2]` |
//! | object delta | `{ key: delta, ... }` |
//! | array delta | `{ "_t": "a", "N": delta, "_N": delta, ... }` |
//!
//! In an array delta a plain index addresses the post-change (right) array and
//! an underscore-prefixed index addresses the pre-change (left) array. No kind
//! field is stored; [`Delta::kind`] re-derives it from the shape every time.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DeltaError;

/// Marker key identifying an array delta.
pub const ARRAY_MARKER_KEY: &str = "_t";
/// Marker value identifying an array delta.
pub const ARRAY_MARKER_VALUE: &str = "a";
/// Third element of a deletion.
pub const DELETED_TAG: u64 = 0;
/// Third element of a text diff.
pub const TEXT_DIFF_TAG: u64 = 2;
/// Third element of an array move.
pub const ARRAY_MOVE_TAG: u64 = 3;

/// The kind of a delta node, derived from its shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    Added,
    Modified,
    Deleted,
    ArrayMove,
    Text,
    Object,
    Array,
}

/// Borrowed, classified view of a delta node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeltaView<'a> {
    Added(&'a Value),
    Modified { old: &'a Value, new: &'a Value },
    Deleted(&'a Value),
    /// `value` is `""` unless the move was recorded with its value.
    ArrayMove { new_index: usize, value: &'a Value },
    Text(&'a str),
    Object(&'a Map<String, Value>),
    Array(ArrayDeltaRef<'a>),
}

impl DeltaView<'_> {
    pub fn kind(&self) -> DeltaKind {
        match self {
            DeltaView::Added(_) => DeltaKind::Added,
            DeltaView::Modified { .. } => DeltaKind::Modified,
            DeltaView::Deleted(_) => DeltaKind::Deleted,
            DeltaView::ArrayMove { .. } => DeltaKind::ArrayMove,
            DeltaView::Text(_) => DeltaKind::Text,
            DeltaView::Object(_) => DeltaKind::Object,
            DeltaView::Array(_) => DeltaKind::Array,
        }
    }
}

/// Which side of an array an array-delta key addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayIndex {
    /// `_N`: index in the pre-change array.
    Left(usize),
    /// `N`: index in the post-change array.
    Right(usize),
}

impl ArrayIndex {
    /// Parse an array-delta key. Only canonical decimal indices are accepted.
    pub fn parse(key: &str) -> Option<Self> {
        match key.strip_prefix('_') {
            Some(rest) => parse_canonical_index(rest).map(ArrayIndex::Left),
            None => parse_canonical_index(key).map(ArrayIndex::Right),
        }
    }

    pub fn to_key(self) -> String {
        match self {
            ArrayIndex::Left(i) => format!("_{i}"),
            ArrayIndex::Right(i) => i.to_string(),
        }
    }
}

fn parse_canonical_index(text: &str) -> Option<usize> {
    let canonical = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));
    if canonical {
        text.parse().ok()
    } else {
        None
    }
}

/// Borrowed array delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrayDeltaRef<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> ArrayDeltaRef<'a> {
    /// Entries other than the marker: raw key, parsed index (if valid), delta.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, Option<ArrayIndex>, &'a Value)> + 'a {
        self.map
            .iter()
            .filter(|(key, _)| key.as_str() != ARRAY_MARKER_KEY)
            .map(|(key, value)| (key.as_str(), ArrayIndex::parse(key), value))
    }

    /// Number of entries other than the marker.
    pub fn len(&self) -> usize {
        self.map.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify a raw JSON value as a delta node.
///
/// Returns `None` when the value has no delta shape.
pub fn classify(value: &Value) -> Option<DeltaView<'_>> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [new] => Some(DeltaView::Added(new)),
            [old, new] => Some(DeltaView::Modified { old, new }),
            [first, second, tag] => match tag.as_u64()? {
                DELETED_TAG if is_zero(second) => Some(DeltaView::Deleted(first)),
                TEXT_DIFF_TAG if is_zero(second) => first.as_str().map(DeltaView::Text),
                ARRAY_MOVE_TAG => {
                    let new_index = usize::try_from(second.as_u64()?).ok()?;
                    Some(DeltaView::ArrayMove {
                        new_index,
                        value: first,
                    })
                }
                _ => None,
            },
            _ => None,
        },
        Value::Object(map) => {
            if is_array_delta_map(map) {
                Some(DeltaView::Array(ArrayDeltaRef { map }))
            } else {
                Some(DeltaView::Object(map))
            }
        }
        _ => None,
    }
}

fn is_zero(value: &Value) -> bool {
    value.as_u64() == Some(0)
}

fn is_array_delta_map(map: &Map<String, Value>) -> bool {
    map.get(ARRAY_MARKER_KEY).and_then(Value::as_str) == Some(ARRAY_MARKER_VALUE)
}

/// An encoded diff between two JSON values.
///
/// `Delta` is a thin wrapper around its JSON encoding; it serializes to and
/// from exactly that encoding.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Delta(Value);

impl Delta {
    /// `[value]`
    pub fn added(value: Value) -> Self {
        Delta(Value::Array(vec![value]))
    }

    /// `[old, new]`
    pub fn modified(old: Value, new: Value) -> Self {
        Delta(Value::Array(vec![old, new]))
    }

    /// `[old, 0, 0]`
    pub fn deleted(old: Value) -> Self {
        Delta(Value::Array(vec![old, Value::from(0), Value::from(DELETED_TAG)]))
    }

    /// `["", new_index, 3]`, or `[value, new_index, 3]` when a value is given.
    pub fn array_move(new_index: usize, value: Option<Value>) -> Self {
        let first = value.unwrap_or_else(|| Value::String(String::new()));
        Delta(Value::Array(vec![
            first,
            Value::from(new_index),
            Value::from(ARRAY_MOVE_TAG),
        ]))
    }

    /// `[patch, 0, 2]`
    pub fn text(patch: String) -> Self {
        Delta(Value::Array(vec![
            Value::String(patch),
            Value::from(0),
            Value::from(TEXT_DIFF_TAG),
        ]))
    }

    /// An empty object delta.
    pub fn object() -> Self {
        Delta(Value::Object(Map::new()))
    }

    /// An empty array delta (marker only).
    pub fn array() -> Self {
        let mut map = Map::new();
        map.insert(
            ARRAY_MARKER_KEY.to_string(),
            Value::String(ARRAY_MARKER_VALUE.to_string()),
        );
        Delta(Value::Object(map))
    }

    /// Wrap a raw value, checking that its top level has a delta shape.
    pub fn from_value(value: Value) -> Result<Self, DeltaError> {
        if classify(&value).is_none() {
            return Err(DeltaError::InvalidShape(truncate(&value.to_string())));
        }
        Ok(Delta(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Classified view of this node.
    pub fn view(&self) -> DeltaView<'_> {
        match classify(&self.0) {
            Some(view) => view,
            None => unreachable!("constructors and from_value only admit delta shapes"),
        }
    }

    pub fn kind(&self) -> DeltaKind {
        self.view().kind()
    }

    /// Set `key` in an object delta. No-op on other kinds.
    pub fn set_property(&mut self, key: &str, child: Delta) {
        if self.kind() != DeltaKind::Object {
            return;
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), child.0);
        }
    }

    /// Set an entry in an array delta. No-op on other kinds.
    pub fn set_array_entry(&mut self, index: ArrayIndex, child: Delta) {
        if self.kind() != DeltaKind::Array {
            return;
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(index.to_key(), child.0);
        }
    }

    /// Set the entry addressing right-side `index`.
    pub fn set_right_item(&mut self, index: usize, child: Delta) {
        self.set_array_entry(ArrayIndex::Right(index), child);
    }

    /// Set the entry addressing left-side `index`.
    pub fn set_left_item(&mut self, index: usize, child: Delta) {
        self.set_array_entry(ArrayIndex::Left(index), child);
    }

    /// Child of an object delta.
    pub fn property(&self, key: &str) -> Option<&Value> {
        match self.view() {
            DeltaView::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Entry of an array delta.
    pub fn array_entry(&self, index: ArrayIndex) -> Option<&Value> {
        match self.view() {
            DeltaView::Array(array) => array.map.get(&index.to_key()),
            _ => None,
        }
    }

    /// Whether this is a container delta with no entries.
    pub fn is_empty(&self) -> bool {
        match self.view() {
            DeltaView::Object(map) => map.is_empty(),
            DeltaView::Array(array) => array.is_empty(),
            _ => false,
        }
    }

    /// `None` for an empty container delta, otherwise `Some(self)`.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 80;
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl TryFrom<Value> for Delta {
    type Error = DeltaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Delta::from_value(value)
    }
}

impl From<Delta> for Value {
    fn from(delta: Delta) -> Self {
        delta.0
    }
}

impl AsRef<Value> for Delta {
    fn as_ref(&self) -> &Value {
        &self.0
    }
}

impl fmt::Debug for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delta({:?}, {})", self.kind(), self.0)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_encode_wire_format() {
        assert_eq!(Delta::added(json!(1)).into_value(), json!([1]));
        assert_eq!(Delta::modified(json!(1), json!(2)).into_value(), json!([1, 2]));
        assert_eq!(Delta::deleted(json!("x")).into_value(), json!(["x", 0, 0]));
        assert_eq!(Delta::array_move(4, None).into_value(), json!(["", 4, 3]));
        assert_eq!(
            Delta::array_move(4, Some(json!({"a": 1}))).into_value(),
            json!([{"a": 1}, 4, 3])
        );
        assert_eq!(Delta::text("@@".into()).into_value(), json!(["@@", 0, 2]));
        assert_eq!(Delta::array().into_value(), json!({"_t": "a"}));
    }

    #[test]
    fn kind_is_derived_from_shape() {
        let cases = [
            (json!([1]), DeltaKind::Added),
            (json!([1, 2]), DeltaKind::Modified),
            (json!([1, 0, 0]), DeltaKind::Deleted),
            (json!(["", 1, 3]), DeltaKind::ArrayMove),
            (json!(["@@ -1 +1 @@", 0, 2]), DeltaKind::Text),
            (json!({"a": [1]}), DeltaKind::Object),
            (json!({"_t": "a", "0": [1]}), DeltaKind::Array),
        ];
        for (value, kind) in cases {
            assert_eq!(Delta::from_value(value).unwrap().kind(), kind);
        }
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        for value in [
            json!(1),
            json!("text"),
            json!(null),
            json!([]),
            json!([1, 2, 3, 4]),
            json!([1, 0, 9]),
            json!([1, 1, 0]),
            json!([5, 0, 2]),
            json!(["", -1, 3]),
        ] {
            assert!(Delta::from_value(value.clone()).is_err(), "{value}");
        }
    }

    #[test]
    fn marker_must_be_exact() {
        let d = Delta::from_value(json!({"_t": "b", "0": [1]})).unwrap();
        assert_eq!(d.kind(), DeltaKind::Object);
    }

    #[test]
    fn array_keys() {
        assert_eq!(ArrayIndex::parse("12"), Some(ArrayIndex::Right(12)));
        assert_eq!(ArrayIndex::parse("_3"), Some(ArrayIndex::Left(3)));
        assert_eq!(ArrayIndex::parse("_0"), Some(ArrayIndex::Left(0)));
        assert_eq!(ArrayIndex::parse("007"), None);
        assert_eq!(ArrayIndex::parse("_"), None);
        assert_eq!(ArrayIndex::parse("x"), None);
        assert_eq!(ArrayIndex::Left(5).to_key(), "_5");
    }

    #[test]
    fn array_entries_skip_marker() {
        let d = Delta::from_value(json!({"_t": "a", "_1": [2, 0, 0], "0": [6]})).unwrap();
        let DeltaView::Array(array) = d.view() else {
            panic!("expected array delta");
        };
        assert_eq!(array.len(), 2);
        let keys: Vec<_> = array.entries().map(|(_, index, _)| index.unwrap()).collect();
        assert!(keys.contains(&ArrayIndex::Left(1)));
        assert!(keys.contains(&ArrayIndex::Right(0)));
    }

    #[test]
    fn mutators_respect_kind() {
        let mut obj = Delta::object();
        assert!(obj.is_empty());
        obj.set_property("a", Delta::added(json!(1)));
        assert_eq!(obj.property("a"), Some(&json!([1])));
        assert!(!obj.is_empty());

        let mut arr = Delta::array();
        arr.set_left_item(0, Delta::deleted(json!(1)));
        arr.set_right_item(2, Delta::added(json!(3)));
        assert_eq!(
            arr.as_value(),
            &json!({"_t": "a", "_0": [1, 0, 0], "2": [3]})
        );
        assert_eq!(arr.array_entry(ArrayIndex::Right(2)), Some(&json!([3])));

        let mut leaf = Delta::added(json!(1));
        leaf.set_property("a", Delta::added(json!(2)));
        assert_eq!(leaf.into_value(), json!([1]));
    }

    #[test]
    fn non_empty_drops_empty_containers() {
        assert!(Delta::array().non_empty().is_none());
        assert!(Delta::object().non_empty().is_none());
        assert!(Delta::added(json!(null)).non_empty().is_some());
    }

    #[test]
    fn serde_uses_wire_encoding() {
        let d: Delta = serde_json::from_str(r#"{"a":[1,0,0]}"#).unwrap();
        assert_eq!(d.kind(), DeltaKind::Object);
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"a":[1,0,0]}"#);
        assert!(serde_json::from_str::<Delta>("42").is_err());
    }
}
