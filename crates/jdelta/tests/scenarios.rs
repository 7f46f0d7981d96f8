//! Reference scenarios pinning the delta encoding and array attribution.

use jdelta::{
    diff, diff_values, equals, patch, patched, reverse_patch, ComparisonMode, Delta, DeltaKind,
    DiffOptions,
};
use serde_json::{json, Value};

fn delta_of(left: Value, right: Value) -> Option<Value> {
    diff_values(&left, &right, &DiffOptions::default()).map(Delta::into_value)
}

fn number(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn added_property() {
    assert_eq!(delta_of(json!({}), json!({"a": 1})), Some(json!({"a": [1]})));
}

#[test]
fn deleted_property() {
    assert_eq!(delta_of(json!({"a": 1}), json!({})), Some(json!({"a": [1, 0, 0]})));
}

#[test]
fn modified_scalar() {
    assert_eq!(delta_of(json!(1), json!(2)), Some(json!([1, 2])));
}

#[test]
fn swapped_items_move() {
    assert_eq!(
        delta_of(json!([1, 2, 3]), json!([2, 1, 3])),
        Some(json!({"_t": "a", "_0": ["", 1, 3]}))
    );
}

#[test]
fn swap_is_never_add_plus_delete() {
    let delta = diff_values(&json!([1, 2, 3]), &json!([2, 1, 3]), &DiffOptions::default()).unwrap();
    let entries = delta.as_value().as_object().unwrap();
    assert!(entries.keys().all(|k| k == "_t" || k == "_0"));
    let moved = Delta::from_value(entries["_0"].clone()).unwrap();
    assert_eq!(moved.kind(), DeltaKind::ArrayMove);
}

#[test]
fn integer_equals_float_only_semantically() {
    assert!(equals(&json!(1), &number("1.0"), ComparisonMode::Semantic));
    assert!(!equals(&json!(1), &number("1.0"), ComparisonMode::Raw));
}

#[test]
fn mixed_array_patch() {
    let delta = Delta::from_value(json!({
        "_t": "a",
        "_0": ["", 3, 3],
        "_1": [2, 0, 0],
        "0": [6],
        "1": [3, 5],
        "3": [3],
        "4": [2]
    }))
    .unwrap();
    let mut target = json!([1, 2, 3, 4]);
    patch(&mut target, &delta, &DiffOptions::default()).unwrap();
    assert_eq!(target, json!([6, 5, 4, 3, 2, 1]));
}

#[test]
fn in_place_round_trip() {
    let options = DiffOptions::default();
    let left = json!({
        "title": "Release notes",
        "items": [{"id": 1, "done": false}, {"id": 2, "done": false}, {"id": 3, "done": true}],
        "tags": ["a", "b", "c", "d"]
    });
    let right = json!({
        "title": "Release notes v2",
        "items": [{"id": 3, "done": true}, {"id": 1, "done": true}],
        "tags": ["d", "a", "c", "e"],
        "owner": null
    });
    let delta = diff_values(&left, &right, &options).unwrap();

    let mut doc = left.clone();
    patch(&mut doc, &delta, &options).unwrap();
    assert_eq!(doc, right);
    reverse_patch(&mut doc, &delta, &options).unwrap();
    assert_eq!(doc, left);
}

#[test]
fn delta_survives_serialization() {
    let options = DiffOptions::default();
    let left = json!({"a": [1, 2, 3], "b": {"c": "x"}});
    let right = json!({"a": [3, 1], "b": {"c": "y", "d": true}});
    let delta = diff_values(&left, &right, &options).unwrap();

    let text = serde_json::to_string(&delta).unwrap();
    let decoded: Delta = serde_json::from_str(&text).unwrap();
    assert_eq!(decoded, delta);
    assert_eq!(patched(&left, &decoded, &options).unwrap(), right);
}

#[test]
fn absent_values_compare_as_empty_string() {
    let options = DiffOptions::default();
    assert!(diff(None, None, &options).is_none());
    assert_eq!(
        diff(Some(&json!("x")), None, &options).map(Delta::into_value),
        Some(json!(["x", ""]))
    );
}

#[test]
fn semantic_documents() {
    let options = DiffOptions::semantic();
    let left = json!({
        "at": "2024-06-01T12:00:00+02:00",
        "id": "0F8FAD5B-D9CB-469F-A165-70867728950E",
        "amount": 12.5,
        "blob": "aGVsbG8="
    });
    let right: Value = serde_json::from_str(
        r#"{
            "at": "2024-06-01T10:00:00Z",
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "amount": 12.50,
            "blob": "aGVsbG8="
        }"#,
    )
    .unwrap();
    assert!(diff_values(&left, &right, &options).is_none());
    assert!(diff_values(&left, &right, &DiffOptions::default()).is_some());
}
