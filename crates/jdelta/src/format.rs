//! Rendering a delta as an RFC 6902 JSON Patch.
//!
//! The delta format addresses array items by pre- and post-change index at
//! once, which JSON Patch cannot express. [`to_json_patch`] therefore needs
//! the left document: it replays the array delta against the left items to
//! work out the final layout, then emits removes, then one `add` or `move`
//! per final position, then nested operations at their final indices.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::delta::{classify, ArrayDeltaRef, ArrayIndex, Delta, DeltaView};
use crate::error::{display_path, FormatError, FormatResult};
use crate::options::DiffOptions;
use crate::pointer;

/// One JSON Patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum JsonPatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
}

/// Render `delta`, computed against `left`, as JSON Patch operations.
pub fn to_json_patch(left: &Value, delta: &Delta, options: &DiffOptions) -> FormatResult<Vec<JsonPatchOp>> {
    let mut formatter = Formatter {
        options,
        ops: Vec::new(),
    };
    formatter.value(left, delta.as_value(), "")?;
    trace!(ops = formatter.ops.len(), "json patch formatted");
    Ok(formatter.ops)
}

fn mismatch(path: &str, reason: impl Into<String>) -> FormatError {
    FormatError::Mismatch {
        path: display_path(path),
        reason: reason.into(),
    }
}

/// Identity of an item in the final array layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot<'a> {
    Left(usize),
    New(&'a Value),
}

struct Formatter<'a> {
    options: &'a DiffOptions,
    ops: Vec<JsonPatchOp>,
}

impl Formatter<'_> {
    fn value(&mut self, left: &Value, node: &Value, path: &str) -> FormatResult<()> {
        let view = classify(node).ok_or_else(|| mismatch(path, "not a delta"))?;
        match view {
            DeltaView::Added(value) | DeltaView::Modified { new: value, .. } => {
                self.ops.push(JsonPatchOp::Replace {
                    path: path.to_string(),
                    value: value.clone(),
                });
            }
            DeltaView::Deleted(_) => self.ops.push(JsonPatchOp::Remove {
                path: path.to_string(),
            }),
            DeltaView::Text(text_patch) => {
                let text = left
                    .as_str()
                    .ok_or_else(|| mismatch(path, "text diff on a non-string"))?;
                let value = self
                    .options
                    .text_differ
                    .patch(text, text_patch)
                    .map_err(|source| FormatError::Text {
                        path: display_path(path),
                        source,
                    })?;
                self.ops.push(JsonPatchOp::Replace {
                    path: path.to_string(),
                    value: Value::String(value),
                });
            }
            DeltaView::Object(map) => {
                let object = left
                    .as_object()
                    .ok_or_else(|| mismatch(path, "object delta on a non-object"))?;
                self.object(object, map, path)?;
            }
            DeltaView::Array(array) => {
                let items = left
                    .as_array()
                    .ok_or_else(|| mismatch(path, "array delta on a non-array"))?;
                self.array(items, array, path)?;
            }
            DeltaView::ArrayMove { .. } => return Err(mismatch(path, "move outside an array delta")),
        }
        Ok(())
    }

    fn object(&mut self, left: &Map<String, Value>, delta: &Map<String, Value>, path: &str) -> FormatResult<()> {
        for (key, node) in delta {
            let child = pointer::child(path, key);
            match classify(node) {
                Some(DeltaView::Added(value)) => self.ops.push(JsonPatchOp::Add {
                    path: child,
                    value: value.clone(),
                }),
                Some(DeltaView::Deleted(_)) => self.ops.push(JsonPatchOp::Remove { path: child }),
                _ => {
                    let value = left
                        .get(key)
                        .ok_or_else(|| mismatch(&child, "property is missing"))?;
                    self.value(value, node, &child)?;
                }
            }
        }
        Ok(())
    }

    fn array(&mut self, items: &[Value], delta: ArrayDeltaRef<'_>, path: &str) -> FormatResult<()> {
        let mut deleted = Vec::new();
        let mut moved_away = Vec::new();
        let mut inserts: Vec<(usize, Slot<'_>)> = Vec::new();
        let mut added = Vec::new();
        let mut nested = Vec::new();
        for (key, index, node) in delta.entries() {
            let view = classify(node).ok_or_else(|| mismatch(&pointer::child(path, key), "not a delta"))?;
            match (index, view) {
                (Some(ArrayIndex::Left(i)), DeltaView::Deleted(_)) => deleted.push(i),
                (Some(ArrayIndex::Left(i)), DeltaView::ArrayMove { new_index, .. }) => {
                    moved_away.push(i);
                    inserts.push((new_index, Slot::Left(i)));
                }
                (Some(ArrayIndex::Right(j)), DeltaView::Added(value)) => added.push((j, Slot::New(value))),
                (Some(ArrayIndex::Right(j)), DeltaView::Modified { .. })
                | (Some(ArrayIndex::Right(j)), DeltaView::Text(_))
                | (Some(ArrayIndex::Right(j)), DeltaView::Object(_))
                | (Some(ArrayIndex::Right(j)), DeltaView::Array(_)) => nested.push((j, node)),
                _ => return Err(mismatch(&pointer::child(path, key), "unexpected array delta entry")),
            }
        }
        if let Some(&i) = deleted.iter().chain(&moved_away).find(|&&i| i >= items.len()) {
            return Err(mismatch(&pointer::index(path, i), "index out of range"));
        }

        // Final layout: surviving items in order, then moved and added items
        // inserted by ascending target index, moved first.
        let mut layout: Vec<Slot<'_>> = (0..items.len())
            .filter(|i| !deleted.contains(i) && !moved_away.contains(i))
            .map(Slot::Left)
            .collect();
        inserts.extend(added);
        inserts.sort_by_key(|(j, _)| *j);
        for (j, slot) in inserts {
            if j > layout.len() {
                return Err(mismatch(&pointer::index(path, j), "index out of range"));
            }
            layout.insert(j, slot);
        }

        deleted.sort_unstable_by(|a, b| b.cmp(a));
        for &i in &deleted {
            self.ops.push(JsonPatchOp::Remove {
                path: pointer::index(path, i),
            });
        }

        let mut work: Vec<Option<usize>> = (0..items.len())
            .filter(|i| !deleted.contains(i))
            .map(Some)
            .collect();
        for (k, slot) in layout.iter().enumerate() {
            match slot {
                Slot::New(value) => {
                    self.ops.push(JsonPatchOp::Add {
                        path: pointer::index(path, k),
                        value: (*value).clone(),
                    });
                    work.insert(k, None);
                }
                Slot::Left(i) => {
                    let current = work
                        .iter()
                        .position(|w| *w == Some(*i))
                        .ok_or_else(|| mismatch(&pointer::index(path, *i), "item lost while reordering"))?;
                    if current != k {
                        self.ops.push(JsonPatchOp::Move {
                            from: pointer::index(path, current),
                            path: pointer::index(path, k),
                        });
                        let id = work.remove(current);
                        work.insert(k, id);
                    }
                }
            }
        }

        nested.sort_by_key(|(j, _)| *j);
        for (j, node) in nested {
            let child = pointer::index(path, j);
            let before = match layout.get(j) {
                Some(Slot::Left(i)) => &items[*i],
                Some(Slot::New(value)) => *value,
                None => return Err(mismatch(&child, "index out of range")),
            };
            self.value(before, node, &child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_values;
    use serde_json::json;

    fn tokens(path: &str) -> Vec<String> {
        path.split('/')
            .skip(1)
            .map(|t| t.replace("~1", "/").replace("~0", "~"))
            .collect()
    }

    fn parent<'v>(doc: &'v mut Value, path: &str) -> (&'v mut Value, String) {
        let mut tokens = tokens(path);
        let last = tokens.pop().unwrap();
        let mut node = doc;
        for t in tokens {
            node = match node {
                Value::Object(m) => m.get_mut(&t).unwrap(),
                Value::Array(a) => &mut a[t.parse::<usize>().unwrap()],
                _ => panic!("bad path {path}"),
            };
        }
        (node, last)
    }

    fn remove(doc: &mut Value, path: &str) -> Value {
        let (node, last) = parent(doc, path);
        match node {
            Value::Object(m) => m.shift_remove(&last).unwrap(),
            Value::Array(a) => a.remove(last.parse().unwrap()),
            _ => panic!("bad path {path}"),
        }
    }

    fn add(doc: &mut Value, path: &str, value: Value) {
        if path.is_empty() {
            *doc = value;
            return;
        }
        let (node, last) = parent(doc, path);
        match node {
            Value::Object(m) => {
                m.insert(last, value);
            }
            Value::Array(a) => a.insert(last.parse().unwrap(), value),
            _ => panic!("bad path {path}"),
        }
    }

    /// Minimal RFC 6902 applier for checking formatter output.
    fn apply(doc: &Value, ops: &[JsonPatchOp]) -> Value {
        let mut doc = doc.clone();
        for op in ops {
            match op {
                JsonPatchOp::Add { path, value } => add(&mut doc, path, value.clone()),
                JsonPatchOp::Remove { path } => {
                    remove(&mut doc, path);
                }
                JsonPatchOp::Replace { path, value } => {
                    if path.is_empty() {
                        doc = value.clone();
                    } else {
                        remove(&mut doc, path);
                        add(&mut doc, path, value.clone());
                    }
                }
                JsonPatchOp::Move { from, path } => {
                    let value = remove(&mut doc, from);
                    add(&mut doc, path, value);
                }
            }
        }
        doc
    }

    fn check(left: Value, right: Value) -> Vec<JsonPatchOp> {
        let options = DiffOptions::default();
        let delta = diff_values(&left, &right, &options).expect("values differ");
        let ops = to_json_patch(&left, &delta, &options).unwrap();
        assert_eq!(apply(&left, &ops), right, "ops: {ops:?}");
        ops
    }

    #[test]
    fn root_replace() {
        let ops = check(json!(1), json!("two"));
        assert_eq!(
            ops,
            vec![JsonPatchOp::Replace {
                path: String::new(),
                value: json!("two")
            }]
        );
    }

    #[test]
    fn object_operations() {
        let ops = check(
            json!({"keep": 1, "drop": 2, "edit": 3, "a/b": {"c": 1}}),
            json!({"keep": 1, "edit": 4, "new": 5, "a/b": {"c": 2}}),
        );
        assert!(ops.contains(&JsonPatchOp::Remove { path: "/drop".into() }));
        assert!(ops.contains(&JsonPatchOp::Add {
            path: "/new".into(),
            value: json!(5)
        }));
        assert!(ops.contains(&JsonPatchOp::Replace {
            path: "/a~1b/c".into(),
            value: json!(2)
        }));
    }

    #[test]
    fn swap_becomes_a_move() {
        let ops = check(json!([1, 2, 3]), json!([2, 1, 3]));
        assert_eq!(
            ops,
            vec![JsonPatchOp::Move {
                from: "/1".into(),
                path: "/0".into()
            }]
        );
    }

    #[test]
    fn arrays_with_every_kind_of_entry() {
        check(json!([1, 2, 3, 4, 5]), json!([5, 9, 1, 3, 7]));
        check(json!([]), json!([1, 2]));
        check(json!(["a", "b", "c"]), json!([]));
        check(
            json!([{"id": 1, "n": [1, 2]}, {"id": 2}, 3]),
            json!([3, {"id": 1, "n": [2, 1, 0]}, "x"]),
        );
    }

    #[test]
    fn reordered_objects_with_key_function() {
        let options = DiffOptions::default().with_item_key(|item, _| item.get("id").cloned());
        let left = json!([{"id": "a", "v": 1}, {"id": "b", "v": 2}, {"id": "c", "v": 3}]);
        let right = json!([{"id": "c", "v": 3}, {"id": "a", "v": 10}, {"id": "b", "v": 2}]);
        let delta = diff_values(&left, &right, &options).unwrap();
        let ops = to_json_patch(&left, &delta, &options).unwrap();
        assert_eq!(apply(&left, &ops), right, "ops: {ops:?}");
    }

    #[test]
    fn text_diff_becomes_replace() {
        let left = json!({"body": "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod."});
        let right = json!({"body": "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do tempor."});
        let ops = check(left, right.clone());
        assert_eq!(
            ops,
            vec![JsonPatchOp::Replace {
                path: "/body".into(),
                value: right["body"].clone()
            }]
        );
    }

    #[test]
    fn delta_for_other_document_is_rejected() {
        let options = DiffOptions::default();
        let delta = Delta::from_value(json!({"a": {"b": [1, 2]}})).unwrap();
        assert!(matches!(
            to_json_patch(&json!({"x": 1}), &delta, &options),
            Err(FormatError::Mismatch { .. })
        ));
        let delta = Delta::from_value(json!({"_t": "a", "_7": [1, 0, 0]})).unwrap();
        assert!(to_json_patch(&json!([1]), &delta, &options).is_err());
    }

    #[test]
    fn ops_serialize_as_rfc6902() {
        let op = JsonPatchOp::Move {
            from: "/1".into(),
            path: "/0".into(),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "move", "from": "/1", "path": "/0"})
        );
    }
}
