//! Applying deltas forward ([`patch`]) and backward ([`reverse_patch`]).
//!
//! # Array ordering
//!
//! Array delta keys mix two index spaces: `_N` keys address the left array,
//! `N` keys the right one. Forward application therefore runs in three
//! passes, each over a single index space:
//!
//! 1. remove deletions and move sources, highest left index first;
//! 2. insert moved items and additions, lowest right index first (a moved
//!    item goes before an addition at the same index);
//! 3. apply nested deltas at their right indices.
//!
//! Reverse application mirrors this: undo nested deltas at right indices,
//! remove additions and move targets highest right index first, then put
//! deletions and moved items back lowest left index first.
//!
//! Any index outside the array at the moment it is used is a
//! [`PatchError::Malformed`]. Mutation is not rolled back on error.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::delta::{classify, ArrayDeltaRef, ArrayIndex, Delta, DeltaView};
use crate::error::{display_path, PatchError, PatchResult};
use crate::options::DiffOptions;
use crate::pointer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Apply `delta` to `target` in place.
pub fn patch(target: &mut Value, delta: &Delta, options: &DiffOptions) -> PatchResult<()> {
    run(target, delta, Direction::Forward, options)
}

/// Undo `delta` on `target` in place.
pub fn reverse_patch(target: &mut Value, delta: &Delta, options: &DiffOptions) -> PatchResult<()> {
    run(target, delta, Direction::Reverse, options)
}

/// Apply `delta` to a copy of `left`.
pub fn patched(left: &Value, delta: &Delta, options: &DiffOptions) -> PatchResult<Value> {
    let mut value = left.clone();
    patch(&mut value, delta, options)?;
    Ok(value)
}

/// Undo `delta` on a copy of `right`.
pub fn reverse_patched(right: &Value, delta: &Delta, options: &DiffOptions) -> PatchResult<Value> {
    let mut value = right.clone();
    reverse_patch(&mut value, delta, options)?;
    Ok(value)
}

fn run(target: &mut Value, delta: &Delta, direction: Direction, options: &DiffOptions) -> PatchResult<()> {
    let result = Patcher { direction, options }.apply(target, delta.as_value(), "");
    if let Err(e) = &result {
        debug!(?direction, error = %e, "patch failed");
    }
    result
}

struct Patcher<'a> {
    direction: Direction,
    options: &'a DiffOptions,
}

impl Patcher<'_> {
    fn forward(&self) -> bool {
        self.direction == Direction::Forward
    }

    /// Apply one delta node to the value it describes.
    fn apply(&self, target: &mut Value, node: &Value, path: &str) -> PatchResult<()> {
        let view = classify(node).ok_or_else(|| PatchError::malformed(path, "not a delta"))?;
        match view {
            DeltaView::Added(value) => {
                *target = if self.forward() { value.clone() } else { Value::Null };
            }
            DeltaView::Deleted(old) => {
                *target = if self.forward() { Value::Null } else { old.clone() };
            }
            DeltaView::Modified { old, new } => {
                *target = if self.forward() { new.clone() } else { old.clone() };
            }
            DeltaView::Text(text_patch) => self.apply_text(target, text_patch, path)?,
            DeltaView::Object(map) => match target {
                Value::Object(object) => self.apply_object(object, map, path)?,
                _ => return Err(PatchError::malformed(path, "object delta on a non-object")),
            },
            DeltaView::Array(array) => match target {
                Value::Array(items) => self.apply_array(items, array, path)?,
                _ => return Err(PatchError::malformed(path, "array delta on a non-array")),
            },
            DeltaView::ArrayMove { .. } => {
                return Err(PatchError::malformed(path, "move outside an array delta"));
            }
        }
        Ok(())
    }

    fn apply_text(&self, target: &mut Value, text_patch: &str, path: &str) -> PatchResult<()> {
        let Value::String(text) = target else {
            return Err(PatchError::malformed(path, "text diff on a non-string"));
        };
        let differ = &self.options.text_differ;
        let result = if self.forward() {
            differ.patch(text, text_patch)
        } else {
            differ.unpatch(text, text_patch)
        };
        *text = result.map_err(|source| PatchError::Text {
            path: display_path(path),
            source,
        })?;
        Ok(())
    }

    fn apply_object(
        &self,
        object: &mut Map<String, Value>,
        delta: &Map<String, Value>,
        path: &str,
    ) -> PatchResult<()> {
        for (key, node) in delta {
            let child_path = pointer::child(path, key);
            let view = classify(node).ok_or_else(|| PatchError::malformed(&child_path, "not a delta"))?;
            match (view, self.direction) {
                (DeltaView::Added(value), Direction::Forward)
                | (DeltaView::Deleted(value), Direction::Reverse) => {
                    object.insert(key.clone(), value.clone());
                }
                (DeltaView::Added(_), Direction::Reverse)
                | (DeltaView::Deleted(_), Direction::Forward) => {
                    if object.shift_remove(key).is_none() {
                        return Err(PatchError::malformed(&child_path, "property to remove is missing"));
                    }
                }
                (DeltaView::ArrayMove { .. }, _) => {
                    return Err(PatchError::malformed(&child_path, "move inside an object delta"));
                }
                _ => {
                    let child = object
                        .get_mut(key)
                        .ok_or_else(|| PatchError::malformed(&child_path, "property is missing"))?;
                    self.apply(child, node, &child_path)?;
                }
            }
        }
        Ok(())
    }

    fn apply_array(&self, items: &mut Vec<Value>, delta: ArrayDeltaRef<'_>, path: &str) -> PatchResult<()> {
        let ops = ArrayOps::collect(delta, path)?;
        trace!(
            path = %display_path(path),
            removed = ops.removed.len(),
            added = ops.added.len(),
            nested = ops.nested.len(),
            "patching array"
        );
        match self.direction {
            Direction::Forward => self.forward_array(items, ops, path),
            Direction::Reverse => self.reverse_array(items, ops, path),
        }
    }

    fn forward_array(&self, items: &mut Vec<Value>, mut ops: ArrayOps<'_>, path: &str) -> PatchResult<()> {
        ops.removed.sort_by(|a, b| b.index.cmp(&a.index));
        let mut inserts: Vec<(usize, Value)> = Vec::new();
        let mut moved_in = Vec::new();
        for removal in &ops.removed {
            let value = remove_at(items, removal.index, path)?;
            if let Some(to) = removal.moved_to {
                moved_in.push((to, value));
            }
        }
        inserts.extend(moved_in);
        inserts.extend(ops.added.iter().map(|(j, value)| (*j, (*value).clone())));
        inserts.sort_by_key(|(j, _)| *j);
        for (j, value) in inserts {
            insert_at(items, j, value, path)?;
        }

        for (j, node) in &ops.nested {
            let child_path = pointer::index(path, *j);
            let child = items
                .get_mut(*j)
                .ok_or_else(|| PatchError::malformed(&child_path, "index out of range"))?;
            self.apply(child, node, &child_path)?;
        }
        Ok(())
    }

    fn reverse_array(&self, items: &mut Vec<Value>, ops: ArrayOps<'_>, path: &str) -> PatchResult<()> {
        for (j, node) in &ops.nested {
            let child_path = pointer::index(path, *j);
            let child = items
                .get_mut(*j)
                .ok_or_else(|| PatchError::malformed(&child_path, "index out of range"))?;
            self.apply(child, node, &child_path)?;
        }

        // Right-side positions to vacate, with the left index a moved item returns to.
        let mut vacate: Vec<(usize, Option<usize>)> = ops.added.iter().map(|(j, _)| (*j, None)).collect();
        let mut restore: Vec<(usize, Value)> = Vec::new();
        for removal in &ops.removed {
            match (removal.moved_to, removal.old) {
                (Some(to), _) => vacate.push((to, Some(removal.index))),
                (None, Some(old)) => restore.push((removal.index, old.clone())),
                (None, None) => {}
            }
        }
        vacate.sort_by(|a, b| b.0.cmp(&a.0));
        for (j, back_to) in vacate {
            let value = remove_at(items, j, path)?;
            if let Some(i) = back_to {
                restore.push((i, value));
            }
        }
        restore.sort_by_key(|(i, _)| *i);
        for (i, value) in restore {
            insert_at(items, i, value, path)?;
        }
        Ok(())
    }
}

/// A `_N` entry: a deletion or the source of a move.
struct Removal<'a> {
    index: usize,
    moved_to: Option<usize>,
    old: Option<&'a Value>,
}

/// Array delta entries split by role.
struct ArrayOps<'a> {
    removed: Vec<Removal<'a>>,
    added: Vec<(usize, &'a Value)>,
    nested: Vec<(usize, &'a Value)>,
}

impl<'a> ArrayOps<'a> {
    fn collect(delta: ArrayDeltaRef<'a>, path: &str) -> PatchResult<Self> {
        let mut ops = ArrayOps {
            removed: Vec::new(),
            added: Vec::new(),
            nested: Vec::new(),
        };
        for (key, index, node) in delta.entries() {
            let Some(index) = index else {
                return Err(PatchError::malformed(
                    &pointer::child(path, key),
                    "invalid array delta key",
                ));
            };
            let view = classify(node).ok_or_else(|| {
                PatchError::malformed(&pointer::child(path, key), "not a delta")
            })?;
            match (index, view) {
                (ArrayIndex::Left(i), DeltaView::Deleted(old)) => ops.removed.push(Removal {
                    index: i,
                    moved_to: None,
                    old: Some(old),
                }),
                (ArrayIndex::Left(i), DeltaView::ArrayMove { new_index, .. }) => {
                    ops.removed.push(Removal {
                        index: i,
                        moved_to: Some(new_index),
                        old: None,
                    })
                }
                (ArrayIndex::Left(_), _) => {
                    return Err(PatchError::malformed(
                        &pointer::child(path, key),
                        "left-indexed entry must be a deletion or a move",
                    ));
                }
                (ArrayIndex::Right(_), DeltaView::Deleted(_) | DeltaView::ArrayMove { .. }) => {
                    return Err(PatchError::malformed(
                        &pointer::child(path, key),
                        "deletions and moves must use a left index",
                    ));
                }
                (ArrayIndex::Right(j), DeltaView::Added(value)) => ops.added.push((j, value)),
                (ArrayIndex::Right(j), _) => ops.nested.push((j, node)),
            }
        }
        ops.nested.sort_by_key(|(j, _)| *j);
        Ok(ops)
    }
}

fn remove_at(items: &mut Vec<Value>, index: usize, path: &str) -> PatchResult<Value> {
    if index >= items.len() {
        return Err(PatchError::malformed(
            path,
            format!("cannot remove index {index} from array of length {}", items.len()),
        ));
    }
    Ok(items.remove(index))
}

fn insert_at(items: &mut Vec<Value>, index: usize, value: Value, path: &str) -> PatchResult<()> {
    if index > items.len() {
        return Err(PatchError::malformed(
            path,
            format!("cannot insert at index {index} into array of length {}", items.len()),
        ));
    }
    items.insert(index, value);
    Ok(())
}
