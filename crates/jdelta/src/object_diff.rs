//! Object diff: per-key add/remove/modify.

use serde_json::{Map, Value};
use tracing::trace;

use crate::delta::Delta;
use crate::diff::diff_values;
use crate::options::{DiffOptions, PropertyContext};

/// Diff two objects key by key.
///
/// Left keys are visited in insertion order first, then keys only present on
/// the right. Keys rejected by the property filter are skipped on both sides.
/// Returns `None` when no key produced an entry.
pub fn diff_object(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    options: &DiffOptions,
) -> Option<Delta> {
    let context = PropertyContext { left, right };
    let mut delta = Delta::object();

    for (key, left_value) in left {
        if !options.keeps_property(key, &context) {
            continue;
        }
        match right.get(key) {
            None => delta.set_property(key, Delta::deleted(left_value.clone())),
            Some(right_value) => {
                if let Some(child) = diff_values(left_value, right_value, options) {
                    delta.set_property(key, child);
                }
            }
        }
    }

    for (key, right_value) in right {
        if left.contains_key(key) || !options.keeps_property(key, &context) {
            continue;
        }
        delta.set_property(key, Delta::added(right_value.clone()));
    }

    let delta = delta.non_empty();
    trace!(
        left_keys = left.len(),
        right_keys = right.len(),
        changed = delta.is_some(),
        "object diffed"
    );
    delta
}
