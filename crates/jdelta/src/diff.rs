//! Diff entry points: dispatch by value shape and recurse.

use serde_json::Value;
use tracing::{debug, trace};

use crate::array_diff::diff_array;
use crate::delta::Delta;
use crate::object_diff::diff_object;
use crate::options::DiffOptions;
use crate::scalar::is_plain_text;

/// Diff two possibly-absent values.
///
/// An absent side is treated as the empty string, so `diff(None, Some(&v))`
/// reports `["", v]` rather than an addition. Use [`diff_values`] when both
/// values are known to exist.
pub fn diff(left: Option<&Value>, right: Option<&Value>, options: &DiffOptions) -> Option<Delta> {
    let empty = Value::String(String::new());
    diff_values(left.unwrap_or(&empty), right.unwrap_or(&empty), options)
}

/// Diff two values. Returns `None` when they are equal under `options`.
pub fn diff_values(left: &Value, right: &Value, options: &DiffOptions) -> Option<Delta> {
    if std::ptr::eq(left, right) {
        return None;
    }
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => diff_object(l, r, options),
        (Value::Array(l), Value::Array(r)) => diff_array(l, r, options),
        (Value::String(l), Value::String(r)) if is_long_text_pair(l, r, options) => {
            if options.comparer().equals(left, right) {
                None
            } else {
                diff_text(l, r, options)
            }
        }
        _ => {
            if options.comparer().equals(left, right) {
                None
            } else {
                trace!("value modified");
                Some(Delta::modified(left.clone(), right.clone()))
            }
        }
    }
}

fn is_long_text_pair(left: &str, right: &str, options: &DiffOptions) -> bool {
    options.is_long_text(left)
        && options.is_long_text(right)
        && is_plain_text(left)
        && is_plain_text(right)
}

fn diff_text(left: &str, right: &str, options: &DiffOptions) -> Option<Delta> {
    match options.text_differ.diff(left, right) {
        Some(patch) => {
            debug!(
                left_chars = left.chars().count(),
                right_chars = right.chars().count(),
                patch_len = patch.len(),
                "text diff"
            );
            Some(Delta::text(patch))
        }
        None => Some(Delta::modified(
            Value::String(left.to_string()),
            Value::String(right.to_string()),
        )),
    }
}
