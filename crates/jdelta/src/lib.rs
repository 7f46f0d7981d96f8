//! Structural diff and patch for JSON documents.
//!
//! Computes compact deltas between two [`serde_json::Value`] trees and
//! applies them forward or backward. Arrays are reconciled with a longest
//! common subsequence pass that detects moved items; long strings are
//! delegated to a pluggable [`TextDiffer`]; scalars compare either by literal
//! text or semantically (`1 == 1.0`, timestamps as instants, GUIDs
//! case-insensitively).
//!
//! # Key Types
//!
//! - [`Delta`] / [`DeltaView`] / [`DeltaKind`] -- Encoded diff and its shape classifier
//! - [`DiffOptions`] / [`DiffSettings`] -- Runtime options and their serializable subset
//! - [`Comparer`] / [`ComparisonMode`] -- Raw or semantic equality
//! - [`Lcs`] / [`MatchKind`] -- Array alignment
//! - [`JsonPatchOp`] -- RFC 6902 rendering of a delta
//!
//! # Example
//!
//! ```
//! use jdelta::{diff_values, patched, reverse_patched, DiffOptions};
//! use serde_json::json;
//!
//! let options = DiffOptions::default();
//! let left = json!({"tags": [1, 2, 3], "name": "a"});
//! let right = json!({"tags": [2, 1, 3], "name": "b"});
//!
//! let delta = diff_values(&left, &right, &options).unwrap();
//! assert_eq!(
//!     delta.as_value(),
//!     &json!({"tags": {"_t": "a", "_0": ["", 1, 3]}, "name": ["a", "b"]})
//! );
//! assert_eq!(patched(&left, &delta, &options).unwrap(), right);
//! assert_eq!(reverse_patched(&right, &delta, &options).unwrap(), left);
//! ```

pub mod array_diff;
pub mod assert;
pub mod delta;
pub mod diff;
pub mod equality;
pub mod error;
pub mod format;
pub mod lcs;
pub mod object_diff;
pub mod options;
pub mod patch;
pub mod pointer;
pub mod scalar;
pub mod settings;
pub mod text;

pub use array_diff::diff_array;
pub use assert::{check_equal, Mismatch};
pub use delta::{ArrayDeltaRef, ArrayIndex, Delta, DeltaKind, DeltaView};
pub use diff::{diff, diff_values};
pub use equality::{equals, Comparer, ComparisonMode};
pub use error::{
    DeltaError, FormatError, FormatResult, PatchError, PatchResult, TextPatchError, TextResult,
};
pub use format::{to_json_patch, JsonPatchOp};
pub use lcs::{Lcs, MatchKind};
pub use object_diff::diff_object;
pub use options::{ArrayItemMatchContext, DiffOptions, PropertyContext};
pub use patch::{patch, patched, reverse_patch, reverse_patched};
pub use scalar::Scalar;
pub use settings::DiffSettings;
pub use text::{MyersTextDiffer, TextDiffer};
