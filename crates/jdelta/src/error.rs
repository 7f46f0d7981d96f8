//! Error types for the diff crate.

/// Errors raised while applying a text patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextPatchError {
    /// The patch text could not be parsed.
    #[error("malformed text patch at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A hunk's expected source text was not found where the hunk points.
    #[error("text patch hunk {hunk} does not apply at offset {offset}")]
    Mismatch { hunk: usize, offset: usize },
}

/// Convenience alias for text patch results.
pub type TextResult<T> = Result<T, TextPatchError>;

/// Errors that can occur while applying or reversing a delta.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The delta does not fit the tree at `path`: wrong kind for the
    /// position, or an index out of range.
    #[error("malformed delta at {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// The text differ refused to apply a text diff.
    #[error("text diff at {path} failed: {source}")]
    Text {
        path: String,
        #[source]
        source: TextPatchError,
    },
}

impl PatchError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PatchError::Malformed {
            path: display_path(path),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors from decoding a raw value into a [`Delta`](crate::Delta).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    /// The value is not shaped like any delta kind.
    #[error("value is not a delta: {0}")]
    InvalidShape(String),
}

/// Errors from rendering a delta with a formatter.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The delta does not describe the given left document.
    #[error("delta does not fit document at {path}: {reason}")]
    Mismatch { path: String, reason: String },

    /// A text diff inside the delta could not be applied.
    #[error("text diff at {path} failed: {source}")]
    Text {
        path: String,
        #[source]
        source: TextPatchError,
    },
}

/// Convenience alias for formatter results.
pub type FormatResult<T> = Result<T, FormatError>;

pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
