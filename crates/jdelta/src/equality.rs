//! Value and tree equality under raw or semantic comparison.
//!
//! Every no-change decision in the diff is made here: the object and array
//! diffs, the default array item matcher, and [`check_equal`] assertions all
//! funnel into [`Comparer::equals`].
//!
//! [`check_equal`]: crate::assert::check_equal

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scalar::{scalars_equal, Scalar};

/// How scalars are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Same JSON kind and identical literal text. `1` and `1.0` differ.
    #[default]
    Raw,
    /// Materialize to the most specific subtype, then compare by value.
    Semantic,
}

/// Custom scalar equality, replacing the mode's scalar rule.
pub type ScalarEq = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// Structural comparer bound to a mode and an optional custom scalar rule.
#[derive(Clone, Copy)]
pub struct Comparer<'a> {
    mode: ComparisonMode,
    scalar: Option<&'a ScalarEq>,
}

impl<'a> Comparer<'a> {
    /// A comparer using only the built-in scalar rule for `mode`.
    pub fn new(mode: ComparisonMode) -> Self {
        Self { mode, scalar: None }
    }

    /// A comparer whose scalar step is delegated to `scalar`.
    pub fn with_scalar(mode: ComparisonMode, scalar: Option<&'a ScalarEq>) -> Self {
        Self { mode, scalar }
    }

    /// The comparison mode.
    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    /// Deep equality. Object key order is ignored, array order is not.
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => self.objects_equal(x, y),
            (Value::Array(x), Value::Array(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(l, r)| self.equals(l, r))
            }
            (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
                false
            }
            _ => self.scalars_equal(a, b),
        }
    }

    /// Scalar equality for two non-container values.
    pub fn scalars_equal(&self, a: &Value, b: &Value) -> bool {
        if let Some(custom) = self.scalar {
            return custom(a, b);
        }
        match self.mode {
            ComparisonMode::Raw => raw_scalars_equal(a, b),
            ComparisonMode::Semantic => semantic_scalars_equal(a, b),
        }
    }

    fn objects_equal(&self, x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
        x.len() == y.len()
            && x
                .iter()
                .all(|(key, lv)| y.get(key).is_some_and(|rv| self.equals(lv, rv)))
    }
}

impl std::fmt::Debug for Comparer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparer")
            .field("mode", &self.mode)
            .field("custom_scalar", &self.scalar.is_some())
            .finish()
    }
}

/// Deep equality of two trees under `mode`.
pub fn equals(a: &Value, b: &Value, mode: ComparisonMode) -> bool {
    Comparer::new(mode).equals(a, b)
}

/// Raw scalar equality: same kind, same literal text.
pub fn raw_scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x.to_string() == y.to_string(),
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

/// Semantic scalar equality via [`Scalar`] materialization.
pub fn semantic_scalars_equal(a: &Value, b: &Value) -> bool {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        if x == y {
            return true;
        }
    }
    match (Scalar::materialize(a), Scalar::materialize(b)) {
        (Some(x), Some(y)) => scalars_equal(&x, &y),
        _ => false,
    }
}
