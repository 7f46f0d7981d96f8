//! Equality assertions that report the delta on failure.

use serde_json::Value;

use crate::delta::Delta;
use crate::diff::diff_values;
use crate::options::DiffOptions;

/// Two documents differ; `delta` turns the expected one into the actual one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("JSON values differ (expected -> actual):\n{}", .delta.to_pretty_string())]
pub struct Mismatch {
    pub delta: Delta,
}

/// `Ok(())` when the two documents are equal under `options`.
pub fn check_equal(expected: &Value, actual: &Value, options: &DiffOptions) -> Result<(), Mismatch> {
    match diff_values(expected, actual, options) {
        None => Ok(()),
        Some(delta) => Err(Mismatch { delta }),
    }
}

/// Assert two JSON documents are equal, printing the delta on failure.
///
/// ```
/// use jdelta::{assert_json_eq, DiffOptions};
/// use serde_json::json;
///
/// assert_json_eq!(json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1}));
/// assert_json_eq!(json!(1), serde_json::from_str("1.0").unwrap(), &DiffOptions::semantic());
/// ```
#[macro_export]
macro_rules! assert_json_eq {
    ($expected:expr, $actual:expr $(,)?) => {
        $crate::assert_json_eq!($expected, $actual, &$crate::DiffOptions::default())
    };
    ($expected:expr, $actual:expr, $options:expr $(,)?) => {
        if let Err(mismatch) = $crate::assert::check_equal(&$expected, &$actual, $options) {
            panic!("{}", mismatch);
        }
    };
}
