use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::equality::{Comparer, ComparisonMode};
use crate::text::{MyersTextDiffer, TextDiffer};

/// Custom array item matcher. Returns `true` when the two items are the same
/// logical element; may call [`ArrayItemMatchContext::set_deep_equal`] to
/// declare that no nested diff is needed.
pub type ArrayItemMatcher = Arc<dyn Fn(&mut ArrayItemMatchContext<'_>) -> bool + Send + Sync>;

/// Extracts an identity key from an array item (`item`, `index`).
pub type ArrayItemKey = Arc<dyn Fn(&Value, usize) -> Option<Value> + Send + Sync>;

/// Custom scalar equality.
pub type ValueComparer = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Returns `false` to exclude a property from the object diff.
pub type PropertyFilter = Arc<dyn Fn(&str, &PropertyContext<'_>) -> bool + Send + Sync>;

/// One candidate pairing handed to an [`ArrayItemMatcher`].
///
/// The deep-equal flag is scratch state for the current pairing only.
#[derive(Debug)]
pub struct ArrayItemMatchContext<'a> {
    left: &'a Value,
    left_index: usize,
    right: &'a Value,
    right_index: usize,
    deep_equal: bool,
}

impl<'a> ArrayItemMatchContext<'a> {
    pub fn new(left: &'a Value, left_index: usize, right: &'a Value, right_index: usize) -> Self {
        Self {
            left,
            left_index,
            right,
            right_index,
            deep_equal: false,
        }
    }

    pub fn left(&self) -> &'a Value {
        self.left
    }

    pub fn left_index(&self) -> usize {
        self.left_index
    }

    pub fn right(&self) -> &'a Value {
        self.right
    }

    pub fn right_index(&self) -> usize {
        self.right_index
    }

    /// Mark the pair as fully equal; the diff will not descend into it.
    pub fn set_deep_equal(&mut self) {
        self.deep_equal = true;
    }

    pub fn is_deep_equal(&self) -> bool {
        self.deep_equal
    }
}

/// The two objects whose properties are being filtered.
#[derive(Clone, Copy, Debug)]
pub struct PropertyContext<'a> {
    pub left: &'a Map<String, Value>,
    pub right: &'a Map<String, Value>,
}

/// Configuration for a diff, patch or equality call.
///
/// Built once by the caller and passed by reference through every call;
/// nothing is read from process-wide state.
#[derive(Clone)]
pub struct DiffOptions {
    /// Scalar comparison mode.
    pub mode: ComparisonMode,
    /// Report moved array items as a delete plus an add.
    pub suppress_detect_array_move: bool,
    /// Store the moved value in `ArrayMoved` deltas instead of `""`.
    pub include_value_on_move: bool,
    /// Pair object/array items purely by index: same-index containers always
    /// match and are never tested for deep equality, other pairs never match.
    pub array_object_item_match_by_position: bool,
    /// Accept a same-position object/array match without first testing deep
    /// equality.
    pub prefer_fuzzy_array_item_match: bool,
    /// Minimum length (in characters) of both strings before the text differ
    /// is used. `None` disables text diffs.
    pub text_diff_min_length: Option<usize>,
    pub array_item_matcher: Option<ArrayItemMatcher>,
    pub array_item_key: Option<ArrayItemKey>,
    pub value_comparer: Option<ValueComparer>,
    pub property_filter: Option<PropertyFilter>,
    pub text_differ: Arc<dyn TextDiffer>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Raw,
            suppress_detect_array_move: false,
            include_value_on_move: false,
            array_object_item_match_by_position: false,
            prefer_fuzzy_array_item_match: false,
            text_diff_min_length: Some(Self::DEFAULT_TEXT_DIFF_MIN_LENGTH),
            array_item_matcher: None,
            array_item_key: None,
            value_comparer: None,
            property_filter: None,
            text_differ: Arc::new(MyersTextDiffer::new()),
        }
    }
}

impl DiffOptions {
    pub const DEFAULT_TEXT_DIFF_MIN_LENGTH: usize = 60;

    pub fn new() -> Self {
        Self::default()
    }

    /// Default options with semantic scalar comparison.
    pub fn semantic() -> Self {
        Self::default().with_mode(ComparisonMode::Semantic)
    }

    pub fn with_mode(mut self, mode: ComparisonMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn without_move_detection(mut self) -> Self {
        self.suppress_detect_array_move = true;
        self
    }

    pub fn with_value_on_move(mut self) -> Self {
        self.include_value_on_move = true;
        self
    }

    pub fn with_match_by_position(mut self) -> Self {
        self.array_object_item_match_by_position = true;
        self
    }

    pub fn with_fuzzy_item_match(mut self) -> Self {
        self.prefer_fuzzy_array_item_match = true;
        self
    }

    pub fn with_text_diff_min_length(mut self, min: Option<usize>) -> Self {
        self.text_diff_min_length = min;
        self
    }

    pub fn with_item_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&mut ArrayItemMatchContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.array_item_matcher = Some(Arc::new(matcher));
        self
    }

    pub fn with_item_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Value, usize) -> Option<Value> + Send + Sync + 'static,
    {
        self.array_item_key = Some(Arc::new(key));
        self
    }

    pub fn with_value_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.value_comparer = Some(Arc::new(comparer));
        self
    }

    pub fn with_property_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &PropertyContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.property_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_text_differ(mut self, differ: impl TextDiffer + 'static) -> Self {
        self.text_differ = Arc::new(differ);
        self
    }

    /// The structural comparer these options describe.
    pub fn comparer(&self) -> Comparer<'_> {
        Comparer::with_scalar(self.mode, self.value_comparer.as_deref())
    }

    pub(crate) fn keeps_property(&self, name: &str, context: &PropertyContext<'_>) -> bool {
        self.property_filter
            .as_ref()
            .map_or(true, |filter| filter(name, context))
    }

    pub(crate) fn is_long_text(&self, text: &str) -> bool {
        self.text_diff_min_length
            .is_some_and(|min| text.chars().nth(min.saturating_sub(1)).is_some())
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("mode", &self.mode)
            .field("suppress_detect_array_move", &self.suppress_detect_array_move)
            .field("include_value_on_move", &self.include_value_on_move)
            .field(
                "array_object_item_match_by_position",
                &self.array_object_item_match_by_position,
            )
            .field(
                "prefer_fuzzy_array_item_match",
                &self.prefer_fuzzy_array_item_match,
            )
            .field("text_diff_min_length", &self.text_diff_min_length)
            .field("array_item_matcher", &self.array_item_matcher.is_some())
            .field("array_item_key", &self.array_item_key.is_some())
            .field("value_comparer", &self.value_comparer.is_some())
            .field("property_filter", &self.property_filter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let o = DiffOptions::default();
        assert_eq!(o.mode, ComparisonMode::Raw);
        assert!(!o.suppress_detect_array_move);
        assert!(!o.include_value_on_move);
        assert_eq!(o.text_diff_min_length, Some(60));
        assert!(o.array_item_key.is_none());
    }

    #[test]
    fn long_text_threshold_counts_characters() {
        let o = DiffOptions::default().with_text_diff_min_length(Some(3));
        assert!(o.is_long_text("abc"));
        assert!(o.is_long_text("äöü"));
        assert!(!o.is_long_text("ab"));
        let off = DiffOptions::default().with_text_diff_min_length(None);
        assert!(!off.is_long_text(&"x".repeat(1000)));
    }

    #[test]
    fn comparer_uses_custom_scalar_rule() {
        let o = DiffOptions::default().with_value_comparer(|_, _| true);
        assert!(o.comparer().equals(&json!(1), &json!("one")));
        assert!(!o.comparer().equals(&json!([1]), &json!([1, 2])));
    }

    #[test]
    fn property_filter_defaults_to_keep() {
        let left = Map::new();
        let right = Map::new();
        let ctx = PropertyContext {
            left: &left,
            right: &right,
        };
        assert!(DiffOptions::default().keeps_property("x", &ctx));
        let o = DiffOptions::default().with_property_filter(|name, _| !name.starts_with('$'));
        assert!(!o.keeps_property("$meta", &ctx));
        assert!(o.keeps_property("meta", &ctx));
    }

    #[test]
    fn match_context_scratch_flag() {
        let (a, b) = (json!(1), json!(1));
        let mut ctx = ArrayItemMatchContext::new(&a, 0, &b, 2);
        assert!(!ctx.is_deep_equal());
        ctx.set_deep_equal();
        assert!(ctx.is_deep_equal());
        assert_eq!(ctx.right_index(), 2);
    }
}
