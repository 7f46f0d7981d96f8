use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::equality::ComparisonMode;
use crate::options::DiffOptions;

/// Serializable subset of [`DiffOptions`], suitable for config files.
///
/// Everything that is a closure in `DiffOptions` is reduced to data here:
/// the property filter to a list of ignored names, the item key function to
/// a property name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    pub mode: ComparisonMode,
    /// Report reordered array items as moves.
    pub detect_array_moves: bool,
    pub include_value_on_move: bool,
    pub array_object_item_match_by_position: bool,
    pub prefer_fuzzy_array_item_match: bool,
    /// Minimum string length for text diffs; `0` disables them.
    pub text_diff_min_length: usize,
    /// Object properties excluded from every diff.
    pub ignored_properties: Vec<String>,
    /// Match array items by the value of this property when both have it.
    pub array_item_key_property: Option<String>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Raw,
            detect_array_moves: true,
            include_value_on_move: false,
            array_object_item_match_by_position: false,
            prefer_fuzzy_array_item_match: false,
            text_diff_min_length: DiffOptions::DEFAULT_TEXT_DIFF_MIN_LENGTH,
            ignored_properties: Vec::new(),
            array_item_key_property: None,
        }
    }
}

impl DiffSettings {
    /// Defaults with semantic scalar comparison.
    pub fn semantic() -> Self {
        Self {
            mode: ComparisonMode::Semantic,
            ..Default::default()
        }
    }

    /// Build the runtime options these settings describe.
    pub fn into_options(self) -> DiffOptions {
        let mut options = DiffOptions {
            mode: self.mode,
            suppress_detect_array_move: !self.detect_array_moves,
            include_value_on_move: self.include_value_on_move,
            array_object_item_match_by_position: self.array_object_item_match_by_position,
            prefer_fuzzy_array_item_match: self.prefer_fuzzy_array_item_match,
            text_diff_min_length: (self.text_diff_min_length > 0).then_some(self.text_diff_min_length),
            ..DiffOptions::default()
        };
        if !self.ignored_properties.is_empty() {
            let ignored = self.ignored_properties;
            options = options.with_property_filter(move |name, _| !ignored.iter().any(|i| i == name));
        }
        if let Some(property) = self.array_item_key_property {
            options = options.with_item_key(move |item: &Value, _| item.get(&property).cloned());
        }
        options
    }
}
