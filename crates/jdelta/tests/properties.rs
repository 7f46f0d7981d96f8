//! Property-based tests for diff and patch.
//!
//! ## Properties Verified
//!
//! - Round trip: `patch(L, diff(L, R)) == R` and `reverse_patch(R, diff(L, R)) == L`
//! - No-op: `diff(L, L)` is absent
//! - `diff(L, R)` is absent exactly when `L` and `R` are equal
//! - LCS alignment is consistent and as long as a brute-force LCS

use jdelta::{
    diff_values, equals, patched, reverse_patched, to_json_patch, ComparisonMode, DiffOptions,
    Lcs, MatchKind, MyersTextDiffer, TextDiffer,
};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        "[a-c]{0,3}".prop_map(Value::String),
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-d]", inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Arrays drawn from a small alphabet, so reorders and repeats are common.
fn arb_small_array() -> impl Strategy<Value = Value> {
    prop::collection::vec(0u8..6, 0..10)
        .prop_map(|items| Value::Array(items.into_iter().map(Value::from).collect()))
}

fn option_sets() -> Vec<(&'static str, DiffOptions)> {
    vec![
        ("default", DiffOptions::default()),
        ("semantic", DiffOptions::semantic()),
        ("no moves", DiffOptions::default().without_move_detection()),
        ("value on move", DiffOptions::default().with_value_on_move()),
        ("match by position", DiffOptions::default().with_match_by_position()),
        ("fuzzy", DiffOptions::default().with_fuzzy_item_match()),
        (
            "keyed",
            DiffOptions::default().with_item_key(|item, _| item.get("a").cloned()),
        ),
        (
            "text diffs",
            DiffOptions::default().with_text_diff_min_length(Some(1)),
        ),
    ]
}

fn check_round_trip(left: &Value, right: &Value) -> Result<(), TestCaseError> {
    for (name, options) in option_sets() {
        let mode = options.mode;
        match diff_values(left, right, &options) {
            None => prop_assert!(equals(left, right, mode), "[{}] no delta for unequal values", name),
            Some(delta) => {
                let forward = patched(left, &delta, &options)
                    .map_err(|e| TestCaseError::fail(format!("[{name}] patch failed: {e}; delta {delta}")))?;
                prop_assert!(
                    equals(&forward, right, mode),
                    "[{}] patch gave {} expected {} via {}",
                    name,
                    forward,
                    right,
                    delta
                );
                let backward = reverse_patched(right, &delta, &options)
                    .map_err(|e| TestCaseError::fail(format!("[{name}] reverse failed: {e}; delta {delta}")))?;
                prop_assert!(
                    equals(&backward, left, mode),
                    "[{}] reverse gave {} expected {} via {}",
                    name,
                    backward,
                    left,
                    delta
                );
            }
        }
    }
    Ok(())
}

// ============================================================================
// Diff / patch properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_round_trip(left in arb_json(), right in arb_json()) {
        check_round_trip(&left, &right)?;
    }

    #[test]
    fn prop_array_round_trip(left in arb_small_array(), right in arb_small_array()) {
        check_round_trip(&left, &right)?;
    }

    #[test]
    fn prop_nested_array_round_trip(
        outer in prop::collection::vec(arb_small_array(), 0..4),
        shuffled in prop::collection::vec(arb_small_array(), 0..4)
    ) {
        check_round_trip(&Value::Array(outer), &Value::Array(shuffled))?;
    }

    #[test]
    fn prop_self_diff_is_absent(value in arb_json()) {
        for (name, options) in option_sets() {
            let copy = value.clone();
            prop_assert!(diff_values(&value, &copy, &options).is_none(), "[{}] {}", name, value);
        }
    }

    #[test]
    fn prop_absent_delta_iff_equal(left in arb_json(), right in arb_json()) {
        for mode in [ComparisonMode::Raw, ComparisonMode::Semantic] {
            let options = DiffOptions::default().with_mode(mode);
            prop_assert_eq!(
                diff_values(&left, &right, &options).is_none(),
                equals(&left, &right, mode)
            );
        }
    }

    #[test]
    fn prop_json_patch_reaches_right(left in arb_small_array(), right in arb_small_array()) {
        let options = DiffOptions::default();
        if let Some(delta) = diff_values(&left, &right, &options) {
            let ops = to_json_patch(&left, &delta, &options)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let mut items = left.as_array().cloned().unwrap_or_default();
            for op in ops {
                apply_array_op(&mut items, op);
            }
            prop_assert_eq!(Value::Array(items), right);
        }
    }

    #[test]
    fn prop_text_round_trip(left in "[a-c\n é✓]{0,40}", right in "[a-c\n é✓]{0,40}") {
        let differ = MyersTextDiffer::new();
        match differ.diff(&left, &right) {
            None => prop_assert_eq!(&left, &right),
            Some(patch) => {
                prop_assert_eq!(differ.patch(&left, &patch).unwrap(), right.clone());
                prop_assert_eq!(differ.unpatch(&right, &patch).unwrap(), left);
            }
        }
    }
}

fn apply_array_op(items: &mut Vec<Value>, op: jdelta::JsonPatchOp) {
    let index = |path: &str| -> usize { path.trim_start_matches('/').parse().unwrap() };
    match op {
        jdelta::JsonPatchOp::Add { path, value } => items.insert(index(&path), value),
        jdelta::JsonPatchOp::Remove { path } => {
            items.remove(index(&path));
        }
        jdelta::JsonPatchOp::Replace { path, value } => items[index(&path)] = value,
        jdelta::JsonPatchOp::Move { from, path } => {
            let value = items.remove(index(&from));
            items.insert(index(&path), value);
        }
    }
}

// ============================================================================
// LCS properties
// ============================================================================

fn brute_force_lcs(left: &[u8], right: &[u8]) -> usize {
    let mut best = 0;
    for mask in 0u32..(1 << left.len()) {
        let picked: Vec<u8> = (0..left.len())
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| left[i])
            .collect();
        if picked.len() > best && is_subsequence(&picked, right) {
            best = picked.len();
        }
    }
    best
}

fn is_subsequence(needle: &[u8], haystack: &[u8]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}

proptest! {
    #[test]
    fn prop_lcs_matches_brute_force(
        left in prop::collection::vec(0u8..4, 0..=8),
        right in prop::collection::vec(0u8..4, 0..=8)
    ) {
        let lcs = Lcs::compute(&left, &right, |a, _, b, _| {
            if a == b { MatchKind::DeepEqual } else { MatchKind::NoMatch }
        });
        prop_assert_eq!(lcs.len(), brute_force_lcs(&left, &right));

        let mut previous: Option<(usize, usize)> = None;
        for &(i, j) in lcs.pairs() {
            prop_assert_eq!(left[i], right[j]);
            prop_assert_eq!(lcs.find_right_index(i), Some(j));
            prop_assert_eq!(lcs.find_left_index(j), Some(i));
            if let Some((pi, pj)) = previous {
                prop_assert!(pi < i && pj < j);
            }
            previous = Some((i, j));
        }
        for i in 0..left.len() {
            if let Some(j) = lcs.find_right_index(i) {
                prop_assert_eq!(lcs.find_left_index(j), Some(i));
            }
        }
    }
}
