//! Array diff: head/tail trim, then LCS reconciliation with move detection.
//!
//! The common head and tail are matched index by index without building any
//! table. Only the middle left over is handed to the [`Lcs`] matcher. Left
//! items it leaves unaligned become deletions (`_N` keys); right items it
//! leaves unaligned become additions (`N` keys), unless move detection finds
//! a deleted left item matching them, in which case that deletion turns into
//! a move.

use serde_json::Value;
use tracing::{debug, trace};

use crate::delta::Delta;
use crate::diff::diff_values;
use crate::equality::Comparer;
use crate::lcs::{Lcs, MatchKind};
use crate::options::{ArrayItemMatchContext, DiffOptions};

/// Diff two arrays. Returns `None` when they are equal item for item.
pub fn diff_array(left: &[Value], right: &[Value], options: &DiffOptions) -> Option<Delta> {
    let matcher = ItemMatcher::new(options);
    let (len1, len2) = (left.len(), right.len());
    let mut delta = Delta::array();

    let mut head = 0;
    while head < len1 && head < len2 {
        let kind = matcher.matches(&left[head], head, &right[head], head);
        if !kind.is_match() {
            break;
        }
        if !kind.is_deep_equal() {
            nested(&mut delta, &left[head], &right[head], head, options);
        }
        head += 1;
    }

    let mut tail = 0;
    while tail < len1 - head && tail < len2 - head {
        let (li, ri) = (len1 - 1 - tail, len2 - 1 - tail);
        let kind = matcher.matches(&left[li], li, &right[ri], ri);
        if !kind.is_match() {
            break;
        }
        if !kind.is_deep_equal() {
            nested(&mut delta, &left[li], &right[ri], ri, options);
        }
        tail += 1;
    }

    let (end1, end2) = (len1 - tail, len2 - tail);
    if head == end1 {
        for (j, item) in right.iter().enumerate().take(end2).skip(head) {
            delta.set_right_item(j, Delta::added(item.clone()));
        }
        return delta.non_empty();
    }
    if head == end2 {
        for (i, item) in left.iter().enumerate().take(end1).skip(head) {
            delta.set_left_item(i, Delta::deleted(item.clone()));
        }
        return delta.non_empty();
    }

    let lcs = Lcs::compute(&left[head..end1], &right[head..end2], |l, i, r, j| {
        matcher.matches(l, head + i, r, head + j)
    });

    let mut removed: Vec<usize> = (head..end1)
        .filter(|&i| lcs.find_right_index(i - head).is_none())
        .collect();
    for &i in &removed {
        delta.set_left_item(i, Delta::deleted(left[i].clone()));
    }

    let detect_moves = !options.suppress_detect_array_move;
    let mut moves = 0usize;
    for j in head..end2 {
        let local = j - head;
        if let Some(li) = lcs.find_left_index(local) {
            if !lcs.is_deep_equal(li, local) {
                nested(&mut delta, &left[head + li], &right[j], j, options);
            }
            continue;
        }

        let moved_from = if detect_moves {
            removed
                .iter()
                .position(|&i| lcs.are_equal(i - head, local))
                .map(|pos| removed.remove(pos))
        } else {
            None
        };

        match moved_from {
            Some(i) => {
                let value = options.include_value_on_move.then(|| left[i].clone());
                delta.set_left_item(i, Delta::array_move(j, value));
                if !lcs.is_deep_equal(i - head, local) {
                    nested(&mut delta, &left[i], &right[j], j, options);
                }
                moves += 1;
            }
            None => delta.set_right_item(j, Delta::added(right[j].clone())),
        }
    }

    debug!(
        left_len = len1,
        right_len = len2,
        head,
        tail,
        aligned = lcs.len(),
        moves,
        "array reconciled"
    );
    delta.non_empty()
}

fn nested(delta: &mut Delta, left: &Value, right: &Value, index: usize, options: &DiffOptions) {
    if let Some(child) = diff_values(left, right, options) {
        delta.set_right_item(index, child);
    }
}

/// Pairwise item predicate assembled from the options.
///
/// Precedence: custom matcher, then key function, then positional matching
/// of containers, then plain deep equality. With
/// `array_object_item_match_by_position` containers pair only by index and
/// are never compared for deep equality.
struct ItemMatcher<'a> {
    options: &'a DiffOptions,
    comparer: Comparer<'a>,
}

impl<'a> ItemMatcher<'a> {
    fn new(options: &'a DiffOptions) -> Self {
        Self {
            options,
            comparer: options.comparer(),
        }
    }

    fn matches(&self, left: &Value, i: usize, right: &Value, j: usize) -> MatchKind {
        if let Some(custom) = &self.options.array_item_matcher {
            let mut context = ArrayItemMatchContext::new(left, i, right, j);
            return match (custom(&mut context), context.is_deep_equal()) {
                (false, _) => MatchKind::NoMatch,
                (true, true) => MatchKind::DeepEqual,
                (true, false) => MatchKind::Matched,
            };
        }

        if let Some(key) = &self.options.array_item_key {
            let keys = (key(left, i), key(right, j));
            if let (Some(a), Some(b)) = &keys {
                if !a.is_null() && !b.is_null() {
                    trace!(left_index = i, right_index = j, "matching by key");
                    return if self.comparer.equals(a, b) {
                        self.deep_or_matched(left, right)
                    } else {
                        MatchKind::NoMatch
                    };
                }
            }
            return self.deep_or_none(left, right);
        }

        if same_container_kind(left, right) {
            if self.options.array_object_item_match_by_position {
                return if i == j {
                    MatchKind::Matched
                } else {
                    MatchKind::NoMatch
                };
            }
            if i == j {
                if self.options.prefer_fuzzy_array_item_match {
                    return MatchKind::Matched;
                }
                return self.deep_or_matched(left, right);
            }
        }

        self.deep_or_none(left, right)
    }

    fn deep_or_matched(&self, left: &Value, right: &Value) -> MatchKind {
        if self.comparer.equals(left, right) {
            MatchKind::DeepEqual
        } else {
            MatchKind::Matched
        }
    }

    fn deep_or_none(&self, left: &Value, right: &Value) -> MatchKind {
        if self.comparer.equals(left, right) {
            MatchKind::DeepEqual
        } else {
            MatchKind::NoMatch
        }
    }
}

fn same_container_kind(left: &Value, right: &Value) -> bool {
    matches!(
        (left, right),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}
