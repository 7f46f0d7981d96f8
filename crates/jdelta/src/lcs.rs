//! Longest common subsequence with a pluggable match predicate.
//!
//! [`Lcs::compute`] runs the classic dynamic program over an
//! `(m + 1) x (n + 1)` length table. The predicate result for every pair is
//! kept in a parallel match-kind table, so backtracking and the move probe
//! ([`Lcs::are_equal`]) never call the predicate again.
//!
//! Both tables are owned by the returned [`Lcs`]; they are released when it
//! goes out of scope at the end of one array reconciliation.
//!
//! # Tie-breaking
//!
//! Backtracking starts at `(m, n)`. A matched cell is emitted as an aligned
//! pair and the walk moves diagonally. Otherwise it moves toward the strictly
//! longer neighbour, and on a tie steps back along the right sequence. For
//! `[1, 2]` vs `[2, 1]` this aligns the `2`s, so the `1` is the element
//! reported as moved.
//!
//! Cost is O(m * n) time and memory per call.

use tracing::trace;

/// Result of matching one left item against one right item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchKind {
    #[default]
    NoMatch,
    /// Same logical item; contents may still differ and need a nested diff.
    Matched,
    /// Same item and fully equal.
    DeepEqual,
}

impl MatchKind {
    pub fn is_match(self) -> bool {
        self != MatchKind::NoMatch
    }

    pub fn is_deep_equal(self) -> bool {
        self == MatchKind::DeepEqual
    }
}

/// An alignment of two sequences.
#[derive(Clone, Debug)]
pub struct Lcs {
    rows: usize,
    cols: usize,
    kinds: Vec<MatchKind>,
    left_to_right: Vec<Option<usize>>,
    right_to_left: Vec<Option<usize>>,
    pairs: Vec<(usize, usize)>,
}

impl Lcs {
    /// Align `left` and `right` using `matcher(left_item, i, right_item, j)`.
    ///
    /// Indices passed to the matcher and returned by every query are local
    /// to the given slices.
    pub fn compute<T, F>(left: &[T], right: &[T], mut matcher: F) -> Self
    where
        F: FnMut(&T, usize, &T, usize) -> MatchKind,
    {
        let (rows, cols) = (left.len(), right.len());
        let width = cols + 1;
        let mut lengths = vec![0usize; (rows + 1) * width];
        let mut kinds = vec![MatchKind::NoMatch; rows * cols];

        for i in 1..=rows {
            for j in 1..=cols {
                let kind = matcher(&left[i - 1], i - 1, &right[j - 1], j - 1);
                kinds[(i - 1) * cols + (j - 1)] = kind;
                lengths[i * width + j] = if kind.is_match() {
                    lengths[(i - 1) * width + (j - 1)] + 1
                } else {
                    lengths[(i - 1) * width + j].max(lengths[i * width + (j - 1)])
                };
            }
        }

        let mut pairs = Vec::with_capacity(lengths[rows * width + cols]);
        let (mut i, mut j) = (rows, cols);
        while i > 0 && j > 0 {
            if kinds[(i - 1) * cols + (j - 1)].is_match() {
                pairs.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
            } else if lengths[(i - 1) * width + j] > lengths[i * width + (j - 1)] {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        pairs.reverse();

        let mut left_to_right = vec![None; rows];
        let mut right_to_left = vec![None; cols];
        for &(l, r) in &pairs {
            left_to_right[l] = Some(r);
            right_to_left[r] = Some(l);
        }

        trace!(rows, cols, aligned = pairs.len(), "lcs computed");
        Self {
            rows,
            cols,
            kinds,
            left_to_right,
            right_to_left,
            pairs,
        }
    }

    /// Number of aligned pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Aligned `(left, right)` pairs in increasing order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// The left index aligned with right index `j`.
    pub fn find_left_index(&self, j: usize) -> Option<usize> {
        self.right_to_left.get(j).copied().flatten()
    }

    /// The right index aligned with left index `i`.
    pub fn find_right_index(&self, i: usize) -> Option<usize> {
        self.left_to_right.get(i).copied().flatten()
    }

    /// The recorded match result for any pair, aligned or not.
    pub fn match_kind(&self, i: usize, j: usize) -> MatchKind {
        if i < self.rows && j < self.cols {
            self.kinds[i * self.cols + j]
        } else {
            MatchKind::NoMatch
        }
    }

    /// Whether `left[i]` and `right[j]` matched, aligned or not.
    pub fn are_equal(&self, i: usize, j: usize) -> bool {
        self.match_kind(i, j).is_match()
    }

    pub fn is_deep_equal(&self, i: usize, j: usize) -> bool {
        self.match_kind(i, j).is_deep_equal()
    }
}
