//! Long-text diff delegate.
//!
//! Long strings are not stored whole in a delta; instead the diff records a
//! patch text produced by a [`TextDiffer`]. The default differ runs a Myers
//! character diff (via `similar`) and emits patches in the diff-match-patch
//! text format used by other delta consumers:
//!
//! ```text
//! @@ -1,9 +1,9 @@
//!  the
//! -quick
//! +slow
//!  brown
//! ```
//!
//! Each hunk body line starts with ` ` (context), `-` (removed) or `+`
//! (inserted) followed by URI-encoded text. Coordinates are in characters.

use std::fmt::Write as _;

use similar::{Algorithm, ChangeTag};
use tracing::debug;

use crate::error::{TextPatchError, TextResult};

/// Diffs and patches long strings.
///
/// `patch` applies a patch produced by `diff(left, right)` to `left` and must
/// yield `right`; `unpatch` applies it backwards to `right` and must yield
/// `left`. Both fail rather than guess when the text does not match.
pub trait TextDiffer: Send + Sync {
    /// Patch text turning `left` into `right`, or `None` if they are equal.
    fn diff(&self, left: &str, right: &str) -> Option<String>;

    /// Apply `patch` to `text`.
    fn patch(&self, text: &str, patch: &str) -> TextResult<String>;

    /// Apply `patch` backwards to `text`.
    fn unpatch(&self, text: &str, patch: &str) -> TextResult<String>;
}

/// Character-level Myers differ with diff-match-patch style output.
#[derive(Clone, Copy, Debug)]
pub struct MyersTextDiffer {
    context: usize,
}

impl MyersTextDiffer {
    /// Characters of unchanged context kept around each change.
    pub const DEFAULT_CONTEXT: usize = 4;

    pub fn new() -> Self {
        Self {
            context: Self::DEFAULT_CONTEXT,
        }
    }

    pub fn with_context(context: usize) -> Self {
        Self { context }
    }
}

impl Default for MyersTextDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDiffer for MyersTextDiffer {
    fn diff(&self, left: &str, right: &str) -> Option<String> {
        if left == right {
            return None;
        }
        let diff = similar::TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_chars(left, right);

        let mut edits: Vec<(ChangeTag, &str)> = diff
            .iter_all_changes()
            .map(|change| (change.tag(), change.value()))
            .collect();
        if !replays(&edits, left, right) {
            debug!("edit script does not replay, emitting a single replacement hunk");
            edits = vec![(ChangeTag::Delete, left), (ChangeTag::Insert, right)];
            edits.retain(|(_, text)| !text.is_empty());
        }
        Some(render_hunks(&edits, self.context))
    }

    fn patch(&self, text: &str, patch: &str) -> TextResult<String> {
        apply(text, &parse_patch(patch)?, false)
    }

    fn unpatch(&self, text: &str, patch: &str) -> TextResult<String> {
        apply(text, &parse_patch(patch)?, true)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sign {
    Context,
    Delete,
    Insert,
}

#[derive(Debug)]
struct Hunk {
    len1: usize,
    start2: usize,
    len2: usize,
    lines: Vec<(Sign, Vec<char>)>,
}

impl Hunk {
    /// The text this hunk expects, and the text it leaves behind.
    fn sides(&self, reverse: bool) -> (Vec<char>, Vec<char>) {
        let (drop, keep) = if reverse {
            (Sign::Insert, Sign::Delete)
        } else {
            (Sign::Delete, Sign::Insert)
        };
        let mut source = Vec::new();
        let mut target = Vec::new();
        for (sign, chars) in &self.lines {
            if *sign == Sign::Context || *sign == drop {
                source.extend_from_slice(chars);
            }
            if *sign == Sign::Context || *sign == keep {
                target.extend_from_slice(chars);
            }
        }
        (source, target)
    }
}

fn coords(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Whether the edits rebuild `left` from their old side and `right` from
/// their new side.
fn replays(edits: &[(ChangeTag, &str)], left: &str, right: &str) -> bool {
    let side = |skip: ChangeTag| -> String {
        edits
            .iter()
            .filter(|(tag, _)| *tag != skip)
            .map(|(_, text)| *text)
            .collect()
    };
    side(ChangeTag::Insert) == left && side(ChangeTag::Delete) == right
}

/// Group edits into hunks with up to `context` unchanged edits on each side.
/// Coordinates are counted from the edits themselves, so every header agrees
/// with its body.
fn render_hunks(edits: &[(ChangeTag, &str)], context: usize) -> String {
    let mut old_at = Vec::with_capacity(edits.len() + 1);
    let mut new_at = Vec::with_capacity(edits.len() + 1);
    let (mut old_pos, mut new_pos) = (0usize, 0usize);
    for (tag, text) in edits {
        old_at.push(old_pos);
        new_at.push(new_pos);
        let chars = text.chars().count();
        if *tag != ChangeTag::Insert {
            old_pos += chars;
        }
        if *tag != ChangeTag::Delete {
            new_pos += chars;
        }
    }
    old_at.push(old_pos);
    new_at.push(new_pos);

    let changed: Vec<usize> = edits
        .iter()
        .enumerate()
        .filter(|(_, (tag, _))| *tag != ChangeTag::Equal)
        .map(|(index, _)| index)
        .collect();

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &index in &changed {
        match groups.last_mut() {
            Some((_, last)) if index - *last - 1 <= 2 * context => *last = index,
            _ => groups.push((index, index)),
        }
    }

    let mut out = String::new();
    for (first, last) in groups {
        let lo = first.saturating_sub(context);
        let hi = (last + 1 + context).min(edits.len());
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            coords(old_at[lo], old_at[hi] - old_at[lo]),
            coords(new_at[lo], new_at[hi] - new_at[lo])
        );

        let mut run: Option<(ChangeTag, String)> = None;
        for (tag, text) in &edits[lo..hi] {
            match &mut run {
                Some((current, buf)) if *current == *tag => buf.push_str(text),
                _ => {
                    if let Some((current, buf)) = run.take() {
                        push_line(&mut out, current, &buf);
                    }
                    run = Some((*tag, text.to_string()));
                }
            }
        }
        if let Some((tag, buf)) = run {
            push_line(&mut out, tag, &buf);
        }
    }
    out
}

fn push_line(out: &mut String, tag: ChangeTag, text: &str) {
    out.push(match tag {
        ChangeTag::Equal => ' ',
        ChangeTag::Delete => '-',
        ChangeTag::Insert => '+',
    });
    out.push_str(&encode(text));
    out.push('\n');
}

fn apply(text: &str, hunks: &[Hunk], reverse: bool) -> TextResult<String> {
    let mut chars: Vec<char> = text.chars().collect();
    // Hunks address the post-patch text; undoing earlier hunks shifts later ones.
    let mut shift: isize = 0;
    for (index, hunk) in hunks.iter().enumerate() {
        let (source, target) = hunk.sides(reverse);
        let (expected_source, expected_target) = if reverse {
            (hunk.len2, hunk.len1)
        } else {
            (hunk.len1, hunk.len2)
        };
        if source.len() != expected_source || target.len() != expected_target {
            return Err(TextPatchError::Parse {
                line: index + 1,
                reason: "hunk body does not match its header".into(),
            });
        }
        let offset = if reverse {
            hunk.start2 as isize + shift
        } else {
            hunk.start2 as isize
        };
        let mismatch = TextPatchError::Mismatch {
            hunk: index,
            offset: offset.max(0) as usize,
        };
        if offset < 0 {
            return Err(mismatch);
        }
        let offset = offset as usize;
        let end = offset + source.len();
        if end > chars.len() || chars[offset..end] != source[..] {
            return Err(mismatch);
        }
        chars.splice(offset..end, target.iter().copied());
        shift += target.len() as isize - source.len() as isize;
    }
    Ok(chars.into_iter().collect())
}

fn parse_patch(patch: &str) -> TextResult<Vec<Hunk>> {
    let mut hunks: Vec<Hunk> = Vec::new();
    for (number, line) in patch.split('\n').enumerate() {
        let line_no = number + 1;
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("@@ -") {
            hunks.push(parse_header(header, line_no)?);
            continue;
        }
        let Some(hunk) = hunks.last_mut() else {
            return Err(TextPatchError::Parse {
                line: line_no,
                reason: "body line before any hunk header".into(),
            });
        };
        let mut chars = line.chars();
        let sign = match chars.next() {
            Some(' ') => Sign::Context,
            Some('-') => Sign::Delete,
            Some('+') => Sign::Insert,
            _ => {
                return Err(TextPatchError::Parse {
                    line: line_no,
                    reason: format!("invalid line prefix in {line:?}"),
                })
            }
        };
        let text = decode(chars.as_str()).ok_or_else(|| TextPatchError::Parse {
            line: line_no,
            reason: "invalid percent encoding".into(),
        })?;
        hunk.lines.push((sign, text.chars().collect()));
    }
    Ok(hunks)
}

fn parse_header(header: &str, line: usize) -> TextResult<Hunk> {
    let invalid = || TextPatchError::Parse {
        line,
        reason: "invalid hunk header".into(),
    };
    let body = header.strip_suffix(" @@").ok_or_else(invalid)?;
    let (left, right) = body.split_once(" +").ok_or_else(invalid)?;
    let (_, len1) = parse_coords(left).ok_or_else(invalid)?;
    let (start2, len2) = parse_coords(right).ok_or_else(invalid)?;
    Ok(Hunk {
        len1,
        start2,
        len2,
        lines: Vec::new(),
    })
}

fn parse_coords(text: &str) -> Option<(usize, usize)> {
    match text.split_once(',') {
        Some((start, len)) => {
            let start: usize = start.parse().ok()?;
            let len: usize = len.parse().ok()?;
            if len == 0 {
                Some((start, 0))
            } else {
                Some((start.checked_sub(1)?, len))
            }
        }
        None => {
            let start: usize = text.parse().ok()?;
            Some((start.checked_sub(1)?, 1))
        }
    }
}

/// Characters left unescaped, as by `encodeURI` plus a literal space.
fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || " -_.!~*'();/?:@&=+$,#".contains(c)
}

fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if is_unreserved(c) {
            out.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

fn decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
