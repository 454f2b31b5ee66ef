//! Case-insensitive fuzzy scoring and highlighting of basenames.
//!
//! Scores come in tiers: an exact match beats a prefix, a prefix beats a
//! contiguous substring and a substring beats a scattered subsequence. The
//! subsequence tier rewards consecutive runs and is not normalized by label
//! length, so a long query matched in one long run can outscore the fixed
//! tiers.

use crate::types::Segment;

pub const EXACT_MATCH_SCORE: u32 = 1000;
pub const PREFIX_MATCH_SCORE: u32 = 900;
pub const SUBSTRING_MATCH_SCORE: u32 = 800;

/// Base points for every matched character of a subsequence match.
const SUBSEQUENCE_CHAR_SCORE: u32 = 10;
/// Extra points per character of the current consecutive run.
const CONSECUTIVE_RUN_BONUS: u32 = 5;

/// Lowercases a single char, keeping it as is when the lowercase form is not
/// a single char. Comparing folded chars keeps indices aligned with the
/// original label, which is what makes highlighting exact.
#[inline]
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

#[inline]
fn fold(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

#[inline]
fn find_contiguous(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Case-insensitive substring test, used by path sources to prefilter names.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    find_contiguous(&fold(haystack), &fold(needle)).is_some()
}

/// How a query matched a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    /// Contiguous match starting at this char index.
    Substring(usize),
    /// Scattered match with its accumulated run score.
    Subsequence(u32),
}

impl MatchKind {
    pub fn score(self) -> u32 {
        match self {
            MatchKind::Exact => EXACT_MATCH_SCORE,
            MatchKind::Prefix => PREFIX_MATCH_SCORE,
            MatchKind::Substring(_) => SUBSTRING_MATCH_SCORE,
            MatchKind::Subsequence(score) => score,
        }
    }
}

/// A query folded once and matched against many labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatcher {
    query: String,
    folded: Vec<char>,
}

impl FuzzyMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_owned(),
            folded: fold(query),
        }
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Classifies the match of this query against `label`, if any.
    pub fn match_kind(&self, label: &str) -> Option<MatchKind> {
        let label = fold(label);
        let query = self.folded.as_slice();

        if label == query {
            return Some(MatchKind::Exact);
        }
        if label.starts_with(query) {
            return Some(MatchKind::Prefix);
        }
        if let Some(start) = find_contiguous(&label, query) {
            return Some(MatchKind::Substring(start));
        }

        let mut query_pos = 0;
        let mut run = 0;
        let mut score = 0u32;
        for &c in &label {
            if query_pos == query.len() {
                break;
            }

            if c == query[query_pos] {
                query_pos += 1;
                run += 1;
                score = score.saturating_add(SUBSEQUENCE_CHAR_SCORE + run * CONSECUTIVE_RUN_BONUS);
            } else {
                run = 0;
            }
        }

        (query_pos == query.len()).then_some(MatchKind::Subsequence(score))
    }

    /// Relevance of `label` for this query, `None` when it does not match.
    #[inline]
    pub fn score(&self, label: &str) -> Option<u32> {
        self.match_kind(label).map(MatchKind::score)
    }

    /// Splits `label` into highlighted and plain segments, preserving casing.
    ///
    /// A contiguous match produces at most three segments. Otherwise every
    /// maximal run of matched or unmatched chars of the subsequence scan
    /// becomes one segment. Segments are never empty and always concatenate
    /// back to `label`.
    pub fn highlight(&self, label: &str) -> Vec<Segment> {
        let folded = fold(label);
        let query = self.folded.as_slice();
        // byte offset of every char plus the end of the label
        let offsets: Vec<usize> = label
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(label.len()))
            .collect();

        if let Some(start) = find_contiguous(&folded, query) {
            let match_start = offsets[start];
            let match_end = offsets[start + query.len()];

            let mut segments = Vec::with_capacity(3);
            if match_start > 0 {
                segments.push(Segment::plain(&label[..match_start]));
            }
            if match_end > match_start {
                segments.push(Segment::highlighted(&label[match_start..match_end]));
            }
            if match_end < label.len() {
                segments.push(Segment::plain(&label[match_end..]));
            }
            return segments;
        }

        let mut segments = Vec::new();
        let mut query_pos = 0;
        let mut segment_start = 0;
        let mut in_match = false;

        for (index, &c) in folded.iter().enumerate() {
            let matches = query_pos < query.len() && c == query[query_pos];
            if matches {
                query_pos += 1;
            }

            if index > 0 && matches != in_match {
                segments.push(Segment {
                    text: label[offsets[segment_start]..offsets[index]].to_owned(),
                    highlight: in_match,
                });
                segment_start = index;
            }
            in_match = matches;
        }

        if !folded.is_empty() {
            segments.push(Segment {
                text: label[offsets[segment_start]..].to_owned(),
                highlight: in_match,
            });
        }

        segments
    }
}

/// Scores `label` against `query`. See [`FuzzyMatcher::score`].
pub fn score(query: &str, label: &str) -> Option<u32> {
    FuzzyMatcher::new(query).score(label)
}

/// Highlights `query` inside `label`. See [`FuzzyMatcher::highlight`].
pub fn highlight(query: &str, label: &str) -> Vec<Segment> {
    FuzzyMatcher::new(query).highlight(label)
}
