//! Incremental top-K ranking over a stream of raw paths.
//!
//! The ranker keeps every matched candidate in discovery order and re-ranks
//! them with a stable sort, so candidates with equal scores stay in the order
//! the path source produced them. For a depth-first walk that favours shallow
//! and alphabetically early paths.

use crate::score::FuzzyMatcher;
use crate::types::{Candidate, RankedItem, RankedSnapshot, ScoredCandidate};
use ahash::AHashSet;
use tracing::{debug, trace};

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_DISPLAY_EVERY: usize = 5;
pub const DEFAULT_HARD_CAP_MULTIPLIER: usize = 3;

/// Upper bound on what is reserved up front. Buffers grow past it on demand.
const PREALLOCATION_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankerConfig {
    /// Size of the ranked result list (K).
    pub max_results: usize,
    /// Re-rank after this many new matches.
    pub display_every: usize,
    /// Stop consuming once this many candidates matched.
    pub hard_cap: usize,
}

impl RankerConfig {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            display_every: DEFAULT_DISPLAY_EVERY,
            hard_cap: max_results.saturating_mul(DEFAULT_HARD_CAP_MULTIPLIER),
        }
    }

    /// Clamps every knob to a usable value, the hard cap never below K.
    pub fn normalized(self) -> Self {
        let max_results = self.max_results.max(1);
        Self {
            max_results,
            display_every: self.display_every.max(1),
            hard_cap: self.hard_cap.max(max_results),
        }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

#[derive(Debug)]
pub struct IncrementalRanker {
    matcher: FuzzyMatcher,
    config: RankerConfig,
    /// Every matched candidate, in discovery order.
    matched: Vec<ScoredCandidate>,
    matched_paths: AHashSet<String>,
    /// Result of the latest re-rank, sorted by descending score.
    top: Vec<ScoredCandidate>,
    since_last_rank: usize,
    total_seen: usize,
    closed: bool,
}

impl IncrementalRanker {
    pub fn new(query: &str, config: RankerConfig) -> Self {
        let config = config.normalized();
        Self {
            matcher: FuzzyMatcher::new(query),
            config,
            matched: Vec::with_capacity(config.hard_cap.min(PREALLOCATION_LIMIT)),
            matched_paths: AHashSet::with_capacity(config.hard_cap.min(PREALLOCATION_LIMIT)),
            top: Vec::with_capacity(config.max_results.min(PREALLOCATION_LIMIT)),
            since_last_rank: 0,
            total_seen: 0,
            closed: false,
        }
    }

    #[inline]
    pub fn query(&self) -> &str {
        self.matcher.query()
    }

    #[inline]
    pub fn config(&self) -> RankerConfig {
        self.config
    }

    /// Consumes one raw path.
    ///
    /// Returns a fresh snapshot when the cadence asks for one: after every
    /// `display_every` new matches, or on every match once K candidates
    /// matched. Reaching the hard cap returns the final snapshot and closes
    /// the ranker. Closed rankers ignore everything.
    pub fn feed(&mut self, raw_path: impl Into<String>) -> Option<RankedSnapshot> {
        if self.closed {
            return None;
        }
        self.total_seen += 1;

        let candidate = Candidate::new(raw_path);
        let score = self.matcher.score(&candidate.basename)?;

        // overlapping search roots report the same path more than once
        if !self.matched_paths.insert(candidate.path.clone()) {
            trace!(path = ?candidate.path, "Skipping duplicate candidate");
            return None;
        }

        self.matched.push(ScoredCandidate { candidate, score });
        self.since_last_rank += 1;

        if self.reached_hard_cap() {
            debug!(
                query = self.query(),
                hard_cap = self.config.hard_cap,
                total_seen = self.total_seen,
                "Hard cap reached, closing ranker"
            );
            return Some(self.finalize());
        }

        if self.since_last_rank >= self.config.display_every
            || self.matched.len() >= self.config.max_results
        {
            return Some(self.rank(false));
        }

        None
    }

    /// Signals the end of the stream. Returns the final snapshot unless the
    /// ranker was already closed.
    pub fn finish(&mut self) -> Option<RankedSnapshot> {
        if self.closed {
            return None;
        }
        Some(self.finalize())
    }

    /// Closes without producing anything. Used when a newer query supersedes
    /// this one.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// The latest ranked view, without re-ranking.
    pub fn snapshot(&self) -> RankedSnapshot {
        self.build_snapshot(self.closed)
    }

    #[inline]
    pub fn top(&self) -> &[ScoredCandidate] {
        &self.top
    }

    #[inline]
    pub fn total_seen(&self) -> usize {
        self.total_seen
    }

    #[inline]
    pub fn total_matched(&self) -> usize {
        self.matched.len()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn reached_hard_cap(&self) -> bool {
        self.matched.len() >= self.config.hard_cap
    }

    fn finalize(&mut self) -> RankedSnapshot {
        self.closed = true;
        self.rank(true)
    }

    fn rank(&mut self, is_final: bool) -> RankedSnapshot {
        let mut ranked = self.matched.clone();
        // glidesort is stable: equal scores keep their discovery order
        glidesort::sort_by(&mut ranked, |a, b| b.score.cmp(&a.score));
        ranked.truncate(self.config.max_results);

        self.top = ranked;
        self.since_last_rank = 0;
        self.build_snapshot(is_final)
    }

    fn build_snapshot(&self, is_final: bool) -> RankedSnapshot {
        let items = self
            .top
            .iter()
            .map(|scored| RankedItem {
                path: scored.candidate.path.clone(),
                basename: scored.candidate.basename.clone(),
                score: scored.score,
                segments: self.matcher.highlight(&scored.candidate.basename),
            })
            .collect();

        RankedSnapshot {
            items,
            total_seen: self.total_seen,
            total_matched: self.matched.len(),
            is_final,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{PREFIX_MATCH_SCORE, SUBSTRING_MATCH_SCORE};
    use proptest::prelude::*;

    fn config(max_results: usize, display_every: usize, hard_cap: usize) -> RankerConfig {
        RankerConfig {
            max_results,
            display_every,
            hard_cap,
        }
    }

    fn paths(snapshot: &RankedSnapshot) -> Vec<&str> {
        snapshot.items.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_emits_every_n_matches() {
        let mut ranker = IncrementalRanker::new("rep", config(10, 3, 30));

        assert!(ranker.feed("/d/report-1.txt").is_none());
        assert!(ranker.feed("/d/unrelated.txt").is_none());
        assert!(ranker.feed("/d/report-2.txt").is_none());

        let snapshot = ranker.feed("/d/report-3.txt").expect("third match re-ranks");
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.total_seen, 4);
        assert_eq!(snapshot.total_matched, 3);
        assert!(!snapshot.is_final);

        assert!(ranker.feed("/d/report-4.txt").is_none());
    }

    #[test]
    fn test_emits_on_every_match_once_k_reached() {
        let mut ranker = IncrementalRanker::new("a", config(2, 100, 50));

        assert!(ranker.feed("/x/a1").is_none());
        assert!(ranker.feed("/x/a2").is_some());
        assert!(ranker.feed("/x/nothing-here").is_none());
        assert!(ranker.feed("/x/a3").is_some());
    }

    #[test]
    fn test_hard_cap_closes_the_ranker() {
        let mut ranker = IncrementalRanker::new("log", config(2, 1, 3));

        ranker.feed("/var/log1");
        ranker.feed("/var/log2");
        let last = ranker.feed("/var/log3").expect("hard cap emits");
        assert!(last.is_final);
        assert!(ranker.is_closed());
        assert!(ranker.reached_hard_cap());
        assert_eq!(last.len(), 2);

        // nothing observable happens afterwards
        assert!(ranker.feed("/var/log4").is_none());
        assert_eq!(ranker.total_seen(), 3);
        assert!(ranker.finish().is_none());
    }

    #[test]
    fn test_ranking_order_and_stable_ties() {
        let mut ranker = IncrementalRanker::new("app", config(4, 100, 100));

        ranker.feed("/home/Happy.txt");
        ranker.feed("/home/Application.docx");
        ranker.feed("/home/snapper.png");
        ranker.feed("/home/apple.jpg");
        ranker.feed("/home/a_p_p.md");

        let snapshot = ranker.finish().unwrap();
        assert!(snapshot.is_final);
        assert_eq!(
            paths(&snapshot),
            vec![
                "/home/Application.docx",
                "/home/apple.jpg",
                "/home/Happy.txt",
                "/home/snapper.png",
            ]
        );
        let scores: Vec<u32> = snapshot.items.iter().map(|i| i.score).collect();
        assert_eq!(
            scores,
            vec![
                PREFIX_MATCH_SCORE,
                PREFIX_MATCH_SCORE,
                SUBSTRING_MATCH_SCORE,
                SUBSTRING_MATCH_SCORE
            ]
        );
    }

    #[test]
    fn test_non_matching_paths_only_count_as_seen() {
        let mut ranker = IncrementalRanker::new("zzz", RankerConfig::default());
        for i in 0..50 {
            assert!(ranker.feed(format!("/tmp/file{i}")).is_none());
        }
        assert_eq!(ranker.total_seen(), 50);
        assert_eq!(ranker.total_matched(), 0);

        let snapshot = ranker.finish().unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.is_final);
    }

    #[test]
    fn test_duplicate_paths_are_ranked_once() {
        let mut ranker = IncrementalRanker::new("notes", RankerConfig::default());
        ranker.feed("/home/u/Documents/notes.md");
        ranker.feed("/home/u/Documents/notes.md");

        assert_eq!(ranker.total_seen(), 2);
        assert_eq!(ranker.total_matched(), 1);
        assert_eq!(ranker.finish().unwrap().len(), 1);
    }

    #[test]
    fn test_close_discards_further_input() {
        let mut ranker = IncrementalRanker::new("a", config(1, 1, 10));
        ranker.feed("/a1");
        let before = ranker.snapshot();

        ranker.close();
        assert!(ranker.feed("/a2").is_none());
        assert!(ranker.finish().is_none());

        let after = ranker.snapshot();
        assert_eq!(before.items, after.items);
        assert_eq!(before.total_seen, after.total_seen);
        assert!(after.is_final);
    }

    #[test]
    fn test_snapshot_items_are_highlighted() {
        let mut ranker = IncrementalRanker::new("app", config(1, 1, 10));
        let snapshot = ranker.feed("/home/Happy.txt").unwrap();
        assert_eq!(snapshot.items[0].marked_basename(), "H[app]y.txt");
    }

    #[test]
    fn test_huge_limits_do_not_reserve_memory() {
        let mut unbounded = IncrementalRanker::new("a", config(10, 1, usize::MAX));
        assert!(unbounded.feed("/x/a1").is_some());
        assert!(!unbounded.reached_hard_cap());

        let mut huge = IncrementalRanker::new("a", RankerConfig::new(2_000_000_000));
        for i in 0..2000 {
            huge.feed(format!("/x/a{i}"));
        }
        let snapshot = huge.finish().unwrap();
        assert_eq!(snapshot.len(), 2000);
        assert_eq!(snapshot.total_matched, 2000);
    }

    #[test]
    fn test_config_normalization() {
        let normalized = config(0, 0, 0).normalized();
        assert_eq!(normalized, config(1, 1, 1));
        assert_eq!(RankerConfig::new(10).hard_cap, 30);
        assert_eq!(RankerConfig::default().display_every, DEFAULT_DISPLAY_EVERY);
    }

    proptest! {
        #[test]
        fn prop_top_k_is_bounded_and_sorted(
            labels in proptest::collection::vec("[abcx]{1,6}", 0..60),
            k in 1usize..6,
            every in 1usize..4,
        ) {
            let mut ranker = IncrementalRanker::new("ab", config(k, every, k * 3));
            for (i, label) in labels.iter().enumerate() {
                if let Some(snapshot) = ranker.feed(format!("/p{i}/{label}")) {
                    prop_assert!(snapshot.len() <= k);
                    prop_assert!(snapshot.items.windows(2).all(|w| w[0].score >= w[1].score));
                }
                prop_assert!(ranker.top().len() <= k);
            }
        }

        #[test]
        fn prop_noise_placement_does_not_change_result(
            labels in proptest::collection::vec("[abc]{1,5}", 1..30),
            noise_positions in proptest::collection::vec(0usize..40, 0..20),
        ) {
            let k = 5;
            let run = |paths: &[String]| {
                let mut ranker = IncrementalRanker::new("ab", config(k, 2, 1000));
                for path in paths {
                    ranker.feed(path.clone());
                }
                ranker.finish().unwrap().items
            };

            let matched: Vec<String> = labels
                .iter()
                .enumerate()
                .map(|(i, label)| format!("/m{i}/{label}"))
                .collect();

            let mut interleaved = matched.clone();
            for (n, position) in noise_positions.iter().enumerate() {
                let position = (*position).min(interleaved.len());
                interleaved.insert(position, format!("/noise{n}/zzz"));
            }

            prop_assert_eq!(run(&matched), run(&interleaved));
        }
    }
}
