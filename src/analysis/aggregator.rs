//! Per-episode classification counts.
//!
//! This module provides the aggregation state that prediction records are
//! folded into, along with the derived totals used by the reports.

use crate::models::{Classification, PredictionRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Count of records per classification pair.
pub type PairCounts = BTreeMap<Classification, u64>;

/// Accumulated counts for one run.
///
/// Only the nested count mapping is stored; episode totals and the grand
/// total are always derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationState {
    per_episode_counts: BTreeMap<String, PairCounts>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the counts.
    pub fn record(&mut self, record: &PredictionRecord) {
        self.increment(&record.episode_id, record.classification);
    }

    /// Increment the count for `classification` within `episode_id`.
    pub fn increment(&mut self, episode_id: &str, classification: Classification) {
        *self
            .per_episode_counts
            .entry(episode_id.to_string())
            .or_default()
            .entry(classification)
            .or_insert(0) += 1;
    }

    /// Per-episode counts, ordered by episode identifier.
    pub fn per_episode_counts(&self) -> &BTreeMap<String, PairCounts> {
        &self.per_episode_counts
    }

    /// Counts for a single episode.
    pub fn episode_counts(&self, episode_id: &str) -> Option<&PairCounts> {
        self.per_episode_counts.get(episode_id)
    }

    /// Number of records in one episode (0 for an unseen episode).
    pub fn episode_total(&self, episode_id: &str) -> u64 {
        self.per_episode_counts
            .get(episode_id)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Totals for every episode, ordered by episode identifier.
    pub fn per_episode_totals(&self) -> BTreeMap<String, u64> {
        self.per_episode_counts
            .iter()
            .map(|(episode, counts)| (episode.clone(), counts.values().sum()))
            .collect()
    }

    /// Number of records across all episodes.
    pub fn grand_total(&self) -> u64 {
        self.per_episode_counts
            .values()
            .flat_map(|counts| counts.values())
            .sum()
    }

    /// Counts per classification pair summed across all episodes.
    pub fn overall_counts(&self) -> PairCounts {
        let mut overall = PairCounts::new();

        for counts in self.per_episode_counts.values() {
            for (classification, count) in counts {
                *overall.entry(*classification).or_insert(0) += count;
            }
        }

        overall
    }

    /// Every classification pair observed in any episode, in pair order.
    pub fn observed_pairs(&self) -> BTreeSet<Classification> {
        self.per_episode_counts
            .values()
            .flat_map(|counts| counts.keys().copied())
            .collect()
    }

    pub fn episode_count(&self) -> usize {
        self.per_episode_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_episode_counts.is_empty()
    }
}

/// Fold a sequence of records into a fresh state.
#[cfg(test)]
pub fn aggregate<'a, I>(records: I) -> AggregationState
where
    I: IntoIterator<Item = &'a PredictionRecord>,
{
    records
        .into_iter()
        .fold(AggregationState::new(), |mut state, record| {
            state.record(record);
            state
        })
}

/// Share of `count` in `total`, as a percentage. A zero total yields 0.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}

/// Percentage formatted with two decimals, e.g. `66.67`.
pub fn format_percentage(count: u64, total: u64) -> String {
    format!("{:.2}", percentage(count, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: &str, a: bool, b: bool) -> PredictionRecord {
        PredictionRecord::new(frame.to_string(), Classification::new(a, b))
    }

    fn sample_records() -> Vec<PredictionRecord> {
        vec![
            record("01_X-1.jpg", true, false),
            record("01_X-2.jpg", true, false),
            record("01_X-3.jpg", false, false),
            record("02_Y-1.jpg", true, true),
            record("Extra.jpg", false, true),
            record("10_Z-1.jpg", false, false),
        ]
    }

    #[test]
    fn test_aggregate_counts() {
        let state = aggregate(&sample_records());

        let ep1 = state.episode_counts("01").unwrap();
        assert_eq!(ep1.get(&Classification::new(true, false)), Some(&2));
        assert_eq!(ep1.get(&Classification::new(false, false)), Some(&1));
        assert_eq!(ep1.get(&Classification::new(true, true)), None);

        assert_eq!(state.episode_total("01"), 3);
        assert_eq!(state.episode_total("unknown"), 1);
        assert_eq!(state.episode_total("99"), 0);
        assert_eq!(state.episode_count(), 4);
    }

    #[test]
    fn test_totals_are_consistent() {
        let state = aggregate(&sample_records());

        let from_totals: u64 = state.per_episode_totals().values().sum();
        let from_counts: u64 = state
            .per_episode_counts()
            .values()
            .flat_map(|c| c.values())
            .sum();

        assert_eq!(state.grand_total(), 6);
        assert_eq!(state.grand_total(), from_totals);
        assert_eq!(state.grand_total(), from_counts);
    }

    #[test]
    fn test_order_independence() {
        let records = sample_records();
        let forward = aggregate(&records);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(aggregate(&reversed), forward);

        let mut rotated = records.clone();
        rotated.rotate_left(2);
        assert_eq!(aggregate(&rotated), forward);

        // Splitting the input and merging the halves gives the same counts
        let mut merged = aggregate(&records[..3]);
        for r in &records[3..] {
            merged.record(r);
        }
        assert_eq!(merged, forward);
    }

    #[test]
    fn test_episode_ordering_is_lexicographic() {
        let state = aggregate(&sample_records());
        let episodes: Vec<_> = state.per_episode_counts().keys().cloned().collect();
        assert_eq!(episodes, vec!["01", "02", "10", "unknown"]);
    }

    #[test]
    fn test_overall_counts_and_observed_pairs() {
        let state = aggregate(&sample_records());
        let overall = state.overall_counts();

        assert_eq!(overall.get(&Classification::new(false, false)), Some(&2));
        assert_eq!(overall.get(&Classification::new(true, false)), Some(&2));
        assert_eq!(overall.values().sum::<u64>(), state.grand_total());

        let pairs: Vec<_> = state.observed_pairs().into_iter().collect();
        assert_eq!(
            pairs,
            vec![
                Classification::new(false, false),
                Classification::new(false, true),
                Classification::new(true, false),
                Classification::new(true, true),
            ]
        );
    }

    #[test]
    fn test_empty_state() {
        let state = AggregationState::new();
        assert!(state.is_empty());
        assert_eq!(state.grand_total(), 0);
        assert!(state.overall_counts().is_empty());
    }

    #[test]
    fn test_percentage_guard() {
        assert_eq!(format_percentage(0, 0), "0.00");
        assert_eq!(format_percentage(5, 0), "0.00");
        assert_eq!(format_percentage(2, 2), "100.00");
        assert_eq!(format_percentage(2, 3), "66.67");
        assert_eq!(format_percentage(1, 3), "33.33");
    }
}
