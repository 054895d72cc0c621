//! Exclusion filtering and per-stage deduplication.

use crate::models::{ExclusionSet, LabelRecord};
use std::collections::HashMap;

/// Maps each manageable stage name to its authoritative record.
///
/// Built by scanning label records in collection order:
/// - records whose stage is excluded are counted and dropped
/// - the first record seen for a stage is stored
/// - a later record for the same stage replaces it only when its
///   `created_date` is strictly newer
///
/// Records are kept in first-seen order, which is the order the selector
/// uses to break ties.
#[derive(Debug, Clone, Default)]
pub struct UniqueStageIndex {
    records: Vec<LabelRecord>,
    positions: HashMap<String, usize>,
    total_label_count: usize,
    excluded_label_count: usize,
}

impl UniqueStageIndex {
    /// Builds the index from records in collection order.
    #[must_use]
    pub fn build<I>(records: I, exclusions: &ExclusionSet) -> Self
    where
        I: IntoIterator<Item = LabelRecord>,
    {
        let mut index = Self::default();
        for record in records {
            index.observe(record, exclusions);
        }
        index
    }

    fn observe(&mut self, record: LabelRecord, exclusions: &ExclusionSet) {
        self.total_label_count += 1;

        if exclusions.contains(&record.stage) {
            self.excluded_label_count += 1;
            return;
        }

        if let Some(&position) = self.positions.get(&record.stage) {
            let stored = &mut self.records[position];
            if record.created_date > stored.created_date {
                *stored = record;
            }
            return;
        }

        self.positions.insert(record.stage.clone(), self.records.len());
        self.records.push(record);
    }

    /// Number of distinct manageable stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no manageable stage was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Authoritative records in first-seen order.
    #[must_use]
    pub fn records(&self) -> &[LabelRecord] {
        &self.records
    }

    /// Looks up the authoritative record of a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&LabelRecord> {
        self.positions
            .get(stage)
            .and_then(|&position| self.records.get(position))
    }

    /// Every label observed, excluded ones included.
    #[must_use]
    pub const fn total_label_count(&self) -> usize {
        self.total_label_count
    }

    /// Labels dropped because their stage is excluded.
    #[must_use]
    pub const fn excluded_label_count(&self) -> usize {
        self.excluded_label_count
    }

    /// Records sorted oldest first; ties keep first-seen order.
    #[must_use]
    pub fn oldest_first(&self) -> Vec<LabelRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|record| record.created_date);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0)
            .single()
            .expect("valid test date")
    }

    fn record(stage: &str, version: &str, d: u32) -> LabelRecord {
        LabelRecord::new(stage, version, day(d))
    }

    #[test]
    fn test_excluded_stages_are_counted_but_not_indexed() {
        let index = UniqueStageIndex::build(
            vec![
                record("AWSCURRENT", "v3", 3),
                record("release-1", "v1", 1),
                record("AWSPREVIOUS", "v2", 2),
            ],
            &ExclusionSet::reserved(),
        );

        assert_eq!(index.total_label_count(), 3);
        assert_eq!(index.excluded_label_count(), 2);
        assert_eq!(index.len(), 1);
        assert!(index.get("AWSCURRENT").is_none());
    }

    #[test]
    fn test_newest_record_wins_per_stage() {
        let index = UniqueStageIndex::build(
            vec![
                record("shared", "old", 1),
                record("other", "v5", 5),
                record("shared", "new", 4),
                record("shared", "middle", 2),
            ],
            &ExclusionSet::empty(),
        );

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("shared").map(|r| r.version_id.as_str()), Some("new"));
        assert_eq!(index.total_label_count(), 4);
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen() {
        let index = UniqueStageIndex::build(
            vec![record("shared", "first", 2), record("shared", "second", 2)],
            &ExclusionSet::empty(),
        );

        assert_eq!(
            index.get("shared").map(|r| r.version_id.as_str()),
            Some("first")
        );
    }

    #[test]
    fn test_replacement_keeps_first_seen_position() {
        let index = UniqueStageIndex::build(
            vec![
                record("a", "v1", 1),
                record("b", "v2", 2),
                record("a", "v3", 3),
            ],
            &ExclusionSet::empty(),
        );

        let order: Vec<&str> = index.records().iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(index.records()[0].version_id, "v3");
    }

    #[test]
    fn test_oldest_first_is_stable() {
        let index = UniqueStageIndex::build(
            vec![
                record("c", "v3", 3),
                record("a", "v1", 1),
                record("b", "v2", 1),
            ],
            &ExclusionSet::empty(),
        );

        let order: Vec<String> = index.oldest_first().into_iter().map(|r| r.stage).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
