//! Property-based tests for stage indexing and candidate selection.
//!
//! Uses proptest to verify invariants across random label sets:
//! - No candidate while the count is at or under the threshold
//! - The candidate is the global oldest, earliest on ties
//! - Excluded stages never reach the index
//! - Deduplication keeps the newest record per stage

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use stageprune::{ExclusionSet, LabelRecord, UniqueStageIndex, pick_oldest_stage_to_deprecate};
use std::collections::HashMap;

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("in range")
}

/// Records over a small stage alphabet so duplicates are common.
fn label_records() -> impl Strategy<Value = Vec<LabelRecord>> {
    prop::collection::vec(
        (
            prop::sample::select(vec![
                "AWSCURRENT",
                "AWSPREVIOUS",
                "AWSPENDING",
                "release-1",
                "release-2",
                "release-3",
                "release-4",
                "canary",
                "pinned",
            ]),
            0u32..50,
            0i64..1_000,
        ),
        0..40,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(stage, version, secs)| {
                LabelRecord::new(stage, format!("v{version}"), timestamp(secs))
            })
            .collect()
    })
}

/// Distinct stages, possibly sharing timestamps.
fn unique_records() -> impl Strategy<Value = Vec<LabelRecord>> {
    prop::collection::vec(0i64..20, 0..30).prop_map(|times| {
        times
            .into_iter()
            .enumerate()
            .map(|(i, secs)| LabelRecord::new(format!("stage-{i}"), format!("v{i}"), timestamp(secs)))
            .collect()
    })
}

proptest! {
    /// Property: no candidate while `len <= threshold`.
    #[test]
    fn prop_no_candidate_within_threshold(records in unique_records(), extra in 0usize..5) {
        let threshold = records.len() + extra;
        prop_assert!(pick_oldest_stage_to_deprecate(&records, threshold).is_none());
    }

    /// Property: over the threshold the candidate is the first record with the minimum date.
    #[test]
    fn prop_candidate_is_first_oldest(records in unique_records(), threshold in 0usize..30) {
        prop_assume!(records.len() > threshold);

        let candidate = pick_oldest_stage_to_deprecate(&records, threshold).expect("over threshold");
        let min = records.iter().map(|r| r.created_date).min().expect("non-empty");
        let first_oldest = records.iter().find(|r| r.created_date == min).expect("min exists");

        prop_assert_eq!(candidate, first_oldest);
    }

    /// Property: excluded stages never appear in the index or as a candidate.
    #[test]
    fn prop_excluded_stages_never_indexed(records in label_records(), threshold in 0usize..5) {
        let exclusions = ExclusionSet::reserved().with_stage("pinned");
        let index = UniqueStageIndex::build(records.clone(), &exclusions);

        prop_assert!(index.records().iter().all(|r| !exclusions.contains(&r.stage)));
        if let Some(candidate) = pick_oldest_stage_to_deprecate(index.records(), threshold) {
            prop_assert!(!exclusions.contains(&candidate.stage));
        }

        let excluded = records.iter().filter(|r| exclusions.contains(&r.stage)).count();
        prop_assert_eq!(index.total_label_count(), records.len());
        prop_assert_eq!(index.excluded_label_count(), excluded);
    }

    /// Property: each stage appears once, carrying its newest date.
    #[test]
    fn prop_dedup_keeps_newest(records in label_records()) {
        let index = UniqueStageIndex::build(records.clone(), &ExclusionSet::empty());

        let mut newest: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for record in &records {
            let entry = newest.entry(record.stage.as_str()).or_insert(record.created_date);
            if record.created_date > *entry {
                *entry = record.created_date;
            }
        }

        prop_assert_eq!(index.len(), newest.len());
        for record in index.records() {
            prop_assert_eq!(Some(&record.created_date), newest.get(record.stage.as_str()));
        }
    }

    /// Property: on equal dates the first-seen record for a stage is kept.
    #[test]
    fn prop_dedup_ties_keep_first_seen(versions in prop::collection::vec(0u32..100, 1..10)) {
        let records: Vec<LabelRecord> = versions
            .iter()
            .map(|v| LabelRecord::new("release", format!("v{v}"), timestamp(0)))
            .collect();

        let index = UniqueStageIndex::build(records, &ExclusionSet::empty());
        let kept = index.get("release").expect("indexed");
        prop_assert_eq!(&kept.version_id, &format!("v{}", versions[0]));
    }

    /// Property: `oldest_first` is sorted and holds the same records.
    #[test]
    fn prop_oldest_first_sorted(records in label_records()) {
        let index = UniqueStageIndex::build(records, &ExclusionSet::reserved());
        let ordered = index.oldest_first();

        prop_assert_eq!(ordered.len(), index.len());
        prop_assert!(ordered.windows(2).all(|pair| pair[0].created_date <= pair[1].created_date));
    }
}
