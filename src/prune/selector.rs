//! Candidate selection.

use crate::models::LabelRecord;

/// Picks the stage to remove when there are more stages than `threshold`.
///
/// `stages` must already be deduplicated and exclusion-filtered. Returns
/// `None` while the count is at or under the threshold. Otherwise returns
/// the record with the oldest `created_date`; among equally old records the
/// one that appears first in `stages` wins.
#[must_use]
pub fn pick_oldest_stage_to_deprecate(
    stages: &[LabelRecord],
    threshold: usize,
) -> Option<&LabelRecord> {
    if stages.len() <= threshold {
        return None;
    }

    // Strict comparison keeps the earliest record on ties.
    stages.iter().reduce(|oldest, record| {
        if record.created_date < oldest.created_date {
            record
        } else {
            oldest
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use test_case::test_case;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0)
            .single()
            .expect("valid test date")
    }

    fn record(stage: &str, version: &str, d: u32) -> LabelRecord {
        LabelRecord::new(stage, version, day(d))
    }

    #[test_case(0, 0 ; "empty at zero")]
    #[test_case(2, 2 ; "exactly at threshold")]
    #[test_case(1, 5 ; "well under threshold")]
    fn test_no_candidate_within_threshold(count: usize, threshold: usize) {
        let stages: Vec<_> = (0..count)
            .map(|i| record(&format!("s{i}"), &format!("v{i}"), 1))
            .collect();
        assert!(pick_oldest_stage_to_deprecate(&stages, threshold).is_none());
    }

    #[test]
    fn test_picks_oldest_over_threshold() {
        let stages = vec![
            record("b", "v2", 3),
            record("a", "v1", 1),
            record("c", "v3", 2),
        ];

        let picked = pick_oldest_stage_to_deprecate(&stages, 2).expect("candidate");
        assert_eq!(picked.stage, "a");
        assert_eq!(picked.version_id, "v1");
    }

    #[test]
    fn test_ties_resolve_to_first_in_input_order() {
        let stages = vec![
            record("late", "v9", 5),
            record("first-tie", "v1", 1),
            record("second-tie", "v2", 1),
        ];

        let picked = pick_oldest_stage_to_deprecate(&stages, 0).expect("candidate");
        assert_eq!(picked.stage, "first-tie");
    }

    #[test]
    fn test_epoch_record_is_always_oldest() {
        let stages = vec![
            record("dated", "v1", 1),
            LabelRecord::new("undated", "v2", DateTime::UNIX_EPOCH),
        ];

        let picked = pick_oldest_stage_to_deprecate(&stages, 1).expect("candidate");
        assert_eq!(picked.stage, "undated");
    }
}
