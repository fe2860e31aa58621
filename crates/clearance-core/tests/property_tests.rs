//! # Property-Based Tests
//!
//! Invariants of the progress derivations, checked with proptest over
//! arbitrary clearance maps.

use chrono::NaiveDate;
use clearance_core::formats::{record_from_blob, record_to_blob};
use clearance_core::{
    ClearanceEntry, ClearanceStatus, Decision, DepartmentId, DepartmentSet, OverallStatus,
    Snapshot, StudentRecord, approved_count, compute_overall_status, compute_progress_percentage,
    normalize, snapshot_from_bytes, snapshot_to_bytes, summarize,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = ClearanceStatus> {
    prop_oneof![
        Just(ClearanceStatus::Pending),
        Just(ClearanceStatus::Approved),
        Just(ClearanceStatus::Rejected),
    ]
}

fn entry(status: ClearanceStatus, day: u32) -> ClearanceEntry {
    let date = NaiveDate::from_ymd_opt(2024, 11, day).expect("valid date");
    match status {
        ClearanceStatus::Pending => ClearanceEntry::pending(),
        ClearanceStatus::Approved => ClearanceEntry::decided(Decision::Approved, "Reviewer", date, None),
        ClearanceStatus::Rejected => ClearanceEntry::decided(Decision::Rejected, "Reviewer", date, Some("Outstanding dues")),
    }
}

/// A normalized record over the first `statuses.len()` departments.
fn record_with(statuses: &[ClearanceStatus]) -> StudentRecord {
    let mut record = StudentRecord::new("STU100", DepartmentSet::Extended);
    record.clearances = DepartmentId::ALL
        .iter()
        .zip(statuses)
        .enumerate()
        .map(|(i, (&dept, &status))| (dept, entry(status, i as u32 + 1)))
        .collect();
    normalize(record)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Percentage stays in range and matches round-half-up of the ratio.
    #[test]
    fn percentage_matches_formula(statuses in vec(status_strategy(), 0..=8)) {
        let record = record_with(&statuses);
        let percent = u64::from(compute_progress_percentage(&record));
        prop_assert!(percent <= 100);

        let total = statuses.len() as u64;
        if total == 0 {
            prop_assert_eq!(percent, 0);
        } else {
            let approved = approved_count(&record) as u64;
            // percent is the integer nearest 100 * approved / total, ties up
            let scaled = 100 * approved * 2;
            prop_assert!(percent * 2 * total <= scaled + total);
            prop_assert!(scaled + total < (percent + 1) * 2 * total);
        }
    }

    /// One rejection blocks regardless of the other departments.
    #[test]
    fn rejection_dominates(
        statuses in vec(status_strategy(), 1..=8),
        index in any::<prop::sample::Index>()
    ) {
        let mut statuses = statuses;
        let target = index.index(statuses.len());
        statuses[target] = ClearanceStatus::Rejected;
        prop_assert_eq!(compute_overall_status(&record_with(&statuses)), OverallStatus::Blocked);
    }

    /// All approved completes; anything short of that without a rejection
    /// stays in progress.
    #[test]
    fn completion_requires_every_approval(statuses in vec(status_strategy(), 1..=8)) {
        let record = record_with(&statuses);
        let any_rejected = statuses.contains(&ClearanceStatus::Rejected);
        let all_approved = statuses.iter().all(|s| *s == ClearanceStatus::Approved);

        let expected = if any_rejected {
            OverallStatus::Blocked
        } else if all_approved {
            OverallStatus::Completed
        } else {
            OverallStatus::InProgress
        };
        prop_assert_eq!(compute_overall_status(&record), expected);
        prop_assert_eq!(summarize(&record).percent == 100, all_approved);
    }

    /// Stored blobs reload field-for-field.
    #[test]
    fn blob_roundtrip(statuses in vec(status_strategy(), 1..=8), paid in any::<bool>()) {
        let mut record = record_with(&statuses);
        record.graduation_fee.paid = paid;
        record.graduation_fee.amount = if paid { 5500 } else { 0 };

        let blob = record_to_blob(&record).expect("encode");
        prop_assert_eq!(record_from_blob(&blob).expect("decode"), record);
    }

    /// Snapshot encoding is stable across a decode/encode cycle.
    #[test]
    fn snapshot_is_bit_exact(rows in vec(vec(status_strategy(), 1..=8), 0..6)) {
        let roster: Vec<StudentRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, statuses)| {
                let mut record = record_with(statuses);
                record.id = format!("STU{:03}", i);
                record
            })
            .collect();
        let snapshot = Snapshot { student: roster.first().cloned(), roster };

        let bytes = snapshot_to_bytes(&snapshot).expect("encode");
        let decoded = snapshot_from_bytes(&bytes).expect("decode");
        prop_assert_eq!(&decoded, &snapshot);
        prop_assert_eq!(snapshot_to_bytes(&decoded).expect("re-encode"), bytes);
    }
}
