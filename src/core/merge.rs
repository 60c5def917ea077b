//! Multi-source merge with identity-based deduplication
//!
//! Consolidates several record sets (the current store plus uploaded files)
//! into one ledger.
//!
//! # Rules
//!
//! - Each source row is checked structurally; rows that fail are excluded
//!   and reported in [`MergeOutcome::rejected`], never dropped silently
//! - Records are keyed by `id`. The first occurrence in source-then-row
//!   order is retained; every id that collapsed is listed in
//!   [`MergeOutcome::dropped_duplicate_ids`]
//! - The merged ledger is sorted by timestamp, ties broken by id
//!
//! Merging is a pure function of its inputs; [`consolidate`] is the only
//! entry point that writes, and it commits through a single
//! [`LedgerStore::replace`] after the whole merged set is assembled.

use crate::core::ledger_store::LedgerStore;
use crate::core::validator::check_structure;
use crate::types::{LedgerError, TransactionRecord};
use std::collections::{BTreeSet, HashSet};

/// Name given to the current store contents when consolidating
pub const STORE_SOURCE: &str = "ledger";

/// One input to a merge, rows in file order
///
/// Rows that could not be parsed are kept as errors so the merge can report
/// them alongside structural rejections.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRows {
    /// Where the rows came from (file path or label)
    pub name: String,
    pub rows: Vec<Result<TransactionRecord, LedgerError>>,
}

impl SourceRows {
    pub fn new(name: impl Into<String>, rows: Vec<Result<TransactionRecord, LedgerError>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// A source whose rows are all already parsed
    pub fn from_records(name: impl Into<String>, records: Vec<TransactionRecord>) -> Self {
        Self::new(name, records.into_iter().map(Ok).collect())
    }
}

/// A row excluded from the merge and why
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// Name of the source the row came from
    pub source: String,
    /// Parse or validation error, with the line number when known
    pub error: LedgerError,
}

/// Result of a merge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    /// Deduplicated records, sorted by (timestamp, id)
    pub records: Vec<TransactionRecord>,

    /// Ids that appeared more than once across (or within) the sources
    pub dropped_duplicate_ids: BTreeSet<String>,

    /// Number of duplicate occurrences discarded
    pub duplicates_removed: usize,

    /// Rows excluded for structural problems
    pub rejected: Vec<RejectedRow>,
}

/// Merge record sets, first-seen wins
///
/// # Arguments
///
/// * `sources` - Inputs in priority order
///
/// # Returns
///
/// The merged, sorted ledger with its duplicate and rejection reports.
pub fn merge(sources: Vec<SourceRows>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for source in sources {
        for row in source.rows {
            let record = match row.and_then(|record| {
                check_structure(&record)
                    .map(|()| record)
                    .map_err(|errors| LedgerError::validation(None, errors))
            }) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(source = %source.name, error = %error, "row excluded from merge");
                    outcome.rejected.push(RejectedRow {
                        source: source.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            if seen.contains(&record.id) {
                tracing::debug!(source = %source.name, id = %record.id, "duplicate id dropped");
                outcome.dropped_duplicate_ids.insert(record.id);
                outcome.duplicates_removed += 1;
                continue;
            }

            seen.insert(record.id.clone());
            outcome.records.push(record);
        }
    }

    // Stable sort keeps the (timestamp, id) order total; ids are unique here
    outcome
        .records
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    outcome
}

/// Merge uploaded sources into the canonical store and commit the result
///
/// The current store contents take priority over every upload, so an
/// upload can add records but never overwrite a committed one.
///
/// # Errors
///
/// Any failure reading the store or committing the replacement. Nothing is
/// written unless the full merged set was assembled.
pub fn consolidate(
    store: &LedgerStore,
    uploads: Vec<SourceRows>,
) -> Result<MergeOutcome, LedgerError> {
    let current = store.read_all()?;
    let existing = current.len();

    let mut sources = Vec::with_capacity(uploads.len() + 1);
    sources.push(SourceRows::from_records(STORE_SOURCE, current));
    sources.extend(uploads);

    let outcome = merge(sources);
    store.replace(&outcome.records)?;

    tracing::info!(
        before = existing,
        after = outcome.records.len(),
        duplicates = outcome.duplicates_removed,
        rejected = outcome.rejected.len(),
        "sources consolidated"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldError, Role};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use time::macros::datetime;
    use time::PrimitiveDateTime;

    fn record(id: &str, timestamp: PrimitiveDateTime, amount: i64, barber: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            timestamp,
            amount: Decimal::new(amount, 0),
            service_type: "Haircut".to_string(),
            barber: barber.to_string(),
            customer: String::new(),
            role: Role::Employee,
            notes: String::new(),
        }
    }

    fn ids(outcome: &MergeOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_merge_sorts_by_timestamp_then_id() {
        let a = SourceRows::from_records(
            "a",
            vec![
                record("b2", datetime!(2025-03-02 09:00), 20, "David"),
                record("a1", datetime!(2025-03-01 09:00), 10, "David"),
            ],
        );
        let b = SourceRows::from_records(
            "b",
            vec![record("a2", datetime!(2025-03-02 09:00), 30, "Mike")],
        );

        let outcome = merge(vec![a, b]);

        assert_eq!(ids(&outcome), vec!["a1", "a2", "b2"]);
        assert!(outcome.dropped_duplicate_ids.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_merge_first_seen_wins_across_sources() {
        let a = SourceRows::from_records("a", vec![record("A", datetime!(2025-03-01 09:00), 10, "David")]);
        let b = SourceRows::from_records("b", vec![record("X", datetime!(2025-03-02 09:00), 20, "Mike")]);
        let c = SourceRows::from_records(
            "c",
            vec![
                record("X", datetime!(2025-03-05 15:00), 99, "Tony"),
                record("C", datetime!(2025-03-03 09:00), 30, "Tony"),
            ],
        );

        let outcome = merge(vec![a, b, c]);

        let kept: Vec<_> = outcome.records.iter().filter(|r| r.id == "X").collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].barber, "Mike");
        assert_eq!(kept[0].amount, Decimal::new(20, 0));
        assert_eq!(
            outcome.dropped_duplicate_ids,
            BTreeSet::from(["X".to_string()])
        );
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(ids(&outcome), vec!["A", "X", "C"]);
    }

    #[test]
    fn test_merge_dedups_within_a_single_source() {
        let a = SourceRows::from_records(
            "a",
            vec![
                record("r1", datetime!(2025-03-01 09:00), 10, "David"),
                record("r1", datetime!(2025-03-01 09:00), 11, "David"),
                record("r1", datetime!(2025-03-01 09:00), 12, "David"),
            ],
        );

        let outcome = merge(vec![a]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].amount, Decimal::new(10, 0));
        assert_eq!(outcome.duplicates_removed, 2);
    }

    #[rstest]
    #[case::once(1)]
    #[case::twice(2)]
    #[case::five_times(5)]
    fn test_merge_is_idempotent(#[case] copies: usize) {
        let source = vec![
            record("r2", datetime!(2025-03-02 09:00), 20, "David"),
            record("r1", datetime!(2025-03-01 09:00), 10, "Mike"),
        ];
        let once = merge(vec![SourceRows::from_records("s", source.clone())]);

        let repeated: Vec<_> = (0..copies)
            .map(|_| SourceRows::from_records("s", source.clone()))
            .collect();
        let outcome = merge(repeated);

        assert_eq!(outcome.records, once.records);
    }

    #[test]
    fn test_merge_reports_rejected_rows() {
        let bad_row = Err(LedgerError::validation(Some(3), vec![FieldError::MissingTimestamp]));
        let blank_barber = record("r2", datetime!(2025-03-01 10:00), 10, "");
        let source = SourceRows::new(
            "upload.csv",
            vec![
                Ok(record("r1", datetime!(2025-03-01 09:00), 10, "David")),
                bad_row.clone(),
                Ok(blank_barber),
            ],
        );

        let outcome = merge(vec![source]);

        assert_eq!(ids(&outcome), vec!["r1"]);
        assert_eq!(
            outcome.rejected,
            vec![
                RejectedRow {
                    source: "upload.csv".to_string(),
                    error: bad_row.unwrap_err(),
                },
                RejectedRow {
                    source: "upload.csv".to_string(),
                    error: LedgerError::validation(None, vec![FieldError::MissingSource]),
                },
            ]
        );
    }

    #[test]
    fn test_padded_id_cannot_slip_past_dedup() {
        let b = SourceRows::from_records("b", vec![record("X", datetime!(2025-03-02 09:00), 20, "Mike")]);
        let c = SourceRows::from_records("c", vec![record(" X", datetime!(2025-03-05 15:00), 99, "Tony")]);

        let outcome = merge(vec![b, c]);

        assert_eq!(ids(&outcome), vec!["X"]);
        assert_eq!(
            outcome.rejected,
            vec![RejectedRow {
                source: "c".to_string(),
                error: LedgerError::validation(None, vec![FieldError::UntrimmedText { column: "ID" }]),
            }]
        );
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert_eq!(merge(vec![]), MergeOutcome::default());
    }

    #[test]
    fn test_consolidate_keeps_committed_records_first() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::new(dir.path().join("shop_data.csv"));
        store
            .replace(&[record("r1", datetime!(2025-03-01 09:00), 10, "David")])
            .unwrap();
        let upload = SourceRows::from_records(
            "upload.csv",
            vec![
                record("r1", datetime!(2025-03-01 09:00), 999, "Imposter"),
                record("r2", datetime!(2025-03-02 09:00), 20, "Mike"),
            ],
        );

        let outcome = consolidate(&store, vec![upload]).unwrap();

        let committed = store.read_all().unwrap();
        assert_eq!(committed, outcome.records);
        assert_eq!(committed.len(), 2);
        assert_eq!(committed[0].barber, "David");
        assert!(outcome.dropped_duplicate_ids.contains("r1"));
        assert_eq!(store.read_backup().unwrap().len(), 1);
    }

    #[test]
    fn test_consolidate_aborts_when_store_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop_data.csv");
        std::fs::write(&path, "ID,Cost\nr1,10\n").unwrap();
        let store = LedgerStore::new(&path);

        let result = consolidate(&store, vec![]);

        assert!(matches!(result, Err(LedgerError::MissingColumns { .. })));
        assert!(!store.backup_path().exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ID,Cost\nr1,10\n");
    }
}
