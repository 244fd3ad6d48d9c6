//! # Reconciliation Engine
//!
//! Two phases: both sources are ingested into an [`IdentifierIndex`] (privacy
//! form first, survey second), then every identifier is classified in one
//! pass over the index. Classification is a pure function of the final index
//! state, which makes it the natural place to test the decision table.

use crate::error::Result;
use crate::reconcile::index::{IdentifierIndex, UnprocessedEntry};
use crate::reconcile::record::{PrivacyFormRecord, SurveyRecord};
use chrono::{DateTime, Utc};
use common::model::stats::JobStats;
use common::model::status::Status;
use log::{debug, warn};

/// Statuses of all identifiers, aligned with [`IdentifierIndex::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub statuses: Vec<Status>,
    pub stats: JobStats,
}

impl Classification {
    /// Status of the entry in `slot`.
    pub fn status(&self, slot: usize) -> Status {
        self.statuses[slot]
    }
}

/// Derives the status of one entry.
pub fn classify_entry(entry: &UnprocessedEntry) -> Status {
    Status::decide(
        entry.privacy_form_rows.len(),
        entry.survey_rows.len(),
        entry.consent,
    )
}

/// Classifies every identifier in insertion order and fills the counters.
///
/// The totals are taken over from the index; only the per-status counters are
/// computed here.
pub fn classify(index: &IdentifierIndex, timestamp: DateTime<Utc>) -> Classification {
    let mut stats = JobStats::new(timestamp);
    stats.total_entries = index.total_entries();
    stats.total_unique_identifiers = index.len();
    stats.total_duplicates = index.total_duplicates();

    let statuses: Vec<Status> = index
        .entries()
        .iter()
        .map(|entry| {
            let status = classify_entry(entry);
            if status == Status::ErrorInvalid {
                warn!("Identifier {:?} has no occurrence in either source", entry.identifier);
            }
            stats.record(status);
            status
        })
        .collect();

    debug_assert_eq!(stats.classified(), stats.total_unique_identifiers);
    Classification { statuses, stats }
}

/// Final state of a reconciliation: the filled index and its classification.
#[derive(Debug)]
pub struct Reconciliation {
    pub index: IdentifierIndex,
    pub classification: Classification,
}

impl Reconciliation {
    /// Counters of this run.
    pub fn stats(&self) -> &JobStats {
        &self.classification.stats
    }

    /// Entries paired with their status, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&UnprocessedEntry, Status)> {
        self.index
            .entries()
            .iter()
            .zip(self.classification.statuses.iter().copied())
    }

    /// Status of `identifier`, or `None` if neither source contains it.
    pub fn status_of(&self, identifier: &str) -> Option<Status> {
        self.index
            .position(identifier)
            .map(|slot| self.classification.status(slot))
    }
}

/// Runs ingestion and classification over already validated records.
pub fn reconcile<P, S>(privacy_form: P, survey: S) -> Result<Reconciliation>
where
    P: IntoIterator<Item = PrivacyFormRecord>,
    S: IntoIterator<Item = SurveyRecord>,
{
    reconcile_at(privacy_form, survey, Utc::now())
}

/// Like [`reconcile`], with an explicit run timestamp.
pub fn reconcile_at<P, S>(privacy_form: P, survey: S, timestamp: DateTime<Utc>) -> Result<Reconciliation>
where
    P: IntoIterator<Item = PrivacyFormRecord>,
    S: IntoIterator<Item = SurveyRecord>,
{
    let mut index = IdentifierIndex::new();
    index.ingest_privacy_form(privacy_form)?;
    index.ingest_survey(survey)?;
    debug!(
        "Indexed {} identifiers from {} rows",
        index.len(),
        index.total_entries()
    );

    let classification = classify(&index, timestamp);
    Ok(Reconciliation {
        index,
        classification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::record::Passthrough;

    fn pf(identifier: &str, consent: bool, row: usize) -> PrivacyFormRecord {
        PrivacyFormRecord {
            identifier: identifier.to_string(),
            consent,
            row,
        }
    }

    fn survey(identifier: &str, row: usize) -> SurveyRecord {
        SurveyRecord {
            identifier: identifier.to_string(),
            passthrough: Passthrough::new(),
            row,
        }
    }

    #[test]
    fn classifies_every_status() {
        let result = reconcile(
            vec![pf("valid", true, 0), pf("declined", false, 1), pf("pf-only", true, 2)],
            vec![survey("valid", 0), survey("declined", 1), survey("survey-only", 2)],
        )
        .unwrap();

        assert_eq!(result.status_of("valid"), Some(Status::OkValid));
        assert_eq!(result.status_of("declined"), Some(Status::ErrorNoConsent));
        assert_eq!(result.status_of("pf-only"), Some(Status::ErrorOnlyPrivacyForm));
        assert_eq!(result.status_of("survey-only"), Some(Status::ErrorOnlySurvey));
        assert_eq!(result.status_of("unknown"), None);

        let stats = result.stats();
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.no_consent, 1);
        assert_eq!(stats.only_privacy_form, 1);
        assert_eq!(stats.only_survey, 1);
        assert_eq!(stats.invalid, 0);
        assert_eq!(stats.total_unique_identifiers, 4);
        assert_eq!(stats.classified(), stats.total_unique_identifiers);
    }

    #[test]
    fn privacy_form_only_has_no_survey_rows() {
        let result = reconcile(vec![pf("A", true, 0)], Vec::<SurveyRecord>::new()).unwrap();
        let (entry, status) = result.entries().next().unwrap();
        assert_eq!(status, Status::ErrorOnlyPrivacyForm);
        assert!(entry.survey_rows.is_empty());
    }

    #[test]
    fn later_withdrawal_overrides_consent() {
        let result = reconcile(
            vec![pf("X", false, 0), pf("X", true, 1), pf("X", false, 2)],
            vec![survey("X", 0)],
        )
        .unwrap();
        assert_eq!(result.status_of("X"), Some(Status::ErrorNoConsent));
        assert_eq!(result.index.get("X").unwrap().index_used_for_consent, Some(2));
    }

    #[test]
    fn repeated_identifier_in_one_source() {
        let result = reconcile(Vec::<PrivacyFormRecord>::new(), (0..6).map(|row| survey("S", row))).unwrap();
        let stats = result.stats();
        assert_eq!(stats.total_duplicates, 5);
        assert_eq!(stats.total_entries, 6);
        assert_eq!(stats.total_unique_identifiers, 1);
    }

    #[test]
    fn classification_is_deterministic() {
        let ts = Utc::now();
        let run = || {
            reconcile_at(
                vec![pf("B", true, 0), pf("A", false, 1), pf("B", false, 2)],
                vec![survey("C", 0), survey("A", 1), survey("B", 2)],
                ts,
            )
            .unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.classification, second.classification);
        assert_eq!(first.index.entries(), second.index.entries());
    }

    #[test]
    fn empty_inputs_produce_empty_stats() {
        let result = reconcile(Vec::<PrivacyFormRecord>::new(), Vec::<SurveyRecord>::new()).unwrap();
        assert_eq!(result.stats().total_unique_identifiers, 0);
        assert_eq!(result.stats().total_entries, 0);
        assert!(result.classification.statuses.is_empty());
    }
}
