use crate::model::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters of a single reconciliation run.
///
/// The totals are filled while the sources are ingested, the per-status
/// counters during classification. Once classification has finished the
/// value is only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub timestamp: DateTime<Utc>,
    /// Accepted rows of both sources. Blank and rejected rows are not counted.
    pub total_entries: usize,
    pub total_unique_identifiers: usize,
    /// Repeated occurrences of an identifier within the same source.
    pub total_duplicates: usize,
    pub valid: usize,
    pub no_consent: usize,
    pub only_privacy_form: usize,
    pub only_survey: usize,
    pub invalid: usize,
}

impl JobStats {
    /// All counters at zero.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total_entries: 0,
            total_unique_identifiers: 0,
            total_duplicates: 0,
            valid: 0,
            no_consent: 0,
            only_privacy_form: 0,
            only_survey: 0,
            invalid: 0,
        }
    }

    /// Counts one identifier with `status`.
    pub fn record(&mut self, status: Status) {
        match status {
            Status::OkValid => self.valid += 1,
            Status::ErrorNoConsent => self.no_consent += 1,
            Status::ErrorOnlyPrivacyForm => self.only_privacy_form += 1,
            Status::ErrorOnlySurvey => self.only_survey += 1,
            Status::ErrorInvalid => self.invalid += 1,
        }
    }

    /// Identifiers counted with `status`.
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::OkValid => self.valid,
            Status::ErrorNoConsent => self.no_consent,
            Status::ErrorOnlyPrivacyForm => self.only_privacy_form,
            Status::ErrorOnlySurvey => self.only_survey,
            Status::ErrorInvalid => self.invalid,
        }
    }

    /// Sum of all per-status counters. Equals `total_unique_identifiers` after classification.
    pub fn classified(&self) -> usize {
        Status::ALL.iter().map(|s| self.count(*s)).sum()
    }
}
