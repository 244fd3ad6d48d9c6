use crate::model::datasource::SourceKind;
use crate::model::stats::JobStats;
use serde::{Deserialize, Serialize};

/// Outcome of a finished reconciliation job.
///
/// This is the payload of `JobStatus::Completed` and the JSON printed by
/// `psmatch run`. It bundles the run statistics with the per-source row
/// accounting and the list of files that were written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    /// Counters computed by the reconciliation engine.
    pub stats: JobStats,
    /// How the rows of the privacy form file were handled.
    pub privacy_form: RowReport,
    /// How the rows of the survey file were handled.
    pub survey: RowReport,
    /// The output tables, in the order they were written.
    pub outputs: Vec<OutputFile>,
}

/// Row accounting for one source file.
///
/// Every data row ends up in exactly one bucket, so
/// `rows == accepted + blank + rejected` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowReport {
    pub source: SourceKind,
    /// File name of the source, without its directory.
    pub file_name: String,
    /// Number of data rows (header excluded).
    pub rows: usize,
    /// Rows that took part in the reconciliation.
    pub accepted: usize,
    /// Rows with an empty identifier. They are ignored, not treated as errors.
    pub blank: usize,
    /// Rows that failed validation, e.g. a missing cell or a malformed identifier.
    pub rejected: usize,
}

impl RowReport {
    /// A report with every counter at zero.
    pub fn new(source: SourceKind, file_name: impl Into<String>) -> Self {
        Self {
            source,
            file_name: file_name.into(),
            rows: 0,
            accepted: 0,
            blank: 0,
            rejected: 0,
        }
    }
}

/// Which of the four output tables a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKind {
    /// One row per identifier, every status.
    AllIdentifiers,
    /// One row per identifier with status `OK_VALID`.
    ValidIdentifiers,
    /// Every privacy form row annotated with its resolution.
    CommentedPrivacyForm,
    /// Every survey row annotated with its resolution.
    CommentedSurvey,
}

/// A file produced by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub kind: OutputKind,
    pub path: String,
    /// Data rows written (header excluded).
    pub rows: usize,
}
