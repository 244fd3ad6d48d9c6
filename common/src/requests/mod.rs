use crate::model::csv::ColumnRef;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
/// Request payload for the header discovery endpoint.
/// Names the two source files and the delimiter used to split their header rows.
pub struct InspectHeadersRequest {
    pub privacy_form_file_path: String,
    pub survey_file_path: String,
    #[serde(default)]
    pub separator: Option<String>,
}

/// Everything needed to run one reconciliation job.
///
/// Optional fields fall back to the server's configured defaults.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StartReconcileRequest {
    pub privacy_form_file_path: String,
    pub survey_file_path: String,
    pub output_directory_path: String,
    /// Single character delimiter shared by inputs and outputs.
    #[serde(default)]
    pub separator: Option<String>,
    pub privacy_form_identifier_column: ColumnRef,
    pub privacy_form_consent_column: ColumnRef,
    pub survey_identifier_column: ColumnRef,
    /// The exact cell value that counts as consent.
    #[serde(default)]
    pub consent_literal: Option<String>,
    /// Optional regular expression every identifier must match.
    #[serde(default)]
    pub identifier_pattern: Option<String>,
    #[serde(default)]
    pub replace_newlines: bool,
    /// Whether blank and unparsable rows are listed in the commented files.
    #[serde(default)]
    pub report_rejected_rows: Option<bool>,
}
