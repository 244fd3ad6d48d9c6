//! # Output Projector
//!
//! Turns a finished [`Reconciliation`] into the four output tables:
//!
//! - the ledger of all identifiers (one row per identifier),
//! - the ledger of valid identifiers (one row per `OK_VALID` identifier),
//! - the commented privacy form and the commented survey (one row per
//!   original input row, annotated with how that row was resolved).
//!
//! Projection is pure; writing is up to a `TableWriter`.

use crate::reconcile::engine::Reconciliation;
use crate::reconcile::index::UnprocessedEntry;
use crate::reconcile::record::{PrivacyFormRecord, SurveyRecord};
use crate::reconcile::validator::RowOutcome;
use crate::table_io::Table;
use common::model::status::Status;

pub const COL_IDENTIFIER: &str = "identifier";
pub const COL_STATUS: &str = "status";
pub const COL_STATUS_VISUALIZATION: &str = "statusVisualization";
pub const COL_CONSENT: &str = "consent";
pub const COL_INDEX_USED_FOR_CONSENT: &str = "indexUsedForConsent";
pub const COL_INDICES_IN_PRIVACY_FORM: &str = "indicesInPrivacyForm";
pub const COL_INDICES_IN_SURVEY: &str = "indicesInSurvey";
pub const COL_DUPLICATES_IN_PRIVACY_FORM: &str = "numberOfDuplicatesInPrivacyForm";
pub const COL_DUPLICATES_IN_SURVEY: &str = "numberOfDuplicatesInSurvey";
pub const COL_CONSENT_GIVEN: &str = "consentGiven";
pub const COL_MOST_RECENT_OCCURRENCE: &str = "mostRecentOccurrence";
pub const COL_REMARK: &str = "remark";

/// Marker for a row that is the last occurrence of its identifier.
pub const THIS_OCCURRENCE: &str = "this";
/// Status of rows whose identifier cell is empty.
pub const STATUS_IGNORED_EMPTY_IDENTIFIER: &str = "IGNORED_EMPTY_IDENTIFIER";
/// Status of rows that failed validation.
pub const STATUS_UNPARSABLE: &str = "ERROR_UNPARSABLE";

/// Prefix for privacy form columns whose title is taken by an output column.
pub const PRIVACY_FORM_PREFIX: &str = "privacyForm";
/// Prefix for survey columns whose title is taken by an output column.
pub const SURVEY_PREFIX: &str = "survey";

/// What to do with blank and rejected rows in the commented files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentOptions {
    /// List them with a dedicated status. When off they are left out.
    pub report_rejected_rows: bool,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            report_rejected_rows: true,
        }
    }
}

fn bool_cell(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

fn rows_cell(rows: &[usize]) -> String {
    let joined: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
    format!("[{}]", joined.join(","))
}

/// `title`, prefixed with `prefix.` as often as needed to be absent from `taken`.
fn distinct_title(title: &str, prefix: &str, taken: &[String]) -> String {
    let mut candidate = title.to_string();
    while taken.contains(&candidate) {
        candidate = format!("{}.{}", prefix, candidate);
    }
    candidate
}

fn ledger_columns(with_status: bool) -> Vec<String> {
    let mut headers = vec![COL_IDENTIFIER.to_string()];
    if with_status {
        headers.push(COL_STATUS.to_string());
        headers.push(COL_STATUS_VISUALIZATION.to_string());
    }
    headers.extend(
        [
            COL_CONSENT,
            COL_INDEX_USED_FOR_CONSENT,
            COL_INDICES_IN_PRIVACY_FORM,
            COL_INDICES_IN_SURVEY,
            COL_DUPLICATES_IN_PRIVACY_FORM,
            COL_DUPLICATES_IN_SURVEY,
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    headers
}

/// Ledger titles of the passthrough columns. A survey column named like a
/// ledger column gets the `survey.` prefix, in both ledgers alike.
fn passthrough_titles(passthrough_keys: &[String]) -> Vec<String> {
    let mut taken = ledger_columns(true);
    let mut titles = Vec::with_capacity(passthrough_keys.len());
    for key in passthrough_keys {
        let title = distinct_title(key, SURVEY_PREFIX, &taken);
        taken.push(title.clone());
        titles.push(title);
    }
    titles
}

fn ledger_headers(with_status: bool, passthrough_keys: &[String]) -> Vec<String> {
    let mut headers = ledger_columns(with_status);
    headers.extend(passthrough_titles(passthrough_keys));
    headers
}

/// Original headers followed by the annotation columns. Original titles
/// that equal an annotation column are prefixed with `prefix.`.
fn commented_headers(original: &[String], annotations: &[&str], prefix: &str) -> Vec<String> {
    let mut taken: Vec<String> = original.to_vec();
    taken.extend(annotations.iter().map(|c| c.to_string()));

    let mut headers = Vec::with_capacity(original.len() + annotations.len());
    for title in original {
        if annotations.contains(&title.as_str()) {
            let renamed = distinct_title(title, prefix, &taken);
            taken.push(renamed.clone());
            headers.push(renamed);
        } else {
            headers.push(title.clone());
        }
    }
    headers.extend(annotations.iter().map(|c| c.to_string()));
    headers
}

fn ledger_row(
    entry: &UnprocessedEntry,
    status: Option<Status>,
    passthrough_keys: &[String],
) -> Vec<String> {
    let mut row = vec![entry.identifier.clone()];
    if let Some(status) = status {
        row.push(status.to_string());
        row.push(status.visualization().to_string());
    }
    row.push(bool_cell(entry.consent));
    row.push(
        entry
            .index_used_for_consent
            .map(|r| r.to_string())
            .unwrap_or_default(),
    );
    row.push(rows_cell(&entry.privacy_form_rows));
    row.push(rows_cell(&entry.survey_rows));
    row.push(entry.duplicates_in_privacy_form().to_string());
    row.push(entry.duplicates_in_survey().to_string());
    for key in passthrough_keys {
        let value = entry
            .passthrough
            .as_ref()
            .and_then(|p| p.get(key))
            .unwrap_or("");
        row.push(value.to_string());
    }
    row
}

/// Ledger of every identifier with its status, in first-seen order.
///
/// Passthrough columns carry the values of the identifier's last survey row.
pub fn all_identifiers(result: &Reconciliation, passthrough_keys: &[String]) -> Table {
    let mut table = Table::new(ledger_headers(true, passthrough_keys));
    for (entry, status) in result.entries() {
        table.push(ledger_row(entry, Some(status), passthrough_keys));
    }
    table
}

/// Ledger restricted to `OK_VALID` identifiers, without the status columns.
pub fn valid_identifiers(result: &Reconciliation, passthrough_keys: &[String]) -> Table {
    let mut table = Table::new(ledger_headers(false, passthrough_keys));
    for (entry, status) in result.entries() {
        if status.is_valid() {
            table.push(ledger_row(entry, None, passthrough_keys));
        }
    }
    table
}

fn most_recent_marker(row: usize, last: Option<usize>) -> String {
    match last {
        Some(last) if last == row => THIS_OCCURRENCE.to_string(),
        Some(last) => last.to_string(),
        None => String::new(),
    }
}

/// Copies the original cells, padded or cut to the header width.
fn original_cells(cells: &[String], width: usize) -> Vec<String> {
    let mut out: Vec<String> = cells.iter().take(width).cloned().collect();
    out.resize(width, String::new());
    out
}

/// Annotation columns of one commented row, in output order after the
/// original cells: status, most recent occurrence, remark.
struct Annotation {
    status: String,
    most_recent: String,
    remark: String,
}

impl Annotation {
    fn skipped<T>(outcome: &RowOutcome<T>) -> Option<Self> {
        match outcome {
            RowOutcome::Accepted(_) => None,
            RowOutcome::Blank => Some(Self {
                status: STATUS_IGNORED_EMPTY_IDENTIFIER.to_string(),
                most_recent: String::new(),
                remark: "empty identifier".to_string(),
            }),
            RowOutcome::Rejected(rejection) => Some(Self {
                status: STATUS_UNPARSABLE.to_string(),
                most_recent: String::new(),
                remark: rejection.to_string(),
            }),
        }
    }

    fn resolved(
        result: &Reconciliation,
        identifier: &str,
        row: usize,
        last: fn(&UnprocessedEntry) -> Option<usize>,
    ) -> Self {
        let entry = result.index.get(identifier);
        Self {
            status: result
                .status_of(identifier)
                .unwrap_or(Status::ErrorInvalid)
                .to_string(),
            most_recent: most_recent_marker(row, entry.and_then(last)),
            remark: String::new(),
        }
    }
}

/// Every privacy form row with its identifier's final status.
///
/// `outcomes` must be the validation outcomes of `source.rows`, in order.
pub fn commented_privacy_form(
    result: &Reconciliation,
    source: &Table,
    outcomes: &[RowOutcome<PrivacyFormRecord>],
    options: CommentOptions,
) -> Table {
    let width = source.headers.len();
    let mut table = Table::new(commented_headers(
        &source.headers,
        &[COL_STATUS, COL_MOST_RECENT_OCCURRENCE, COL_REMARK, COL_CONSENT_GIVEN],
        PRIVACY_FORM_PREFIX,
    ));

    for (row, (cells, outcome)) in source.rows.iter().zip(outcomes).enumerate() {
        let (annotation, consent) = match outcome {
            RowOutcome::Accepted(record) => (
                Annotation::resolved(
                    result,
                    &record.identifier,
                    row,
                    UnprocessedEntry::last_privacy_form_row,
                ),
                bool_cell(record.consent),
            ),
            skipped => {
                if !options.report_rejected_rows {
                    continue;
                }
                match Annotation::skipped(skipped) {
                    Some(annotation) => (annotation, String::new()),
                    None => continue,
                }
            }
        };

        let mut out = original_cells(cells, width);
        out.push(annotation.status);
        out.push(annotation.most_recent);
        out.push(annotation.remark);
        out.push(consent);
        table.push(out);
    }
    table
}

/// Every survey row with its identifier's final status.
///
/// `outcomes` must be the validation outcomes of `source.rows`, in order.
pub fn commented_survey(
    result: &Reconciliation,
    source: &Table,
    outcomes: &[RowOutcome<SurveyRecord>],
    options: CommentOptions,
) -> Table {
    let width = source.headers.len();
    let mut table = Table::new(commented_headers(
        &source.headers,
        &[COL_STATUS, COL_MOST_RECENT_OCCURRENCE, COL_REMARK],
        SURVEY_PREFIX,
    ));

    for (row, (cells, outcome)) in source.rows.iter().zip(outcomes).enumerate() {
        let annotation = match outcome {
            RowOutcome::Accepted(record) => Annotation::resolved(
                result,
                &record.identifier,
                row,
                UnprocessedEntry::last_survey_row,
            ),
            skipped => {
                if !options.report_rejected_rows {
                    continue;
                }
                match Annotation::skipped(skipped) {
                    Some(annotation) => annotation,
                    None => continue,
                }
            }
        };

        let mut out = original_cells(cells, width);
        out.push(annotation.status);
        out.push(annotation.most_recent);
        out.push(annotation.remark);
        table.push(out);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::engine::reconcile;
    use crate::reconcile::record::Passthrough;
    use crate::reconcile::validator::RowRejection;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn pf(identifier: &str, consent: bool, row: usize) -> PrivacyFormRecord {
        PrivacyFormRecord {
            identifier: identifier.to_string(),
            consent,
            row,
        }
    }

    fn survey(identifier: &str, foo: &str, row: usize) -> SurveyRecord {
        let mut passthrough = Passthrough::new();
        passthrough.insert("foo", foo);
        SurveyRecord {
            identifier: identifier.to_string(),
            passthrough,
            row,
        }
    }

    fn sample() -> Reconciliation {
        reconcile(
            vec![pf("A", true, 0), pf("C", false, 1), pf("A", true, 2)],
            vec![survey("A", "bar", 0), survey("B", "baz", 1), survey("C", "qux", 2)],
        )
        .unwrap()
    }

    #[test]
    fn all_ledger_lists_every_identifier() {
        let table = all_identifiers(&sample(), &strings(&["foo"]));
        assert_eq!(
            table.headers,
            strings(&[
                "identifier",
                "status",
                "statusVisualization",
                "consent",
                "indexUsedForConsent",
                "indicesInPrivacyForm",
                "indicesInSurvey",
                "numberOfDuplicatesInPrivacyForm",
                "numberOfDuplicatesInSurvey",
                "foo",
            ])
        );
        assert_eq!(
            table.rows[0],
            strings(&["A", "OK_VALID", "P+S", "true", "2", "[0,2]", "[0]", "1", "0", "bar"])
        );
        assert_eq!(
            table.rows[1],
            strings(&["C", "ERROR_NO_CONSENT", "P+S", "false", "1", "[1]", "[2]", "0", "0", "qux"])
        );
        assert_eq!(
            table.rows[2],
            strings(&["B", "ERROR_ONLY_SURVEY", "S", "false", "", "[]", "[1]", "0", "0", "baz"])
        );
    }

    #[test]
    fn valid_ledger_drops_status_columns() {
        let table = valid_identifiers(&sample(), &strings(&["foo"]));
        assert!(!table.headers.contains(&"status".to_string()));
        assert!(!table.headers.contains(&"statusVisualization".to_string()));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.column("identifier").unwrap(), vec!["A"]);
        assert_eq!(table.column("foo").unwrap(), vec!["bar"]);
    }

    #[test]
    fn commented_privacy_form_marks_most_recent_occurrence() {
        let result = sample();
        let source = Table {
            headers: strings(&["code", "answer"]),
            rows: vec![
                strings(&["A", "YES"]),
                strings(&["C", "NO"]),
                strings(&["A", "YES"]),
            ],
        };
        let outcomes: Vec<_> = vec![pf("A", true, 0), pf("C", false, 1), pf("A", true, 2)]
            .into_iter()
            .map(RowOutcome::Accepted)
            .collect();

        let table = commented_privacy_form(&result, &source, &outcomes, CommentOptions::default());
        assert_eq!(
            table.headers,
            strings(&["code", "answer", "status", "mostRecentOccurrence", "remark", "consentGiven"])
        );
        assert_eq!(table.rows[0], strings(&["A", "YES", "OK_VALID", "2", "", "true"]));
        assert_eq!(table.rows[1], strings(&["C", "NO", "ERROR_NO_CONSENT", "this", "", "false"]));
        assert_eq!(table.rows[2], strings(&["A", "YES", "OK_VALID", "this", "", "true"]));
    }

    #[test]
    fn commented_survey_reports_skipped_rows() {
        let result = reconcile(
            vec![pf("A", true, 0)],
            vec![survey("A", "bar", 0), survey("A", "baz", 3)],
        )
        .unwrap();
        let source = Table {
            headers: strings(&["code", "foo"]),
            rows: vec![
                strings(&["A", "bar"]),
                strings(&["", "nobody"]),
                strings(&[]),
                strings(&["A", "baz"]),
            ],
        };
        let outcomes = vec![
            RowOutcome::Accepted(survey("A", "bar", 0)),
            RowOutcome::Blank,
            RowOutcome::Rejected(RowRejection::MissingCell {
                column: 0,
                found: 0,
            }),
            RowOutcome::Accepted(survey("A", "baz", 3)),
        ];

        let table = commented_survey(&result, &source, &outcomes, CommentOptions::default());
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0], strings(&["A", "bar", "OK_VALID", "3", ""]));
        assert_eq!(
            table.rows[1],
            strings(&["", "nobody", "IGNORED_EMPTY_IDENTIFIER", "", "empty identifier"])
        );
        assert_eq!(
            table.rows[2],
            strings(&["", "", "ERROR_UNPARSABLE", "", "no cell for column 0, row has 0 fields"])
        );
        assert_eq!(table.rows[3], strings(&["A", "baz", "OK_VALID", "this", ""]));

        let quiet = commented_survey(
            &result,
            &source,
            &outcomes,
            CommentOptions {
                report_rejected_rows: false,
            },
        );
        assert_eq!(quiet.column("code").unwrap(), vec!["A", "A"]);
    }

    #[test]
    fn survey_columns_named_like_ledger_columns_are_prefixed() {
        let keys = strings(&["status", "consent", "survey.status", "foo"]);
        let table = all_identifiers(&sample(), &keys);
        assert_eq!(
            table.headers[9..].to_vec(),
            strings(&["survey.status", "survey.consent", "survey.survey.status", "foo"])
        );
        assert_eq!(
            table.column("status").unwrap(),
            vec!["OK_VALID", "ERROR_NO_CONSENT", "ERROR_ONLY_SURVEY"]
        );

        let valid = valid_identifiers(&sample(), &keys);
        assert!(valid.headers.contains(&"survey.status".to_string()));
        let mut unique = valid.headers.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), valid.headers.len());
    }

    #[test]
    fn source_columns_named_like_annotations_are_prefixed() {
        let result = reconcile(Vec::<PrivacyFormRecord>::new(), vec![survey("A", "bar", 0)]).unwrap();
        let source = Table {
            headers: strings(&["code", "status", "remark"]),
            rows: vec![strings(&["A", "done", "note"])],
        };
        let outcomes = vec![RowOutcome::Accepted(survey("A", "bar", 0))];

        let table = commented_survey(&result, &source, &outcomes, CommentOptions::default());
        assert_eq!(
            table.headers,
            strings(&["code", "survey.status", "survey.remark", "status", "mostRecentOccurrence", "remark"])
        );
        assert_eq!(table.column("status").unwrap(), vec!["ERROR_ONLY_SURVEY"]);
        assert_eq!(table.column("survey.status").unwrap(), vec!["done"]);

        let pf_source = Table {
            headers: strings(&["code", "consentGiven"]),
            rows: vec![strings(&["A", "JA"])],
        };
        let pf_result = reconcile(vec![pf("A", true, 0)], Vec::<SurveyRecord>::new()).unwrap();
        let pf_table = commented_privacy_form(
            &pf_result,
            &pf_source,
            &[RowOutcome::Accepted(pf("A", true, 0))],
            CommentOptions::default(),
        );
        assert_eq!(pf_table.headers[1], "privacyForm.consentGiven");
        assert_eq!(pf_table.column("consentGiven").unwrap(), vec!["true"]);
    }
}
