//! # Reconciliation Job
//!
//! A [`ReconcileJob`] is a fully validated [`StartReconcileRequest`]: paths,
//! delimiter, column mapping and options are checked once, up front, so that
//! [`ReconcileJob::run`] only fails on problems with the data itself.
//!
//! ## Workflow
//!
//! 1.  **Reading**: both sources are read concurrently through a `TableReader`.
//! 2.  **Validating**: the column mapping is resolved against the header rows
//!     and every data row is turned into a record, a blank row or a rejection.
//! 3.  **Reconciling**: accepted records are indexed and classified.
//! 4.  **Writing**: the four output tables are projected, cleaned up for
//!     presentation and handed to a `TableWriter` in one batch.
//!
//! Progress is reported through a callback after each stage change, which
//! lets the HTTP layer forward it to the job controller and the CLI ignore it.

use crate::config::{compile_pattern, parse_delimiter, JobDefaults};
use crate::error::{ReconcileError, Result};
use crate::reconcile::columns::{PrivacyFormColumns, SurveyColumns};
use crate::reconcile::consent::ConsentInterpretation;
use crate::reconcile::engine::reconcile_at;
use crate::reconcile::presentation::PresentationOptions;
use crate::reconcile::projector::{self, CommentOptions};
use crate::reconcile::validator::{RecordValidator, RowOutcome};
use crate::table_io::{NamedTable, Table, TableReader, TableRequest, TableWriter};
use chrono::Utc;
use common::model::csv::{ColumnRef, SourceHeaders};
use common::model::datasource::SourceKind;
use common::model::reconcile::{JobReport, OutputKind, RowReport};
use common::requests::{InspectHeadersRequest, StartReconcileRequest};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Ledger of every identifier.
pub const ALL_IDENTIFIERS_FILE: &str = "StudyCodes_all.csv";
/// Ledger of `OK_VALID` identifiers only.
pub const VALID_IDENTIFIERS_FILE: &str = "StudyCodes_valid.csv";
/// Appended to a source's file stem to name its commented copy.
pub const COMMENTED_SUFFIX: &str = "_commented.csv";

/// Stages of a running job, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Reading,
    Validating,
    Reconciling,
    Writing,
}

impl JobStage {
    /// Completion percentage reported when the stage starts.
    pub fn percent(self) -> u32 {
        match self {
            JobStage::Reading => 5,
            JobStage::Validating => 30,
            JobStage::Reconciling => 55,
            JobStage::Writing => 80,
        }
    }
}

/// Column mapping of both sources as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub privacy_form_identifier: ColumnRef,
    pub privacy_form_consent: ColumnRef,
    pub survey_identifier: ColumnRef,
}

/// Destinations of the four output tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub all_identifiers: PathBuf,
    pub valid_identifiers: PathBuf,
    pub commented_privacy_form: PathBuf,
    pub commented_survey: PathBuf,
}

impl OutputPaths {
    /// Paths inside `dir`. The commented files are named after their source.
    ///
    /// Fails if two outputs share a path or an output would overwrite one of
    /// the sources.
    pub fn new(dir: &Path, privacy_form: &Path, survey: &Path) -> Result<Self> {
        let paths = Self {
            all_identifiers: dir.join(ALL_IDENTIFIERS_FILE),
            valid_identifiers: dir.join(VALID_IDENTIFIERS_FILE),
            commented_privacy_form: dir.join(commented_name(privacy_form)),
            commented_survey: dir.join(commented_name(survey)),
        };
        let outputs: Vec<PathBuf> = [
            &paths.all_identifiers,
            &paths.valid_identifiers,
            &paths.commented_privacy_form,
            &paths.commented_survey,
        ]
        .into_iter()
        .map(|p| comparable(p))
        .collect();
        let sources = [comparable(privacy_form), comparable(survey)];

        for (i, path) in outputs.iter().enumerate() {
            if outputs[i + 1..].contains(path) {
                return Err(ReconcileError::InvalidRequest(format!(
                    "two outputs would be written to {}",
                    path.display()
                )));
            }
            if sources.contains(path) {
                return Err(ReconcileError::InvalidRequest(format!(
                    "output {} would overwrite a source file",
                    path.display()
                )));
            }
        }
        Ok(paths)
    }
}

/// `path` with its directory resolved, so that differently spelled paths to
/// the same file compare equal. The file itself need not exist.
fn comparable(path: &Path) -> PathBuf {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match (fs::canonicalize(dir), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn commented_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, COMMENTED_SUFFIX)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn required_path(raw: &str, what: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ReconcileError::InvalidRequest(format!("{} is missing", what)));
    }
    Ok(PathBuf::from(raw))
}

fn delimiter_or_default(separator: Option<&str>, defaults: &JobDefaults) -> Result<u8> {
    match separator {
        Some(raw) => parse_delimiter(raw).map_err(ReconcileError::InvalidRequest),
        None => Ok(defaults.delimiter),
    }
}

/// A validated reconciliation request, ready to run.
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    pub privacy_form: PathBuf,
    pub survey: PathBuf,
    pub delimiter: u8,
    pub columns: ColumnMapping,
    pub validator: RecordValidator,
    pub presentation: PresentationOptions,
    pub comments: CommentOptions,
    pub outputs: OutputPaths,
}

impl ReconcileJob {
    /// Validates a request and fills unset options from `defaults`.
    ///
    /// Only the request is checked here. The files are opened by [`run`](Self::run).
    pub fn from_request(req: StartReconcileRequest, defaults: &JobDefaults) -> Result<Self> {
        let privacy_form = required_path(&req.privacy_form_file_path, "privacy form file path")?;
        let survey = required_path(&req.survey_file_path, "survey file path")?;
        let output_dir = required_path(&req.output_directory_path, "output directory path")?;
        if !output_dir.is_dir() {
            return Err(ReconcileError::InvalidRequest(format!(
                "output directory {} does not exist",
                output_dir.display()
            )));
        }

        let delimiter = delimiter_or_default(req.separator.as_deref(), defaults)?;
        let identifier_pattern = match req.identifier_pattern.as_deref() {
            Some("") => None,
            Some(raw) => Some(compile_pattern(raw).map_err(ReconcileError::InvalidRequest)?),
            None => defaults.identifier_pattern.clone(),
        };
        let consent = ConsentInterpretation::new(
            req.consent_literal
                .unwrap_or_else(|| defaults.consent_literal.clone()),
        );

        let outputs = OutputPaths::new(&output_dir, &privacy_form, &survey)?;

        Ok(Self {
            privacy_form,
            survey,
            delimiter,
            columns: ColumnMapping {
                privacy_form_identifier: req.privacy_form_identifier_column,
                privacy_form_consent: req.privacy_form_consent_column,
                survey_identifier: req.survey_identifier_column,
            },
            validator: RecordValidator::new(consent, identifier_pattern),
            presentation: PresentationOptions {
                replace_newlines: req.replace_newlines,
            },
            comments: CommentOptions {
                report_rejected_rows: req
                    .report_rejected_rows
                    .unwrap_or(defaults.report_rejected_rows),
            },
            outputs,
        })
    }

    fn request(&self, input: SourceKind) -> TableRequest {
        let path = match input {
            SourceKind::PrivacyForm => self.privacy_form.clone(),
            SourceKind::Survey => self.survey.clone(),
        };
        TableRequest {
            input,
            path,
            delimiter: self.delimiter,
        }
    }

    /// Resolves the column mapping against both header rows.
    pub fn resolve_columns(
        &self,
        privacy_form_headers: &[String],
        survey_headers: &[String],
    ) -> Result<(PrivacyFormColumns, SurveyColumns)> {
        let privacy_form = PrivacyFormColumns::resolve(
            privacy_form_headers,
            &self.columns.privacy_form_identifier,
            &self.columns.privacy_form_consent,
        )?;
        let survey = SurveyColumns::resolve(survey_headers, &self.columns.survey_identifier)?;
        Ok((privacy_form, survey))
    }

    /// Runs the job to completion. Nothing is written unless every step succeeds.
    pub fn run<R, W>(&self, reader: &R, writer: &W, mut progress: impl FnMut(JobStage)) -> Result<JobReport>
    where
        R: TableReader,
        W: TableWriter,
    {
        progress(JobStage::Reading);
        let pf_request = self.request(SourceKind::PrivacyForm);
        let survey_request = self.request(SourceKind::Survey);
        let (pf_table, survey_table) = rayon::join(
            || reader.read_table(&pf_request),
            || reader.read_table(&survey_request),
        );
        let (pf_table, survey_table) = (pf_table?, survey_table?);

        progress(JobStage::Validating);
        let (pf_columns, survey_columns) =
            self.resolve_columns(&pf_table.headers, &survey_table.headers)?;
        let pf_outcomes = self.validator.privacy_form_rows(&pf_table.rows, &pf_columns);
        let survey_outcomes = self.validator.survey_rows(&survey_table.rows, &survey_columns);
        let pf_report = row_report(SourceKind::PrivacyForm, &self.privacy_form, &pf_outcomes);
        let survey_report = row_report(SourceKind::Survey, &self.survey, &survey_outcomes);

        progress(JobStage::Reconciling);
        let result = reconcile_at(
            pf_outcomes.iter().filter_map(|o| o.accepted().cloned()),
            survey_outcomes.iter().filter_map(|o| o.accepted().cloned()),
            Utc::now(),
        )?;

        progress(JobStage::Writing);
        let keys = survey_columns.passthrough_keys();
        let tables = [
            (
                OutputKind::AllIdentifiers,
                &self.outputs.all_identifiers,
                projector::all_identifiers(&result, &keys),
            ),
            (
                OutputKind::ValidIdentifiers,
                &self.outputs.valid_identifiers,
                projector::valid_identifiers(&result, &keys),
            ),
            (
                OutputKind::CommentedPrivacyForm,
                &self.outputs.commented_privacy_form,
                projector::commented_privacy_form(&result, &pf_table, &pf_outcomes, self.comments),
            ),
            (
                OutputKind::CommentedSurvey,
                &self.outputs.commented_survey,
                projector::commented_survey(&result, &survey_table, &survey_outcomes, self.comments),
            ),
        ]
        .into_iter()
        .map(|(kind, path, table)| NamedTable {
            kind,
            path: path.clone(),
            table: self.presentation.apply(table),
        })
        .collect::<Vec<_>>();
        let outputs = writer.write_tables(&tables, self.delimiter)?;

        let stats = result.stats().clone();
        info!(
            "Reconciled {} identifiers from {} rows: {} valid, {} without consent, {} only in privacy form, {} only in survey, {} duplicates",
            stats.total_unique_identifiers,
            stats.total_entries,
            stats.valid,
            stats.no_consent,
            stats.only_privacy_form,
            stats.only_survey,
            stats.total_duplicates
        );

        Ok(JobReport {
            stats,
            privacy_form: pf_report,
            survey: survey_report,
            outputs,
        })
    }
}

fn row_report<T>(input: SourceKind, path: &Path, outcomes: &[RowOutcome<T>]) -> RowReport {
    let mut report = RowReport::new(input, file_name(path));
    report.rows = outcomes.len();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Accepted(_) => report.accepted += 1,
            RowOutcome::Blank => report.blank += 1,
            RowOutcome::Rejected(_) => report.rejected += 1,
        }
    }
    report
}

/// Reads the header rows of both sources, for choosing the column mapping.
pub fn inspect_headers<R: TableReader>(
    reader: &R,
    req: &InspectHeadersRequest,
    defaults: &JobDefaults,
) -> Result<SourceHeaders> {
    let delimiter = delimiter_or_default(req.separator.as_deref(), defaults)?;
    let request = |input, raw: &str, what| -> Result<TableRequest> {
        Ok(TableRequest {
            input,
            path: required_path(raw, what)?,
            delimiter,
        })
    };
    let pf = request(SourceKind::PrivacyForm, &req.privacy_form_file_path, "privacy form file path")?;
    let survey = request(SourceKind::Survey, &req.survey_file_path, "survey file path")?;

    Ok(SourceHeaders {
        privacy_form_file_headers: reader.read_headers(&pf)?,
        survey_file_headers: reader.read_headers(&survey)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_io::InMemoryTables;
    use common::model::status::Status;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn request(out: &Path) -> StartReconcileRequest {
        StartReconcileRequest {
            privacy_form_file_path: "privacy.csv".into(),
            survey_file_path: "survey.csv".into(),
            output_directory_path: out.display().to_string(),
            separator: None,
            privacy_form_identifier_column: ColumnRef::Name("code".into()),
            privacy_form_consent_column: ColumnRef::Name("consent".into()),
            survey_identifier_column: ColumnRef::Index(0),
            consent_literal: Some("YES".into()),
            identifier_pattern: None,
            replace_newlines: false,
            report_rejected_rows: None,
        }
    }

    fn tables() -> InMemoryTables {
        InMemoryTables::new()
            .with_source(
                "privacy.csv",
                table(&["code", "consent"], &[&["A", "YES"], &["", "YES"], &["C"]]),
            )
            .with_source(
                "survey.csv",
                table(&["code", "foo"], &[&["A", "bar"], &["B", "baz"]]),
            )
    }

    #[test]
    fn runs_through_all_stages() {
        let dir = tempdir().unwrap();
        let job = ReconcileJob::from_request(request(dir.path()), &JobDefaults::default()).unwrap();
        let io = tables();
        let mut stages = Vec::new();

        let report = job.run(&io, &io, |stage| stages.push(stage)).unwrap();

        assert_eq!(
            stages,
            vec![
                JobStage::Reading,
                JobStage::Validating,
                JobStage::Reconciling,
                JobStage::Writing
            ]
        );
        assert_eq!(report.stats.total_unique_identifiers, 2);
        assert_eq!(report.stats.valid, 1);
        assert_eq!(report.stats.only_survey, 1);
        assert_eq!(report.privacy_form.rows, 3);
        assert_eq!(report.privacy_form.accepted, 1);
        assert_eq!(report.privacy_form.blank, 1);
        assert_eq!(report.privacy_form.rejected, 1);
        assert_eq!(report.outputs.len(), 4);

        let all = io.written_at(&dir.path().join(ALL_IDENTIFIERS_FILE)).unwrap();
        assert_eq!(
            all.column("status").unwrap(),
            vec![
                Status::OkValid.to_string(),
                Status::ErrorOnlySurvey.to_string()
            ]
        );
        let commented = io
            .written_at(&dir.path().join("privacy_commented.csv"))
            .unwrap();
        assert_eq!(commented.rows.len(), 3);
    }

    #[test]
    fn missing_column_fails_before_writing() {
        let dir = tempdir().unwrap();
        let mut req = request(dir.path());
        req.privacy_form_consent_column = ColumnRef::Name("Einwilligung".into());
        let job = ReconcileJob::from_request(req, &JobDefaults::default()).unwrap();
        let io = tables();

        let err = job.run(&io, &io, |_| {}).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column \"Einwilligung\" not found in privacy form file"
        );
        assert!(io.written().is_empty());
    }

    #[test]
    fn request_validation() {
        let dir = tempdir().unwrap();
        let defaults = JobDefaults::default();

        let mut req = request(dir.path());
        req.separator = Some(";;".into());
        assert!(matches!(
            ReconcileJob::from_request(req, &defaults),
            Err(ReconcileError::InvalidRequest(_))
        ));

        let mut req = request(dir.path());
        req.identifier_pattern = Some("[".into());
        assert!(ReconcileJob::from_request(req, &defaults).is_err());

        let mut req = request(dir.path());
        req.output_directory_path = dir.path().join("missing").display().to_string();
        assert!(ReconcileJob::from_request(req, &defaults).is_err());

        let mut req = request(dir.path());
        req.survey_file_path = "other/privacy.csv".into();
        assert!(ReconcileJob::from_request(req, &defaults).is_err());
    }

    #[test]
    fn outputs_never_overwrite_sources() {
        let dir = tempdir().unwrap();
        let defaults = JobDefaults::default();

        for name in [ALL_IDENTIFIERS_FILE, VALID_IDENTIFIERS_FILE] {
            let mut req = request(dir.path());
            req.survey_file_path = dir.path().join(name).display().to_string();
            let err = ReconcileJob::from_request(req, &defaults).unwrap_err();
            assert!(matches!(err, ReconcileError::InvalidRequest(_)), "{}", name);
        }

        // Same file, spelled through a subdirectory and back.
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut req = request(dir.path());
        req.privacy_form_file_path = dir
            .path()
            .join("sub")
            .join("..")
            .join("survey_commented.csv")
            .display()
            .to_string();
        assert!(ReconcileJob::from_request(req, &defaults).is_err());

        let mut req = request(dir.path());
        req.privacy_form_file_path = dir.path().join("elsewhere.csv").display().to_string();
        assert!(ReconcileJob::from_request(req, &defaults).is_ok());
    }

    #[test]
    fn defaults_fill_missing_options() {
        let dir = tempdir().unwrap();
        let mut req = request(dir.path());
        req.consent_literal = None;
        let defaults = JobDefaults {
            delimiter: b',',
            report_rejected_rows: false,
            ..JobDefaults::default()
        };
        let job = ReconcileJob::from_request(req, &defaults).unwrap();
        assert_eq!(job.delimiter, b',');
        assert_eq!(
            job.validator.consent().literal(),
            ConsentInterpretation::DEFAULT_LITERAL
        );
        assert!(!job.comments.report_rejected_rows);
    }

    #[test]
    fn inspects_both_header_rows() {
        let io = tables();
        let req = InspectHeadersRequest {
            privacy_form_file_path: "privacy.csv".into(),
            survey_file_path: "survey.csv".into(),
            separator: None,
        };
        let headers = inspect_headers(&io, &req, &JobDefaults::default()).unwrap();
        assert_eq!(headers.privacy_form_file_headers, vec!["code", "consent"]);
        assert_eq!(headers.survey_file_headers, vec!["code", "foo"]);
    }
}
