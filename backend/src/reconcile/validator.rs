//! Row validation for both sources.
//!
//! Each raw row becomes either a typed record, a blank row (empty identifier,
//! silently ignored) or a rejection carrying the reason. Validation is pure,
//! so whole sources are validated in parallel; results keep the row order.

use crate::reconcile::columns::{PrivacyFormColumns, SurveyColumns};
use crate::reconcile::consent::ConsentInterpretation;
use crate::reconcile::record::{PrivacyFormRecord, SurveyRecord};
use log::debug;
use rayon::prelude::*;
use regex::Regex;
use std::fmt;

/// Why a row could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    /// The row ends before a mapped column.
    MissingCell { column: usize, found: usize },
    /// The identifier does not match the configured pattern.
    MalformedIdentifier { identifier: String },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingCell { column, found } => {
                write!(f, "no cell for column {}, row has {} fields", column, found)
            }
            RowRejection::MalformedIdentifier { identifier } => {
                write!(f, "malformed identifier \"{}\"", identifier)
            }
        }
    }
}

/// Result of validating one raw row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Accepted(T),
    /// The identifier cell is empty after trimming.
    Blank,
    Rejected(RowRejection),
}

impl<T> RowOutcome<T> {
    /// The record, if the row was accepted.
    pub fn accepted(&self) -> Option<&T> {
        match self {
            RowOutcome::Accepted(record) => Some(record),
            _ => None,
        }
    }
}

/// Turns raw rows into records.
///
/// Identifiers are trimmed. A blank identifier makes the row [`RowOutcome::Blank`]
/// whatever the other cells hold.
#[derive(Debug, Clone)]
pub struct RecordValidator {
    consent: ConsentInterpretation,
    identifier_pattern: Option<Regex>,
}

impl RecordValidator {
    pub fn new(consent: ConsentInterpretation, identifier_pattern: Option<Regex>) -> Self {
        Self {
            consent,
            identifier_pattern,
        }
    }

    pub fn consent(&self) -> &ConsentInterpretation {
        &self.consent
    }

    /// Only the mapped columns are required. Cells beyond them may be
    /// missing; passthrough values of a short survey row are left empty.
    fn require_cells(cells: &[String], mapped: &[usize]) -> Result<(), RowRejection> {
        match mapped.iter().find(|&&column| column >= cells.len()) {
            Some(&column) => Err(RowRejection::MissingCell {
                column,
                found: cells.len(),
            }),
            None => Ok(()),
        }
    }

    /// `Ok(None)` for a blank identifier.
    fn identifier(&self, raw: &str) -> Result<Option<String>, RowRejection> {
        let identifier = raw.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        if let Some(pattern) = &self.identifier_pattern {
            if !pattern.is_match(identifier) {
                return Err(RowRejection::MalformedIdentifier {
                    identifier: identifier.to_string(),
                });
            }
        }
        Ok(Some(identifier.to_string()))
    }

    /// Validates data row `row` of the privacy form.
    pub fn privacy_form_row(
        &self,
        row: usize,
        cells: &[String],
        columns: &PrivacyFormColumns,
    ) -> RowOutcome<PrivacyFormRecord> {
        if let Err(rejection) = Self::require_cells(cells, &[columns.identifier, columns.consent]) {
            return RowOutcome::Rejected(rejection);
        }
        match self.identifier(&cells[columns.identifier]) {
            Ok(Some(identifier)) => RowOutcome::Accepted(PrivacyFormRecord {
                identifier,
                consent: self.consent.interpret(&cells[columns.consent]),
                row,
            }),
            Ok(None) => RowOutcome::Blank,
            Err(rejection) => RowOutcome::Rejected(rejection),
        }
    }

    /// Validates data row `row` of the survey. Every passthrough column gets
    /// a value, empty if the row is too short for it.
    pub fn survey_row(
        &self,
        row: usize,
        cells: &[String],
        columns: &SurveyColumns,
    ) -> RowOutcome<SurveyRecord> {
        if let Err(rejection) = Self::require_cells(cells, &[columns.identifier]) {
            return RowOutcome::Rejected(rejection);
        }
        match self.identifier(&cells[columns.identifier]) {
            Ok(Some(identifier)) => RowOutcome::Accepted(SurveyRecord {
                identifier,
                passthrough: columns
                    .passthrough
                    .iter()
                    .map(|(idx, title)| {
                        let value = cells.get(*idx).map(String::as_str).unwrap_or("");
                        (title.as_str(), value)
                    })
                    .collect(),
                row,
            }),
            Ok(None) => RowOutcome::Blank,
            Err(rejection) => RowOutcome::Rejected(rejection),
        }
    }

    /// Validates all rows in parallel. Outcomes keep the row order.
    pub fn privacy_form_rows(
        &self,
        rows: &[Vec<String>],
        columns: &PrivacyFormColumns,
    ) -> Vec<RowOutcome<PrivacyFormRecord>> {
        let outcomes: Vec<_> = rows
            .par_iter()
            .enumerate()
            .map(|(row, cells)| self.privacy_form_row(row, cells, columns))
            .collect();
        log_rejections("privacy form", &outcomes);
        outcomes
    }

    /// Survey counterpart of [`privacy_form_rows`](Self::privacy_form_rows).
    pub fn survey_rows(
        &self,
        rows: &[Vec<String>],
        columns: &SurveyColumns,
    ) -> Vec<RowOutcome<SurveyRecord>> {
        let outcomes: Vec<_> = rows
            .par_iter()
            .enumerate()
            .map(|(row, cells)| self.survey_row(row, cells, columns))
            .collect();
        log_rejections("survey", &outcomes);
        outcomes
    }
}

fn log_rejections<T>(source: &str, outcomes: &[RowOutcome<T>]) {
    for (row, outcome) in outcomes.iter().enumerate() {
        if let RowOutcome::Rejected(rejection) = outcome {
            debug!("Rejected {} row {}: {}", source, row, rejection);
        }
    }
}
