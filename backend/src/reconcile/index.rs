//! # Identifier Index
//!
//! Accumulates every occurrence of every identifier across both sources.
//!
//! Entries live in a `Vec` in first-insertion order and are found through a
//! `HashMap` from identifier to slot. The index is the only owner of the
//! entries; callers get shared references once ingestion is over.
//!
//! Later occurrences overwrite the "live" fields of an entry: the consent of a
//! privacy form row, the passthrough fields of a survey row. The last row of a
//! source therefore always wins.

use crate::error::{ReconcileError, Result};
use crate::reconcile::record::{Passthrough, PrivacyFormRecord, SurveyRecord};
use common::model::datasource::SourceKind;
use std::collections::HashMap;

/// Everything known about one identifier before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprocessedEntry {
    pub identifier: String,
    /// Consent of the most recent privacy form row; `false` without one.
    pub consent: bool,
    /// Row whose consent is in effect.
    pub index_used_for_consent: Option<usize>,
    /// Ascending privacy form rows of this identifier.
    pub privacy_form_rows: Vec<usize>,
    /// Ascending survey rows of this identifier.
    pub survey_rows: Vec<usize>,
    /// Passthrough fields of the most recent survey row.
    pub passthrough: Option<Passthrough>,
}

impl UnprocessedEntry {
    fn empty(identifier: String) -> Self {
        Self {
            identifier,
            consent: false,
            index_used_for_consent: None,
            privacy_form_rows: Vec::new(),
            survey_rows: Vec::new(),
            passthrough: None,
        }
    }

    /// Last privacy form row of this identifier.
    pub fn last_privacy_form_row(&self) -> Option<usize> {
        self.privacy_form_rows.last().copied()
    }

    /// Last survey row of this identifier.
    pub fn last_survey_row(&self) -> Option<usize> {
        self.survey_rows.last().copied()
    }

    /// Privacy form rows of this identifier beyond the first.
    pub fn duplicates_in_privacy_form(&self) -> usize {
        self.privacy_form_rows.len().saturating_sub(1)
    }

    /// Survey rows of this identifier beyond the first.
    pub fn duplicates_in_survey(&self) -> usize {
        self.survey_rows.len().saturating_sub(1)
    }
}

/// Every identifier seen in either source, in first-insertion order.
///
/// A later privacy form row overrides the consent of an earlier one. A later
/// survey row replaces the passthrough values.
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    entries: Vec<UnprocessedEntry>,
    slots: HashMap<String, usize>,
    total_entries: usize,
    duplicates_in_privacy_form: usize,
    duplicates_in_survey: usize,
    last_privacy_form_row: Option<usize>,
    last_survey_row: Option<usize>,
}

impl IdentifierIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_for(&mut self, identifier: &str) -> usize {
        if let Some(&slot) = self.slots.get(identifier) {
            return slot;
        }
        let slot = self.entries.len();
        self.entries.push(UnprocessedEntry::empty(identifier.to_string()));
        self.slots.insert(identifier.to_string(), slot);
        slot
    }

    fn check_order(last: &mut Option<usize>, row: usize, input: SourceKind) -> Result<()> {
        if let Some(previous) = *last {
            if row <= previous {
                return Err(ReconcileError::RowOrder {
                    input,
                    row,
                    previous,
                });
            }
        }
        *last = Some(row);
        Ok(())
    }

    /// Adds privacy form rows. Rows must come in ascending row order.
    pub fn ingest_privacy_form<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = PrivacyFormRecord>,
    {
        for record in records {
            Self::check_order(
                &mut self.last_privacy_form_row,
                record.row,
                SourceKind::PrivacyForm,
            )?;
            self.total_entries += 1;

            let slot = self.slot_for(&record.identifier);
            let entry = &mut self.entries[slot];
            if !entry.privacy_form_rows.is_empty() {
                self.duplicates_in_privacy_form += 1;
            }
            entry.privacy_form_rows.push(record.row);
            entry.consent = record.consent;
            entry.index_used_for_consent = Some(record.row);
        }
        Ok(())
    }

    /// Adds survey rows. Rows must come in ascending row order.
    pub fn ingest_survey<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = SurveyRecord>,
    {
        for record in records {
            Self::check_order(&mut self.last_survey_row, record.row, SourceKind::Survey)?;
            self.total_entries += 1;

            let slot = self.slot_for(&record.identifier);
            let entry = &mut self.entries[slot];
            if !entry.survey_rows.is_empty() {
                self.duplicates_in_survey += 1;
            }
            entry.survey_rows.push(record.row);
            entry.passthrough = Some(record.passthrough);
        }
        Ok(())
    }

    /// Entries in first-insertion order.
    pub fn entries(&self) -> &[UnprocessedEntry] {
        &self.entries
    }

    /// Entry of `identifier`, if it was seen in either source.
    pub fn get(&self, identifier: &str) -> Option<&UnprocessedEntry> {
        self.slots.get(identifier).map(|&slot| &self.entries[slot])
    }

    /// Slot of `identifier` in [`entries`](Self::entries).
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.slots.get(identifier).copied()
    }

    /// Number of unique identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True until a record was ingested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepted rows of both sources.
    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    /// Duplicate rows counted in one source.
    pub fn duplicates(&self, input: SourceKind) -> usize {
        match input {
            SourceKind::PrivacyForm => self.duplicates_in_privacy_form,
            SourceKind::Survey => self.duplicates_in_survey,
        }
    }

    /// Duplicate rows of both sources.
    pub fn total_duplicates(&self) -> usize {
        self.duplicates_in_privacy_form + self.duplicates_in_survey
    }
}
