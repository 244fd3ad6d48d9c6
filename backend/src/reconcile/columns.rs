//! Resolution of the caller's column mapping against a header row.
//!
//! This runs before a single data row is looked at, so a mapping that points
//! at a column the file does not have fails the whole job up front.

use crate::error::{ReconcileError, Result};
use common::model::csv::ColumnRef;
use common::model::datasource::SourceKind;

/// Finds the position of `column` in `headers`.
pub fn resolve(headers: &[String], column: &ColumnRef, input: SourceKind) -> Result<usize> {
    let found = match column {
        ColumnRef::Index(idx) => (*idx < headers.len()).then_some(*idx),
        ColumnRef::Name(name) => headers.iter().position(|h| h.trim() == name.trim()),
    };
    found.ok_or_else(|| ReconcileError::MissingColumn {
        input,
        column: column.to_string(),
    })
}

/// Column positions of the privacy form file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyFormColumns {
    pub identifier: usize,
    pub consent: usize,
}

impl PrivacyFormColumns {
    /// Fails with `MissingColumn` if either column is absent.
    pub fn resolve(headers: &[String], identifier: &ColumnRef, consent: &ColumnRef) -> Result<Self> {
        Ok(Self {
            identifier: resolve(headers, identifier, SourceKind::PrivacyForm)?,
            consent: resolve(headers, consent, SourceKind::PrivacyForm)?,
        })
    }
}

/// Column positions of the survey file. Every column except the identifier is
/// passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyColumns {
    pub identifier: usize,
    pub passthrough: Vec<(usize, String)>,
}

impl SurveyColumns {
    pub fn resolve(headers: &[String], identifier: &ColumnRef) -> Result<Self> {
        let identifier = resolve(headers, identifier, SourceKind::Survey)?;
        let passthrough = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != identifier)
            .map(|(idx, title)| (idx, title.trim().to_string()))
            .collect();
        Ok(Self {
            identifier,
            passthrough,
        })
    }

    /// Distinct passthrough column titles in header order.
    pub fn passthrough_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.passthrough.len());
        for (_, title) in &self.passthrough {
            if !keys.contains(title) {
                keys.push(title.clone());
            }
        }
        keys
    }
}
