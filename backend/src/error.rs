//! Error types for reconciliation jobs

use common::model::datasource::SourceKind;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Job-fatal failures.
///
/// Row-level validation problems never show up here; they are absorbed by the
/// validator and reported through the row accounting instead.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A mapped column does not exist in the header row of a source
    #[error("Column {column} not found in {input} file")]
    MissingColumn { input: SourceKind, column: String },

    /// The source has no header row at all
    #[error("No header row found in {input} file {}", path.display())]
    EmptySource { input: SourceKind, path: PathBuf },

    /// Rows of one source were handed to the index out of order
    #[error("{input} row {row} arrived after row {previous}")]
    RowOrder {
        input: SourceKind,
        row: usize,
        previous: usize,
    },

    /// The job request is malformed (bad delimiter, bad pattern, missing path)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading a source file failed
    #[error("Failed to read {input} file {}: {error}", path.display())]
    Read {
        input: SourceKind,
        path: PathBuf,
        #[source]
        error: csv::Error,
    },

    /// Writing an output file failed
    #[error("Failed to write {}: {error}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReconcileError {
    /// True when the caller sent something unusable, as opposed to an
    /// environment or I/O failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReconcileError::MissingColumn { .. }
                | ReconcileError::EmptySource { .. }
                | ReconcileError::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_source_and_column() {
        let err = ReconcileError::MissingColumn {
            input: SourceKind::PrivacyForm,
            column: "\"consent\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Column \"consent\" not found in privacy form file"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn io_errors_are_not_client_errors() {
        let err: ReconcileError = std::io::Error::other("disk full").into();
        assert!(!err.is_client_error());
    }
}
