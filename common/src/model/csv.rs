use serde::{Deserialize, Serialize};
use std::fmt;

/// Points at one column of a CSV source.
///
/// The wizard sends column positions, scripted callers usually prefer header
/// names. Both are resolved against the header row before any data row is read.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnRef {
    /// 0-based position in the header row.
    Index(usize),
    /// Exact header title (surrounding whitespace is ignored).
    Name(String),
}

impl ColumnRef {
    /// Parses command line notation: a bare number is a position, anything else a header title.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(idx) => ColumnRef::Index(idx),
            Err(_) => ColumnRef::Name(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(idx) => write!(f, "with index \"{}\"", idx),
            ColumnRef::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

/// Header rows of both sources, returned by the header discovery endpoint so
/// the caller can build its column mapping.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceHeaders {
    pub privacy_form_file_headers: Vec<String>,
    pub survey_file_headers: Vec<String>,
}
