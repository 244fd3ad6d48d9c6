//! Tabular input and output.
//!
//! The reconciliation core never touches files. It receives [`Table`]s from a
//! [`TableReader`] and hands its results to a [`TableWriter`]. `CsvFiles` is
//! the production implementation; `InMemoryTables` serves tests and embedders
//! that already hold their data in memory.

mod csv_files;
mod memory;

pub use csv_files::CsvFiles;
pub use memory::InMemoryTables;

use crate::error::Result;
use common::model::datasource::SourceKind;
use common::model::reconcile::{OutputFile, OutputKind};
use std::path::PathBuf;

/// A header row plus data rows, all cells as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// A table with no data rows yet.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Values of column `title`, or `None` if the table has no such column.
    pub fn column(&self, title: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == title)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// Where and how to read one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub input: SourceKind,
    pub path: PathBuf,
    pub delimiter: u8,
}

/// An output table and its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTable {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub table: Table,
}

/// Source of input tables. Both sources are read concurrently, hence `Sync`.
pub trait TableReader: Sync {
    /// Reads the header row and every data row of a source.
    fn read_table(&self, request: &TableRequest) -> Result<Table>;

    /// Reads only the header row of a source.
    fn read_headers(&self, request: &TableRequest) -> Result<Vec<String>>;
}

/// Destination of output tables.
pub trait TableWriter {
    /// Writes all tables or none of them.
    fn write_tables(&self, tables: &[NamedTable], delimiter: u8) -> Result<Vec<OutputFile>>;
}
