use crate::error::{ReconcileError, Result};
use crate::table_io::{NamedTable, Table, TableReader, TableRequest, TableWriter};
use common::model::reconcile::OutputFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Tables held in memory, keyed by path.
///
/// Sources are registered up front with [`with_source`](Self::with_source);
/// everything written through [`TableWriter`] can be inspected afterwards
/// with [`written`](Self::written).
#[derive(Debug, Default)]
pub struct InMemoryTables {
    sources: HashMap<PathBuf, Table>,
    written: Mutex<Vec<NamedTable>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` as the content of `path`.
    pub fn with_source(mut self, path: impl Into<PathBuf>, table: Table) -> Self {
        self.sources.insert(path.into(), table);
        self
    }

    /// Tables written so far, in write order.
    pub fn written(&self) -> Vec<NamedTable> {
        match self.written.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The written table stored under `path`, if any.
    pub fn written_at(&self, path: &Path) -> Option<Table> {
        self.written()
            .into_iter()
            .find(|t| t.path == path)
            .map(|t| t.table)
    }

    fn source(&self, request: &TableRequest) -> Result<&Table> {
        let table = self.sources.get(&request.path).ok_or_else(|| {
            ReconcileError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", request.path.display()),
            ))
        })?;
        if table.headers.is_empty() {
            return Err(ReconcileError::EmptySource {
                input: request.input,
                path: request.path.clone(),
            });
        }
        Ok(table)
    }
}

impl TableReader for InMemoryTables {
    fn read_table(&self, request: &TableRequest) -> Result<Table> {
        self.source(request).cloned()
    }

    fn read_headers(&self, request: &TableRequest) -> Result<Vec<String>> {
        Ok(self.source(request)?.headers.clone())
    }
}

impl TableWriter for InMemoryTables {
    fn write_tables(&self, tables: &[NamedTable], _delimiter: u8) -> Result<Vec<OutputFile>> {
        let mut written = match self.written.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        written.extend(tables.iter().cloned());
        Ok(tables
            .iter()
            .map(|t| OutputFile {
                kind: t.kind,
                path: t.path.display().to_string(),
                rows: t.table.rows.len(),
            })
            .collect())
    }
}
