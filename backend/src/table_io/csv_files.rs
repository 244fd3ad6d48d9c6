use crate::error::{ReconcileError, Result};
use crate::table_io::{NamedTable, Table, TableReader, TableRequest, TableWriter};
use common::model::reconcile::OutputFile;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempPath};

/// Reads and writes delimited text files with the `csv` crate.
///
/// Reading is lenient about row length: a row with too few or too many cells
/// is still returned and left to the validator to judge. Writing stages every
/// table in a temporary file next to its destination, moves existing
/// destination files aside and only then renames the staged files into place.
/// If any rename fails, the files already renamed are removed and the old
/// files are put back.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFiles;

fn normalize_header(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}').trim().to_string()
}

fn record_to_cells(record: &StringRecord) -> Vec<String> {
    record.iter().map(|c| c.to_string()).collect()
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// A destination file that was moved out of the way before writing.
struct Backup {
    destination: PathBuf,
    saved: TempPath,
}

impl Backup {
    /// Moves an existing file at `destination` to a temporary path in the same
    /// directory. Anything that is not a regular file is left alone.
    fn take(destination: &Path) -> Result<Option<Self>> {
        if !destination.is_file() {
            return Ok(None);
        }
        let write_error = |error| ReconcileError::Write {
            path: destination.to_path_buf(),
            error,
        };
        let saved = Builder::new()
            .prefix(".psmatch-backup-")
            .tempfile_in(parent_dir(destination))
            .map_err(write_error)?
            .into_temp_path();
        fs::rename(destination, &saved).map_err(write_error)?;
        Ok(Some(Self {
            destination: destination.to_path_buf(),
            saved,
        }))
    }

    fn restore(self) {
        if let Err(e) = fs::rename(&self.saved, &self.destination) {
            error!(
                "Could not restore {} from {}: {}",
                self.destination.display(),
                self.saved.display(),
                e
            );
            // The old content stays on disk under the backup name.
            if let Err(e) = self.saved.keep() {
                error!("Could not keep backup: {}", e);
            }
        }
    }
}

/// Undoes a partially applied write.
fn roll_back(persisted: &[PathBuf], backups: Vec<Backup>) {
    for path in persisted {
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
    for backup in backups {
        backup.restore();
    }
}

impl CsvFiles {
    fn open(request: &TableRequest) -> Result<csv::Reader<File>> {
        ReaderBuilder::new()
            .delimiter(request.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(&request.path)
            .map_err(|error| ReconcileError::Read {
                input: request.input,
                path: request.path.clone(),
                error,
            })
    }

    fn headers_of(reader: &mut csv::Reader<File>, request: &TableRequest) -> Result<Vec<String>> {
        let headers = reader.headers().map_err(|error| ReconcileError::Read {
            input: request.input,
            path: request.path.clone(),
            error,
        })?;
        if headers.is_empty() {
            return Err(ReconcileError::EmptySource {
                input: request.input,
                path: request.path.clone(),
            });
        }
        Ok(headers.iter().map(normalize_header).collect())
    }

    fn stage(table: &NamedTable, delimiter: u8) -> Result<NamedTempFile> {
        let mut staged = NamedTempFile::new_in(parent_dir(&table.path)).map_err(|error| ReconcileError::Write {
            path: table.path.clone(),
            error,
        })?;

        {
            let mut writer = WriterBuilder::new()
                .delimiter(delimiter)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(staged.as_file_mut());
            writer.write_record(&table.table.headers)?;
            for row in &table.table.rows {
                writer.write_record(row)?;
            }
            writer.flush().map_err(|error| ReconcileError::Write {
                path: table.path.clone(),
                error,
            })?;
        }

        Ok(staged)
    }
}

impl TableReader for CsvFiles {
    fn read_table(&self, request: &TableRequest) -> Result<Table> {
        let mut reader = Self::open(request)?;
        let mut table = Table::new(Self::headers_of(&mut reader, request)?);

        for record in reader.records() {
            let record = record.map_err(|error| ReconcileError::Read {
                input: request.input,
                path: request.path.clone(),
                error,
            })?;
            table.push(record_to_cells(&record));
        }

        debug!(
            "Read {} rows from {} file {}",
            table.rows.len(),
            request.input,
            request.path.display()
        );
        Ok(table)
    }

    fn read_headers(&self, request: &TableRequest) -> Result<Vec<String>> {
        let mut reader = Self::open(request)?;
        Self::headers_of(&mut reader, request)
    }
}

impl TableWriter for CsvFiles {
    fn write_tables(&self, tables: &[NamedTable], delimiter: u8) -> Result<Vec<OutputFile>> {
        // Staged files and backups are deleted on drop, so an early return
        // before the first rename leaves the file system untouched.
        let staged = tables
            .iter()
            .map(|table| Self::stage(table, delimiter))
            .collect::<Result<Vec<_>>>()?;

        let mut backups = Vec::new();
        for table in tables {
            match Backup::take(&table.path) {
                Ok(Some(backup)) => backups.push(backup),
                Ok(None) => {}
                Err(e) => {
                    roll_back(&[], backups);
                    return Err(e);
                }
            }
        }

        let mut persisted: Vec<PathBuf> = Vec::with_capacity(tables.len());
        for (file, table) in staged.into_iter().zip(tables) {
            if let Err(e) = file.persist(&table.path) {
                roll_back(&persisted, backups);
                return Err(ReconcileError::Write {
                    path: table.path.clone(),
                    error: e.error,
                });
            }
            persisted.push(table.path.clone());
        }
        // Old outputs are no longer needed once every table is in place.
        drop(backups);

        Ok(tables
            .iter()
            .map(|table| {
                info!("Wrote {} ({} rows)", table.path.display(), table.table.rows.len());
                OutputFile {
                    kind: table.kind,
                    path: table.path.display().to_string(),
                    rows: table.table.rows.len(),
                }
            })
            .collect())
    }
}
