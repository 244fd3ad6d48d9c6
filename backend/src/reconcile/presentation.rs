use crate::table_io::Table;

/// Separator that replaces line breaks inside cells.
pub const NEWLINE_REPLACEMENT: &str = " / ";

/// Cosmetic transforms applied right before a table is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationOptions {
    /// Replace line breaks inside cells with `" / "`, so every record fits on
    /// one line in spreadsheet tools that handle quoted newlines badly.
    pub replace_newlines: bool,
}

impl PresentationOptions {
    /// Applies the enabled transforms to headers and cells.
    pub fn apply(&self, mut table: Table) -> Table {
        if self.replace_newlines {
            table.headers.iter_mut().for_each(flatten_newlines);
            table
                .rows
                .iter_mut()
                .flat_map(|row| row.iter_mut())
                .for_each(flatten_newlines);
        }
        table
    }
}

fn flatten_newlines(cell: &mut String) {
    if cell.contains(['\n', '\r']) {
        *cell = cell
            .replace("\r\n", NEWLINE_REPLACEMENT)
            .replace(['\n', '\r'], NEWLINE_REPLACEMENT);
    }
}
