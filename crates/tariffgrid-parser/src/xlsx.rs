//! Workbook reading via calamine.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use tariffgrid_core::{Cell, FormatError, ImportReport, PlanEditor};

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(s) => Cell::text(s.as_str()),
        other => Cell::text(other.to_string()),
    }
}

/// Rows of the first sheet in a workbook
///
/// Rows start at the first used row; empty cells become [`Cell::Empty`].
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, FormatError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| FormatError::Unreadable(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .ok_or_else(|| FormatError::Unreadable("workbook has no sheets".into()))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| FormatError::Unreadable(e.to_string()))?;

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect();
    debug!(sheet = %first, rows = rows.len(), "read workbook");
    Ok(rows)
}

/// Replace the editor's plan from a workbook.
///
/// Nothing changes when the workbook is unreadable or its header is not a
/// known plan shape.
pub fn import_plan(editor: &mut PlanEditor, bytes: &[u8]) -> Result<ImportReport, FormatError> {
    let rows = read_first_sheet(bytes)?;
    editor.import_rows(&rows)
}
