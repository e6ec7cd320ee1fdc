//! XLSX export of [`ExportDocument`]s
//!
//! Every cell is written as-is: numbers stay numbers, text stays text,
//! empty cells become the `-` placeholder and list cells are joined with
//! `", "`. Row shapes are not validated.
//!
//! Sheet names are truncated to Excel's 31-character limit. When two
//! sheets truncate to the same name the later one replaces the earlier
//! one in its position, and a warning is logged.

use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet};
use tracing::{info, warn};

use tariffgrid_core::{Cell, RenderError, PLACEHOLDER};

use crate::{truncate_sheet_name, ExportDocument, Sheet};

/// XLSX exporter configuration
#[derive(Clone, Debug)]
pub struct SpreadsheetExporter {
    /// Whether the first row of every sheet is bold
    pub bold_header: bool,
    /// Column width applied to every used column (characters)
    pub column_width: Option<f64>,
}

impl Default for SpreadsheetExporter {
    fn default() -> Self {
        Self {
            bold_header: true,
            column_width: None,
        }
    }
}

impl SpreadsheetExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the first row without bold formatting
    pub fn plain_header(mut self) -> Self {
        self.bold_header = false;
        self
    }

    /// Set a fixed column width
    pub fn column_width(mut self, width: f64) -> Self {
        self.column_width = Some(width);
        self
    }

    /// Render the document to XLSX bytes
    pub fn export(&self, document: &ExportDocument) -> Result<Vec<u8>, RenderError> {
        let sheets = resolve_names(document);
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold().set_border(FormatBorder::Thin);

        for (name, sheet) in &sheets {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(name.as_str())
                .map_err(|e| RenderError::Format(e.to_string()))?;
            self.write_sheet(worksheet, sheet, &header)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        info!(sheets = sheets.len(), bytes = buffer.len(), "exported workbook");
        Ok(buffer)
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        sheet: &Sheet,
        header: &Format,
    ) -> Result<(), RenderError> {
        let mut widest = 0usize;
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = u32::try_from(r)
                .map_err(|_| RenderError::InvalidData(format!("too many rows in {}", sheet.name)))?;
            let format = (r == 0 && self.bold_header).then_some(header);
            for (c, cell) in row.iter().enumerate() {
                let c = u16::try_from(c).map_err(|_| {
                    RenderError::InvalidData(format!("too many columns in {}", sheet.name))
                })?;
                write_cell(worksheet, r, c, cell, format)?;
            }
            widest = widest.max(row.len());
        }

        if let Some(width) = self.column_width {
            for c in 0..widest {
                if let Ok(c) = u16::try_from(c) {
                    worksheet.set_column_width(c, width).ok();
                }
            }
        }
        Ok(())
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), RenderError> {
    let result = match (cell, format) {
        (Cell::Number(v), Some(f)) => worksheet.write_number_with_format(row, col, *v, f),
        (Cell::Number(v), None) => worksheet.write_number(row, col, *v),
        (Cell::Empty, Some(f)) => worksheet.write_string_with_format(row, col, PLACEHOLDER, f),
        (Cell::Empty, None) => worksheet.write_string(row, col, PLACEHOLDER),
        (other, Some(f)) => worksheet.write_string_with_format(row, col, other.to_string(), f),
        (other, None) => worksheet.write_string(row, col, other.to_string()),
    };
    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(e.to_string()))
}

/// Truncated names with duplicates collapsed: a later sheet takes the
/// position of the earlier one it collides with
fn resolve_names(document: &ExportDocument) -> Vec<(String, &Sheet)> {
    let mut resolved: Vec<(String, &Sheet)> = Vec::with_capacity(document.sheets.len());
    for sheet in &document.sheets {
        let name = truncate_sheet_name(&sheet.name);
        match resolved.iter_mut().find(|(n, _)| n.to_lowercase() == name.to_lowercase()) {
            Some(slot) => {
                warn!(sheet = %name, original = %sheet.name, "sheet name collision, replacing earlier sheet");
                slot.1 = sheet;
            }
            None => resolved.push((name, sheet)),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn read_back(bytes: &[u8]) -> Vec<(String, Vec<Vec<Data>>)> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        workbook
            .sheet_names()
            .into_iter()
            .map(|name| {
                let range = workbook.worksheet_range(&name).unwrap();
                let rows = range.rows().map(<[Data]>::to_vec).collect();
                (name, rows)
            })
            .collect()
    }

    #[test]
    fn export_produces_xlsx() {
        let document = ExportDocument::new().sheet(Sheet::new(
            "Data",
            vec![vec![Cell::text("A"), Cell::text("B")], vec![Cell::Number(1.5), Cell::Empty]],
        ));
        let bytes = SpreadsheetExporter::new().export(&document).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let sheets = read_back(&bytes);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].0, "Data");
        assert_eq!(sheets[0].1[1][0], Data::Float(1.5));
        assert_eq!(sheets[0].1[1][1], Data::String("-".into()));
    }

    #[test]
    fn list_cells_are_joined() {
        let document = ExportDocument::new().sheet(Sheet::new(
            "Lists",
            vec![vec![Cell::List(vec![1.0, 2.5])]],
        ));
        let bytes = SpreadsheetExporter::new().plain_header().export(&document).unwrap();
        let sheets = read_back(&bytes);
        assert_eq!(sheets[0].1[0][0], Data::String("1, 2.5".into()));
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "Потребление_Очень длинное название субъекта";
        let document = ExportDocument::new().sheet(Sheet::new(long, vec![]));
        let bytes = SpreadsheetExporter::new().export(&document).unwrap();
        let sheets = read_back(&bytes);
        assert_eq!(sheets[0].0.chars().count(), 31);
        assert!(long.starts_with(&sheets[0].0));
    }

    #[test]
    fn colliding_names_keep_the_later_sheet() {
        let prefix = "A".repeat(31);
        let document = ExportDocument::new()
            .sheet(Sheet::new(format!("{prefix}_first"), vec![vec![Cell::Number(1.0)]]))
            .sheet(Sheet::new("Other", vec![vec![Cell::Number(2.0)]]))
            .sheet(Sheet::new(format!("{prefix}_second"), vec![vec![Cell::Number(3.0)]]));
        assert_eq!(document.truncation_collisions(), vec![prefix.clone()]);

        let bytes = SpreadsheetExporter::new().export(&document).unwrap();
        let sheets = read_back(&bytes);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].0, prefix);
        assert_eq!(sheets[0].1[0][0], Data::Float(3.0));
        assert_eq!(sheets[1].0, "Other");
    }
}
