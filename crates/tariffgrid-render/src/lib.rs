//! # tariffgrid-render
//!
//! Output backends for tariffgrid tables and plans.
//!
//! This crate provides:
//! - The export document model ([`ExportDocument`], [`Sheet`])
//! - XLSX export ([`SpreadsheetExporter`])
//! - Sheet builders for per-subject tables, plan coefficients and the full
//!   plan export ([`sheets`])
//! - Plain-text rendering for terminals ([`TextRenderer`])
//!
//! ## Example
//!
//! ```rust
//! use tariffgrid_core::{ImportShape, PlanEditor};
//! use tariffgrid_render::{plan_sheet, ExportDocument, SpreadsheetExporter};
//!
//! let plan = PlanEditor::new();
//! let document = ExportDocument::new().sheet(plan_sheet(&plan, ImportShape::Consumption));
//! let xlsx_bytes = SpreadsheetExporter::new().export(&document).unwrap();
//! assert!(xlsx_bytes.starts_with(b"PK"));
//! ```

pub mod excel;
pub mod sheets;
pub mod text;

pub use excel::SpreadsheetExporter;
pub use sheets::{full_export_sheet, plan_sheet, subject_sheet, table_document};
pub use text::TextRenderer;

use chrono::NaiveDate;
use std::collections::HashMap;

use tariffgrid_core::{dates, Cell};

/// Excel's hard limit on sheet name length
pub const SHEET_NAME_LIMIT: usize = 31;

/// A named grid of cells
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    /// Requested name; truncated on export
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Ordered sheets of one workbook
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportDocument {
    pub sheets: Vec<Sheet>,
}

impl ExportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet
    pub fn sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Truncated names shared by more than one sheet, in first-seen order.
    ///
    /// Excel compares sheet names case-insensitively, so these do too.
    pub fn truncation_collisions(&self) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut order = Vec::new();
        for sheet in &self.sheets {
            let name = truncate_sheet_name(&sheet.name);
            let count = seen.entry(name.to_lowercase()).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push(name);
            }
        }
        order
    }
}

/// Sheet name used when a name is blank after sanitizing
pub const BLANK_SHEET_NAME: &str = "Sheet";

/// Cut a sheet name to [`SHEET_NAME_LIMIT`] characters.
///
/// Characters Excel rejects in sheet names (`[ ] : * ? / \`) become `_`,
/// as does an apostrophe at either end. A blank name becomes
/// [`BLANK_SHEET_NAME`] and the reserved `History` gets a trailing `_`.
pub fn truncate_sheet_name(name: &str) -> String {
    let mut chars: Vec<char> = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(SHEET_NAME_LIMIT)
        .collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return BLANK_SHEET_NAME.to_string();
    }
    if let Some(first) = chars.first_mut().filter(|c| **c == '\'') {
        *first = '_';
    }
    if let Some(last) = chars.last_mut().filter(|c| **c == '\'') {
        *last = '_';
    }
    let name: String = chars.into_iter().collect();
    if name.eq_ignore_ascii_case("history") {
        return format!("{name}_");
    }
    name
}

/// Download name: `<label>_<date>.xlsx`
pub fn export_filename(label: &str, date: NaiveDate) -> String {
    format!("{}_{}.xlsx", label, date.format(dates::FORMAT))
}
