//! Day plan editor: 24 hour records, coefficient/volume edits and bulk import.
//!
//! ## Import contract
//!
//! The first row must be exactly one of the two known header shapes:
//!
//! | Shape | Header |
//! |-------|--------|
//! | Consumption | `Hour, Coefficient, Volume` |
//! | Generation | `Hour, Coefficient_Gen, Volume_Gen` |
//!
//! A mismatch rejects the whole file and leaves the plan untouched. On
//! success every slot is rebuilt from defaults and the imported rows are
//! applied on top; rows that are incomplete, non-numeric or outside
//! hours 1..=24 are skipped with a warning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::record::HourRecord;
use crate::timegrid::{build_default_hours, hour_index};
use crate::{dates, Cell, FormatError, RangeError, SubjectId};

/// The two coefficient/volume spreadsheet layouts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportShape {
    Consumption,
    Generation,
}

impl ImportShape {
    pub const ALL: [ImportShape; 2] = [Self::Consumption, Self::Generation];

    pub const fn header(self) -> [&'static str; 3] {
        match self {
            Self::Consumption => ["Hour", "Coefficient", "Volume"],
            Self::Generation => ["Hour", "Coefficient_Gen", "Volume_Gen"],
        }
    }

    /// Sheet name used when exporting this shape
    pub const fn sheet_name(self) -> &'static str {
        match self {
            Self::Consumption => "Coefficients_Volumes",
            Self::Generation => "GP1_Data",
        }
    }

    /// Match a header row exactly (case and order sensitive).
    ///
    /// Trailing empty cells are ignored; anything else must line up.
    pub fn detect(header: &[Cell]) -> Option<Self> {
        let end = header
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |i| i + 1);
        let header = &header[..end];
        Self::ALL.into_iter().find(|shape| {
            let expected = shape.header();
            header.len() == expected.len()
                && header
                    .iter()
                    .zip(expected)
                    .all(|(cell, name)| cell.as_text() == Some(name))
        })
    }

    fn expected_headers() -> String {
        Self::ALL
            .iter()
            .map(|s| s.header().join(", "))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Why an import row was not applied
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Fewer than three cells
    Incomplete,
    /// Hour, coefficient or volume did not parse
    InvalidNumber,
    OutOfRange(RangeError),
}

/// A row that was skipped, 1-based as shown in a spreadsheet
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Outcome of a successful import
#[derive(Clone, Debug, PartialEq)]
pub struct ImportReport {
    pub shape: ImportShape,
    /// Rows applied to the plan
    pub applied: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Which server action a plan payload asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCall {
    /// Store coefficients and volumes
    Save,
    /// Store and approve (computes P2 on the server)
    Calculate,
}

/// Coefficient and volume columns of a plan, one entry per hour
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanVectors {
    pub volume: Vec<f64>,
    pub coefficient: Vec<f64>,
    #[serde(rename = "coefficient_Gen")]
    pub coefficient_gen: Vec<f64>,
    #[serde(rename = "volume_Gen")]
    pub volume_gen: Vec<f64>,
}

/// Body posted on save and approve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanPayload {
    pub call: PlanCall,
    pub subject: SubjectId,
    #[serde(with = "dates")]
    pub date: NaiveDate,
    pub plan: PlanVectors,
}

/// Body posted when a day plan is first created
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatePayload {
    pub subject: SubjectId,
    #[serde(with = "dates")]
    pub date: NaiveDate,
    pub coefficient: Vec<f64>,
    #[serde(rename = "coefficient_Gen")]
    pub coefficient_gen: Vec<f64>,
}

/// Editable day plan of exactly 24 hour records
#[derive(Clone, Debug, PartialEq)]
pub struct PlanEditor {
    hours: Vec<HourRecord>,
    show_messages: bool,
}

impl Default for PlanEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanEditor {
    pub fn new() -> Self {
        Self {
            hours: build_default_hours(),
            show_messages: false,
        }
    }

    /// Build a plan from fetched records
    pub fn from_records(records: &[HourRecord]) -> Self {
        let mut editor = Self::new();
        editor.apply_fetched(records);
        editor
    }

    pub fn hours(&self) -> &[HourRecord] {
        &self.hours
    }

    pub fn hour(&self, hour: u8) -> Result<&HourRecord, RangeError> {
        Ok(&self.hours[hour_index(i64::from(hour))?])
    }

    fn slot_mut(&mut self, hour: u8) -> Result<&mut HourRecord, RangeError> {
        let idx = hour_index(i64::from(hour))?;
        Ok(&mut self.hours[idx])
    }

    /// Back to 24 default records
    pub fn reset(&mut self) {
        self.hours = build_default_hours();
    }

    /// Rebuild every slot from server records, matched by hour.
    ///
    /// Hours without a record return to defaults; records for hours outside
    /// the day are ignored.
    pub fn apply_fetched(&mut self, records: &[HourRecord]) {
        let mut hours = build_default_hours();
        for record in records {
            match hour_index(i64::from(record.hour)) {
                Ok(idx) => hours[idx] = record.clone(),
                Err(e) => warn!("ignoring fetched record: {e}"),
            }
        }
        self.hours = hours;
    }

    // ========================================================================
    // Setters
    // ========================================================================

    pub fn set_coefficient(&mut self, hour: u8, value: f64) -> Result<(), RangeError> {
        self.slot_mut(hour)?.coefficient = value;
        Ok(())
    }

    /// Volumes are whole units; fractions are truncated
    pub fn set_volume(&mut self, hour: u8, value: f64) -> Result<(), RangeError> {
        self.slot_mut(hour)?.volume = value.trunc();
        Ok(())
    }

    pub fn set_coefficient_gen(&mut self, hour: u8, value: f64) -> Result<(), RangeError> {
        self.slot_mut(hour)?.coefficient_gen = value;
        Ok(())
    }

    pub fn set_volume_gen(&mut self, hour: u8, value: f64) -> Result<(), RangeError> {
        self.slot_mut(hour)?.volume_gen = value.trunc();
        Ok(())
    }

    pub fn set_message(&mut self, hour: u8, message: impl Into<String>) -> Result<(), RangeError> {
        self.slot_mut(hour)?.message = message.into();
        Ok(())
    }

    /// Set from form input; unparsable text becomes 0
    pub fn set_coefficient_text(&mut self, hour: u8, input: &str) -> Result<(), RangeError> {
        self.set_coefficient(hour, parse_lenient(input))
    }

    pub fn set_volume_text(&mut self, hour: u8, input: &str) -> Result<(), RangeError> {
        self.set_volume(hour, parse_lenient(input))
    }

    pub fn set_coefficient_gen_text(&mut self, hour: u8, input: &str) -> Result<(), RangeError> {
        self.set_coefficient_gen(hour, parse_lenient(input))
    }

    pub fn set_volume_gen_text(&mut self, hour: u8, input: &str) -> Result<(), RangeError> {
        self.set_volume_gen(hour, parse_lenient(input))
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    pub fn calculate_p2(&self, hour: u8) -> Result<f64, RangeError> {
        Ok(self.hour(hour)?.calculate_p2())
    }

    pub fn calculate_p2_gen(&self, hour: u8) -> Result<f64, RangeError> {
        Ok(self.hour(hour)?.calculate_p2_gen())
    }

    pub fn display_p2(&self, hour: u8) -> Result<f64, RangeError> {
        Ok(self.hour(hour)?.display_p2())
    }

    pub fn display_p2_gen(&self, hour: u8) -> Result<f64, RangeError> {
        Ok(self.hour(hour)?.display_p2_gen())
    }

    // ========================================================================
    // Message column
    // ========================================================================

    /// Show the message column for a rejection
    pub fn disapprove(&mut self) {
        self.show_messages = true;
    }

    pub fn cancel(&mut self) {
        self.show_messages = false;
    }

    pub fn show_messages(&self) -> bool {
        self.show_messages
    }

    // ========================================================================
    // Import / Export
    // ========================================================================

    /// Replace the plan from spreadsheet rows, header first
    pub fn import_rows(&mut self, rows: &[Vec<Cell>]) -> Result<ImportReport, FormatError> {
        let header = rows.first().ok_or(FormatError::MissingHeader)?;
        let shape = ImportShape::detect(header).ok_or_else(|| FormatError::HeaderMismatch {
            expected: ImportShape::expected_headers(),
            found: header
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })?;

        let mut hours = build_default_hours();
        let mut applied = 0;
        let mut skipped = Vec::new();

        for (i, row) in rows.iter().enumerate().skip(1) {
            let row_number = i + 1;
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            match parse_row(row) {
                Ok((idx, coefficient, volume)) => {
                    let slot = &mut hours[idx];
                    match shape {
                        ImportShape::Consumption => {
                            slot.coefficient = coefficient;
                            slot.volume = volume;
                        }
                        ImportShape::Generation => {
                            slot.coefficient_gen = coefficient;
                            slot.volume_gen = volume;
                        }
                    }
                    applied += 1;
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::OutOfRange(e) => {
                            warn!("row {row_number}: {e}, skipped");
                        }
                        SkipReason::Incomplete => {
                            warn!("row {row_number} is incomplete, skipped");
                        }
                        SkipReason::InvalidNumber => {
                            warn!("row {row_number} contains invalid data, skipped");
                        }
                    }
                    skipped.push(SkippedRow {
                        row: row_number,
                        reason,
                    });
                }
            }
        }

        self.hours = hours;
        info!(
            shape = ?shape,
            applied,
            skipped = skipped.len(),
            "plan imported"
        );
        Ok(ImportReport {
            shape,
            applied,
            skipped,
        })
    }

    /// Header plus one row per hour in the given shape
    pub fn export_rows(&self, shape: ImportShape) -> Vec<Vec<Cell>> {
        let header = shape.header().iter().map(|h| Cell::from(*h)).collect();
        let body = self.hours.iter().map(|h| {
            let (coefficient, volume) = match shape {
                ImportShape::Consumption => (h.coefficient, h.volume),
                ImportShape::Generation => (h.coefficient_gen, h.volume_gen),
            };
            vec![
                Cell::Number(f64::from(h.hour)),
                Cell::Number(coefficient),
                Cell::Number(volume),
            ]
        });
        std::iter::once(header).chain(body).collect()
    }

    pub fn vectors(&self) -> PlanVectors {
        PlanVectors {
            volume: self.hours.iter().map(|h| h.volume).collect(),
            coefficient: self.hours.iter().map(|h| h.coefficient).collect(),
            coefficient_gen: self.hours.iter().map(|h| h.coefficient_gen).collect(),
            volume_gen: self.hours.iter().map(|h| h.volume_gen).collect(),
        }
    }

    pub fn save_payload(&self, subject: SubjectId, date: NaiveDate, call: PlanCall) -> PlanPayload {
        PlanPayload {
            call,
            subject,
            date,
            plan: self.vectors(),
        }
    }

    pub fn create_payload(&self, subject: SubjectId, date: NaiveDate) -> CreatePayload {
        CreatePayload {
            subject,
            date,
            coefficient: self.hours.iter().map(|h| h.coefficient).collect(),
            coefficient_gen: self.hours.iter().map(|h| h.coefficient_gen).collect(),
        }
    }
}

/// Leading-number parse like a form field: "12abc" → 12, "" → 0
fn parse_lenient(input: &str) -> f64 {
    let s = input.trim();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    s[..end].parse().unwrap_or(0.0)
}

fn parse_row(row: &[Cell]) -> Result<(usize, f64, f64), SkipReason> {
    if row.len() < 3 {
        return Err(SkipReason::Incomplete);
    }
    let hour = row[0].as_number().ok_or(SkipReason::InvalidNumber)?;
    let coefficient = row[1].as_number().ok_or(SkipReason::InvalidNumber)?;
    let volume = row[2].as_number().ok_or(SkipReason::InvalidNumber)?;
    if !hour.is_finite() || !coefficient.is_finite() || !volume.is_finite() {
        return Err(SkipReason::InvalidNumber);
    }
    let idx = hour_index(hour.trunc() as i64).map_err(SkipReason::OutOfRange)?;
    Ok((idx, coefficient, volume.trunc()))
}
