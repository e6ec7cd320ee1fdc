//! Turn aggregated lookups into rectangular display rows.

use chrono::NaiveDate;

use tariffgrid_core::view::{CellKey, ExpansionState, RowKey};
use tariffgrid_core::{dates, Cell, GroupMode, SeriesValue, TableRow};

use crate::aggregate::{aggregate, AggregatedTable, DateEntry, Values};

/// Label of a collapsed list cell
pub const SHOW_LIST: &str = "Показать массив";

/// One row of a grouped table
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedRow {
    pub date: NaiveDate,
    /// Hour of the row in by-date-and-hour tables
    pub hour: Option<u8>,
    /// Rows the date cell spans: the date's row count on its first row, 0 on the rest
    pub date_span: usize,
    /// One cell per requested series name
    pub cells: Vec<Cell>,
}

impl ProjectedRow {
    /// Whether this row renders the date cell
    pub fn shows_date(&self) -> bool {
        self.date_span > 0
    }

    /// Full row: date, hour when `with_hour`, then the series cells
    pub fn to_cells(&self, with_hour: bool) -> Vec<Cell> {
        let mut row = Vec::with_capacity(self.cells.len() + 2);
        row.push(Cell::text(self.date.format(dates::FORMAT).to_string()));
        if with_hour {
            row.push(self.hour.map_or(Cell::Empty, |h| Cell::Number(f64::from(h))));
        }
        row.extend(self.cells.iter().cloned());
        row
    }
}

fn lookup(values: &Values, names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::from_value(values.get(*name).copied().flatten()))
        .collect()
}

fn hour_rows(date: NaiveDate, entry: &DateEntry, names: &[&str]) -> Vec<ProjectedRow> {
    if !entry.has_hours() {
        // scalar-only date: a single row without an hour
        return vec![ProjectedRow {
            date,
            hour: None,
            date_span: 1,
            cells: lookup(&entry.daily, names),
        }];
    }
    let span = entry.hourly.len();
    entry
        .hourly
        .iter()
        .enumerate()
        .map(|(i, (hour, values))| ProjectedRow {
            date,
            hour: Some(*hour),
            date_span: if i == 0 { span } else { 0 },
            cells: lookup(values, names),
        })
        .collect()
}

/// Project an aggregated table.
///
/// `ByDate` yields one row per date from the daily readings; `ByDateHour`
/// yields one row per hour under each date. Every row has exactly
/// `names.len()` cells, missing values as [`Cell::Empty`]. `GroupMode::None`
/// has no grouped rows: flat tables come from [`project_main`].
pub fn project(table: &AggregatedTable, mode: GroupMode, names: &[&str]) -> Vec<ProjectedRow> {
    match mode {
        GroupMode::None => Vec::new(),
        GroupMode::ByDate => table
            .dates()
            .map(|(date, entry)| ProjectedRow {
                date: *date,
                hour: None,
                date_span: 1,
                cells: lookup(&entry.daily, names),
            })
            .collect(),
        GroupMode::ByDateHour => table
            .dates()
            .flat_map(|(date, entry)| hour_rows(*date, entry, names))
            .collect(),
    }
}

/// Grouped rows for one report row, `None` when it has no dated points
pub fn project_row(row: &TableRow, mode: GroupMode) -> Option<Vec<ProjectedRow>> {
    if !row.has_dated_points() {
        return None;
    }
    let names = row.series_names();
    Some(project(&aggregate(&row.data), mode, &names))
}

/// One row of the flat table of a report
#[derive(Clone, Debug, PartialEq)]
pub struct MainRow {
    pub key: RowKey,
    pub cells: Vec<Cell>,
}

fn flat_cell(value: Option<&SeriesValue>, expanded: bool) -> Cell {
    match value {
        None => Cell::Empty,
        Some(SeriesValue::Scalar(v)) => Cell::Number(*v),
        Some(list @ SeriesValue::Hourly(_)) if expanded => Cell::List(list.numbers()),
        Some(SeriesValue::Hourly(_)) => Cell::text(SHOW_LIST),
    }
}

/// Flat table: one row per report row, values read directly.
///
/// Grouped tables show only the placeholder here. Hourly values render
/// as [`SHOW_LIST`] until their cell is expanded in `expansion`.
pub fn project_main(
    rows: &[TableRow],
    mode: GroupMode,
    expansion: &ExpansionState,
    table: usize,
) -> Vec<MainRow> {
    rows.iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let cells = row
                .data
                .iter()
                .enumerate()
                .map(|(col, series)| {
                    if mode.is_grouped() {
                        Cell::Empty
                    } else {
                        let expanded = expansion.is_expanded(CellKey::new(table, row_idx, col));
                        flat_cell(series.value.as_ref(), expanded)
                    }
                })
                .collect();
            MainRow {
                key: RowKey::new(row.subject_id, &row.object_ids),
                cells,
            }
        })
        .collect()
}
