//! Sheet builders for the workbook exports.

use tracing::debug;

use tariffgrid_core::timegrid::{hour_interval_label, HOURS_PER_DAY};
use tariffgrid_core::{
    dates, Cell, Directory, GroupMode, HourRecord, ImportShape, ObjectId, PlanEditor, PlanSeries,
    SeriesValue, SubjectId, TableDefinition, TableRow, PLACEHOLDER,
};
use tariffgrid_table::project_row;

use crate::{ExportDocument, Sheet};

/// Name of the single sheet of a full export
pub const FULL_EXPORT_SHEET: &str = "Full Export";

// ============================================================================
// Report tables
// ============================================================================

/// Export sheet for one row of a report table.
///
/// Header is `Дата`, `Час` (hourly tables only), `Субъект`, then the row's
/// series names. Rows without dated points export a single line with the
/// table's start date and the flat values.
pub fn subject_sheet(table: &TableDefinition, row: &TableRow, directory: &Directory) -> Sheet {
    let mode = match table.mode() {
        // a flat table still exports by date
        GroupMode::None => GroupMode::ByDate,
        grouped => grouped,
    };
    let with_hour = mode == GroupMode::ByDateHour;
    let label = directory.row_label(row.subject_id, &row.object_ids);

    let mut header = vec![Cell::text("Дата")];
    if with_hour {
        header.push(Cell::text("Час"));
    }
    header.push(Cell::text("Субъект"));
    header.extend(row.series_names().into_iter().map(Cell::from));

    let mut rows = vec![header];
    match project_row(row, mode) {
        Some(projected) => {
            for line in projected {
                let mut cells = vec![Cell::text(line.date.format(dates::FORMAT).to_string())];
                if with_hour {
                    cells.push(line.hour.map_or(Cell::Empty, |h| Cell::Number(f64::from(h))));
                }
                cells.push(Cell::text(label.as_str()));
                cells.extend(line.cells);
                rows.push(cells);
            }
        }
        None => {
            let start = table
                .start_date
                .map_or_else(|| PLACEHOLDER.to_string(), |d| d.format(dates::FORMAT).to_string());
            let mut cells = vec![Cell::text(start)];
            if with_hour {
                cells.push(Cell::Empty);
            }
            cells.push(Cell::text(label.as_str()));
            cells.extend(row.data.iter().map(|s| match &s.value {
                None => Cell::Empty,
                Some(SeriesValue::Scalar(v)) => Cell::Number(*v),
                Some(list @ SeriesValue::Hourly(_)) => Cell::List(list.numbers()),
            }));
            rows.push(cells);
        }
    }

    let name = format!("{}_{}", table.name, directory.subject_name(row.subject_id));
    debug!(sheet = %name, rows = rows.len() - 1, "built subject sheet");
    Sheet::new(name, rows)
}

/// One sheet per row of a report table
pub fn table_document(table: &TableDefinition, directory: &Directory) -> ExportDocument {
    table
        .rows
        .iter()
        .fold(ExportDocument::new(), |doc, row| doc.sheet(subject_sheet(table, row, directory)))
}

// ============================================================================
// Plans
// ============================================================================

/// Coefficient/volume sheet in the importable layout
pub fn plan_sheet(plan: &PlanEditor, shape: ImportShape) -> Sheet {
    Sheet::new(shape.sheet_name(), plan.export_rows(shape))
}

fn plan_header(has_generation: bool, subject: bool, messages: bool) -> Vec<Cell> {
    let mut header = vec![Cell::text("Time")];
    header.extend(
        PlanSeries::applicable(has_generation)
            .into_iter()
            .map(|s| Cell::text(s.column_name())),
    );
    if subject {
        header.extend(
            ["Coefficient", "Coefficient_Gen", "Volume", "Volume_Gen"]
                .into_iter()
                .map(Cell::from),
        );
    }
    header.push(Cell::text("P2_Message"));
    if subject {
        header.push(Cell::text("P2_Gen_message"));
        if messages {
            header.push(Cell::text("Message"));
        }
    }
    header
}

fn series_value(record: &HourRecord, series: PlanSeries) -> f64 {
    match series {
        PlanSeries::P2 => record.display_p2(),
        PlanSeries::P2Gen => record.display_p2_gen(),
        other => other.value(record),
    }
}

fn plan_row(record: &HourRecord, has_generation: bool, subject: bool, messages: bool) -> Vec<Cell> {
    let mut row = vec![Cell::text(hour_interval_label(record.hour))];
    row.extend(
        PlanSeries::applicable(has_generation)
            .into_iter()
            .map(|s| Cell::Number(series_value(record, s))),
    );
    if subject {
        row.extend(
            [
                record.coefficient,
                record.coefficient_gen,
                record.volume,
                record.volume_gen,
            ]
            .map(Cell::Number),
        );
    }
    row.push(Cell::text(record.p2_message.as_str()));
    if subject {
        row.push(Cell::text(record.p2_gen_message.as_str()));
        if messages {
            row.push(Cell::text(record.message.as_str()));
        }
    }
    row
}

/// Records for hours 1..=24, defaults where a record is missing
fn day_records(records: &[HourRecord]) -> Vec<HourRecord> {
    (1..=HOURS_PER_DAY as u8)
        .map(|hour| {
            records
                .iter()
                .find(|r| r.hour == hour)
                .cloned()
                .unwrap_or_else(|| HourRecord::new(hour))
        })
        .collect()
}

/// The "Full Export" sheet: the subject's plan followed by one block per object.
///
/// Gen columns appear only for entities with generation; the message
/// column only while the plan shows messages.
pub fn full_export_sheet(
    directory: &Directory,
    subject: SubjectId,
    plan: &PlanEditor,
    object_hours: &[(ObjectId, Vec<HourRecord>)],
) -> Sheet {
    let subject_gen = directory
        .subject(subject)
        .is_some_and(|s| s.subject_type.has_generation());
    let messages = plan.show_messages();

    let mut rows = vec![
        vec![Cell::text("Subject:"), Cell::text(directory.subject_name(subject))],
        vec![],
        vec![Cell::text("Subject Table")],
        plan_header(subject_gen, true, messages),
    ];
    rows.extend(
        plan.hours()
            .iter()
            .map(|r| plan_row(r, subject_gen, true, messages)),
    );
    rows.push(vec![]);

    for (object, hours) in object_hours {
        let object_gen = directory
            .object(*object)
            .is_some_and(|o| o.object_type.has_generation());
        rows.push(vec![Cell::text("Object:"), Cell::text(directory.object_name(*object))]);
        rows.push(vec![]);
        rows.push(plan_header(object_gen, false, false));
        rows.extend(
            day_records(hours)
                .iter()
                .map(|r| plan_row(r, object_gen, false, false)),
        );
        rows.push(vec![]);
    }

    Sheet::new(FULL_EXPORT_SHEET, rows)
}
