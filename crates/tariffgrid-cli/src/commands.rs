//! Command implementations.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use tariffgrid_core::fetch::fetch_statuses;
use tariffgrid_core::status::{badges, completed_summary, NO_DATA};
use tariffgrid_core::timegrid::month_days;
use tariffgrid_core::{
    dates, BadgeMode, CellKey, DirectionGrid, Directory, ExpansionState, GroupMode, ImportShape,
    ObjectId, PlanCall, PlanSession, RowKey, SeriesValue, StatusMap, SubjectId, TableDefinition,
    Target, Tone, VisibilityState,
};
use tariffgrid_parser::{decode_directions, decode_tables, detect_format, import_plan, FileFormat};
use tariffgrid_render::text::render_month;
use tariffgrid_render::{
    export_filename, full_export_sheet, plan_sheet, subject_sheet, truncate_sheet_name,
    ExportDocument, SpreadsheetExporter, TextRenderer,
};
use tariffgrid_table::{project_main, project_row};

use crate::config::Config;
use crate::source::DirectorySource;

/// Shown for a grouped row that has no dated points
const NO_ROWS: &str = "Нет данных для отображения";

pub fn month(year: i32, month: i32) -> Result<()> {
    print!("{}", render_month(&month_days(year, month)));
    Ok(())
}

// ============================================================================
// Report tables
// ============================================================================

/// Expand every hourly cell of one table
fn expand_all(table: &TableDefinition, index: usize) -> ExpansionState {
    let mut state = ExpansionState::new();
    for (row, table_row) in table.rows.iter().enumerate() {
        for (col, series) in table_row.data.iter().enumerate() {
            if matches!(series.value, Some(SeriesValue::Hourly(_))) {
                state.toggle(CellKey::new(index, row, col));
            }
        }
    }
    state
}

/// Render one table: the flat rows, then each visible row's grouped breakdown
fn render_table(
    table: &TableDefinition,
    index: usize,
    directory: &Directory,
    expansion: &ExpansionState,
    visibility: &VisibilityState,
) -> String {
    let renderer = TextRenderer::new();
    let mode = table.mode();
    let names = table.series_names();
    let mut out = format!("{}\n", table.name);

    let main: Vec<_> = project_main(&table.rows, mode, expansion, index)
        .into_iter()
        .filter(|row| visibility.is_visible(&row.key))
        .map(|row| (directory.row_label(row.key.subject, &row.key.objects), row))
        .collect();
    out.push_str(&renderer.render_main(&names, &main));

    if mode.is_grouped() {
        for row in &table.rows {
            let key = RowKey::new(row.subject_id, &row.object_ids);
            if !visibility.is_visible(&key) {
                continue;
            }
            let _ = writeln!(out, "\n{}", directory.row_label(row.subject_id, &row.object_ids));
            match project_row(row, mode) {
                Some(projected) => {
                    let with_hour = mode == GroupMode::ByDateHour;
                    out.push_str(&renderer.render_grouped(&row.series_names(), &projected, with_hour));
                }
                None => {
                    let _ = writeln!(out, "{NO_ROWS}");
                }
            }
        }
    }
    out
}

pub async fn table(
    config: &Config,
    file: &Path,
    xlsx: Option<&Path>,
    expand: bool,
    hide: &[SubjectId],
) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read table file: {}", file.display()))?;
    let tables = decode_tables(&content)?;
    let directory = DirectorySource::new(&config.data_dir).directory().await?;

    if let Some(dir) = xlsx {
        return export_tables(&tables, &directory, dir).await;
    }

    let mut visibility = VisibilityState::new();
    for table in &tables {
        for row in table.rows.iter().filter(|r| hide.contains(&r.subject_id)) {
            visibility.set_visible(RowKey::new(row.subject_id, &row.object_ids), false);
        }
    }

    for (index, table) in tables.iter().enumerate() {
        let expansion = if expand {
            expand_all(table, index)
        } else {
            ExpansionState::new()
        };
        println!("{}", render_table(table, index, &directory, &expansion, &visibility));
    }
    if visibility.hidden_count() > 0 {
        info!(hidden = visibility.hidden_count(), "rows hidden");
    }
    Ok(())
}

/// File stem not taken yet in this export; later duplicates get `_2`, `_3`, ...
///
/// Compared case-insensitively since the target filesystem may be.
fn unique_stem(taken: &mut HashSet<String>, stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut n = 1;
    while !taken.insert(candidate.to_lowercase()) {
        n += 1;
        candidate = format!("{stem}_{n}");
    }
    if n > 1 {
        warn!(stem, file = %candidate, "duplicate export name, suffixed");
    }
    candidate
}

/// One workbook per table row, named after its sheet
async fn export_tables(tables: &[TableDefinition], directory: &Directory, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let exporter = SpreadsheetExporter::new();
    let mut taken = HashSet::new();
    for table in tables {
        for row in &table.rows {
            let sheet = subject_sheet(table, row, directory);
            let stem = unique_stem(&mut taken, &truncate_sheet_name(&sheet.name));
            let path = dir.join(format!("{stem}.xlsx"));
            let bytes = exporter.export(&ExportDocument::new().sheet(sheet))?;
            write_file(&path, &bytes).await?;
        }
    }
    Ok(())
}

// ============================================================================
// Plans
// ============================================================================

/// Directory plus a session loaded for one subject
async fn load_plan(
    config: &Config,
    subject: SubjectId,
    date: NaiveDate,
) -> Result<(DirectorySource, Directory, PlanSession)> {
    let source = DirectorySource::new(&config.data_dir);
    let directory = source.directory().await?;
    let objects: Vec<ObjectId> = directory.objects_of(subject).iter().map(|o| o.id).collect();

    let mut session = PlanSession::with_notice_ttl(config.notice_ttl());
    session
        .load(&source, Target::Subject(subject), date, &objects)
        .await;
    Ok((source, directory, session))
}

fn tone_mark(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "+",
        Tone::Warning => "~",
        Tone::Danger => "!",
        Tone::Neutral => "o",
        Tone::Unstyled => "",
    }
}

/// `П1+ П2~ П3o Ф!`, or "no data"
fn badge_line(statuses: Option<&StatusMap>, mode: BadgeMode) -> String {
    badges(statuses, mode).map_or_else(
        || NO_DATA.to_string(),
        |badges| {
            badges
                .iter()
                .map(|b| format!("{}{}", b.label, tone_mark(b.tone)))
                .collect::<Vec<_>>()
                .join(" ")
        },
    )
}

pub async fn plan_show(config: &Config, subject: SubjectId, date: NaiveDate) -> Result<()> {
    let (source, directory, session) = load_plan(config, subject, date).await?;
    let kind = directory
        .subject(subject)
        .map(|s| s.subject_type.clone())
        .unwrap_or_default();

    if let Some(notice) = session.notices().current(Instant::now()) {
        eprintln!("{notice}");
    }

    println!("{}  {}", directory.subject_name(subject), date.format(dates::FORMAT));
    println!("{}", badge_line(session.statuses(), BadgeMode::for_subject(&kind)));
    for object in directory.objects_of(subject) {
        let statuses = fetch_statuses(&source, date, Target::Object(object.id)).await;
        println!("  {}: {}", object.object_name, completed_summary(statuses.as_ref()));
    }
    println!();
    print!(
        "{}",
        TextRenderer::new().render_plan(session.editor(), kind.has_generation())
    );
    Ok(())
}

fn default_output(config: &Config, output: Option<PathBuf>, label: &str, date: NaiveDate) -> PathBuf {
    output.unwrap_or_else(|| config.output_dir.join(export_filename(label, date)))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub async fn plan_export(
    config: &Config,
    subject: SubjectId,
    date: NaiveDate,
    gen: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, _, session) = load_plan(config, subject, date).await?;
    let shape = if gen {
        ImportShape::Generation
    } else {
        ImportShape::Consumption
    };
    let document = ExportDocument::new().sheet(plan_sheet(session.editor(), shape));
    let bytes = SpreadsheetExporter::new().export(&document)?;
    let path = default_output(config, output, &format!("plan_{subject}"), date);
    write_file(&path, &bytes).await
}

pub async fn plan_import(
    config: &Config,
    subject: SubjectId,
    date: NaiveDate,
    file: &Path,
    approve: bool,
) -> Result<()> {
    if detect_format(file) != FileFormat::Spreadsheet {
        anyhow::bail!("Expected an .xlsx workbook: {}", file.display());
    }
    let (_, _, mut session) = load_plan(config, subject, date).await?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read workbook: {}", file.display()))?;
    let report = import_plan(session.editor_mut(), &bytes)
        .with_context(|| format!("Failed to import {}", file.display()))?;
    if !report.skipped.is_empty() {
        eprintln!("Skipped {} row(s)", report.skipped.len());
    }

    let call = if approve {
        PlanCall::Calculate
    } else {
        PlanCall::Save
    };
    let payload = session.editor().save_payload(subject, date, call);
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

pub async fn full_export(
    config: &Config,
    subject: SubjectId,
    date: NaiveDate,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, directory, session) = load_plan(config, subject, date).await?;
    let sheet = full_export_sheet(&directory, subject, session.editor(), session.object_hours());
    let bytes = SpreadsheetExporter::new().export(&ExportDocument::new().sheet(sheet))?;
    let path = default_output(config, output, "full_export", date);
    write_file(&path, &bytes).await
}

// ============================================================================
// Directions
// ============================================================================

pub async fn directions(file: &Path, year: i32, month: i32) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read directions file: {}", file.display()))?;
    let records = decode_directions(&content)?;
    let grid = DirectionGrid::for_month(year, month, &records);
    print!("{}", TextRenderer::new().render_directions(&grid));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariffgrid_core::{HourValue, NamedSeries, PlanStatus, SeriesPoint, Subject, TableRow};

    fn directory() -> Directory {
        Directory::new(vec![Subject::new(1, "Alpha"), Subject::new(2, "Beta")], vec![])
    }

    fn hourly_table() -> TableDefinition {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut table = TableDefinition::new("Hourly");
        table.rows = vec![
            TableRow::new(1).series(
                NamedSeries::new("A").value(SeriesValue::Hourly(vec![HourValue::new(1, 2.0)])),
            ),
            TableRow::new(2).series(
                NamedSeries::new("A").point(SeriesPoint::scalar(day, 4.0)),
            ),
        ];
        table
    }

    #[test]
    fn duplicate_stems_get_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(unique_stem(&mut taken, "Alpha"), "Alpha");
        assert_eq!(unique_stem(&mut taken, "alpha"), "alpha_2");
        assert_eq!(unique_stem(&mut taken, "Alpha"), "Alpha_3");
        assert_eq!(unique_stem(&mut taken, "Beta"), "Beta");
    }

    #[test]
    fn flat_table_collapses_lists_until_expanded() {
        let table = hourly_table();
        let out = render_table(
            &table,
            0,
            &directory(),
            &ExpansionState::new(),
            &VisibilityState::new(),
        );
        assert!(out.contains(tariffgrid_table::SHOW_LIST));

        let out = render_table(
            &table,
            0,
            &directory(),
            &expand_all(&table, 0),
            &VisibilityState::new(),
        );
        assert!(!out.contains(tariffgrid_table::SHOW_LIST));
        assert!(out.lines().any(|l| l.starts_with("Alpha") && l.ends_with('2')));
    }

    #[test]
    fn grouped_table_lists_each_row() {
        let mut table = hourly_table();
        table.group_by_date = true;
        let out = render_table(&table, 0, &directory(), &ExpansionState::new(), &VisibilityState::new());
        assert!(out.contains(NO_ROWS));
        assert!(out.contains("2024-01-01"));
    }

    #[test]
    fn hidden_rows_are_skipped() {
        let mut visibility = VisibilityState::new();
        visibility.set_visible(RowKey::new(2, &[]), false);
        let out = render_table(&hourly_table(), 0, &directory(), &ExpansionState::new(), &visibility);
        assert!(out.contains("Alpha"));
        assert!(!out.contains("Beta"));
    }

    #[test]
    fn badges_fall_back_to_no_data() {
        assert_eq!(badge_line(None, BadgeMode::Regular), NO_DATA);
        let statuses = StatusMap::from([("P1_Status".to_string(), PlanStatus::Completed)]);
        assert!(badge_line(Some(&statuses), BadgeMode::Regular).starts_with("П1+"));
    }
}
