//! End-to-end tests of the `tariffgrid` binary
//!
//! Each test builds a data directory in a tempdir and runs the binary
//! with its working directory there, so no stray `tariffgrid.toml` is
//! picked up.

use calamine::{Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DIRECTORY: &str = r#"{
    "subjects": [
        {"id": 4, "subject_name": "Alpha", "subject_type": "CONSUMER"},
        {"id": 5, "subject_name": "Hydro", "subject_type": "ГЭС"}
    ],
    "objects": [
        {"id": 7, "object_name": "North", "subject": 5, "object_type": "CONSUMER"}
    ]
}"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Data directory with one consumer plan on 2024-01-15
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    write(&data, "directory.json", DIRECTORY);
    write(
        &data,
        "hours/2024-01-15/subject-4.json",
        r#"[{"hour": 1, "P1": 100, "coefficient": 1.1, "volume": 5}]"#,
    );
    write(
        &data,
        "statuses/2024-01-15/subject-4.json",
        r#"{"P1_Status": "COMPLETED", "P2_Status": "IN_PROGRESS"}"#,
    );
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tariffgrid"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("TARIFFGRID_DATA_DIR")
        .args(args)
        .output()
        .expect("failed to execute tariffgrid")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn first_sheet(path: &Path) -> Vec<Vec<Data>> {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"PK"));
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();
    range.rows().map(<[Data]>::to_vec).collect()
}

// =============================================================================
// month / directions
// =============================================================================

#[test]
fn month_lists_leap_february() {
    let dir = workspace();
    let output = run(dir.path(), &["month", "2024", "2"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 29);
    assert!(text.starts_with("01.02.2024"));
}

#[test]
fn month_rolls_over_year() {
    let dir = workspace();
    let output = run(dir.path(), &["month", "2024", "13"]);
    assert!(stdout(&output).starts_with("01.01.2025"));
}

#[test]
fn month_out_of_range_year_prints_nothing() {
    let dir = workspace();
    let output = run(dir.path(), &["month", "2147483647", "13"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn directions_grid() {
    let dir = workspace();
    write(
        dir.path(),
        "directions.json",
        r#"[{"date": "2024-02-01", "hour": 1, "direction": "UP"},
            {"date": "2024-02-02", "hour": 24, "direction": "DOWN"},
            {"date": "2024-03-01", "hour": 1, "direction": "UP"}]"#,
    );
    let output = run(
        dir.path(),
        &["directions", "directions.json", "--year", "2024", "--month", "2"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 30);
    assert!(lines[1].starts_with("01.02.2024") && lines[1].contains('↑'));
    assert!(lines[2].ends_with('↓'));
}

// =============================================================================
// plan
// =============================================================================

#[test]
fn plan_show_prints_derived_p2_and_badges() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["plan", "show", "--subject", "4", "--date", "2024-01-15"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Alpha  2024-01-15"));
    assert!(text.contains("П1+ П2~"));
    assert!(text.contains("115.00"));
    assert!(text.contains("Сумма"));
    assert!(!text.contains("P1_Gen"));
}

#[test]
fn plan_show_missing_data_raises_notice() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["plan", "show", "--subject", "5", "--date", "2024-01-15"],
    );
    assert!(output.status.success());
    assert!(stderr(&output).contains("Не удалось загрузить данные"));
    let text = stdout(&output);
    assert!(text.contains("Нет данных"));
    assert!(text.contains("North: Нет данных"));
    // default hours still render
    assert!(text.contains("23 - 00"));
}

#[test]
fn plan_export_then_import() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &[
            "plan", "export", "--subject", "4", "--date", "2024-01-15", "-o", "out/plan.xlsx",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let rows = first_sheet(&dir.path().join("out/plan.xlsx"));
    assert_eq!(rows.len(), 25);
    assert_eq!(rows[0][0], Data::String("Hour".into()));
    assert_eq!(rows[1][1], Data::Float(1.1));

    let output = run(
        dir.path(),
        &[
            "plan", "import", "--subject", "4", "--date", "2024-01-15", "out/plan.xlsx",
            "--approve",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let payload: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(payload["call"], "calculate");
    assert_eq!(payload["subject"], 4);
    assert_eq!(payload["date"], "2024-01-15");
    assert_eq!(payload["plan"]["coefficient"][0], 1.1);
    assert_eq!(payload["plan"]["volume"][0], 5.0);
    assert_eq!(payload["plan"]["coefficient"].as_array().map(Vec::len), Some(24));
}

#[test]
fn plan_import_rejects_unreadable_file() {
    let dir = workspace();
    write(dir.path(), "plan.xlsx", "Hour,Coefficient,Volume\n");
    let output = run(
        dir.path(),
        &["plan", "import", "--subject", "4", "--date", "2024-01-15", "plan.xlsx"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unreadable workbook"));
}

#[test]
fn plan_import_requires_xlsx_extension() {
    let dir = workspace();
    write(dir.path(), "plan.json", "[]");
    let output = run(
        dir.path(),
        &["plan", "import", "--subject", "4", "--date", "2024-01-15", "plan.json"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Expected an .xlsx workbook"));
}

#[test]
fn full_export_defaults_to_output_dir() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &[
            "full-export", "--subject", "5", "--date", "2024-01-15", "--output-dir", "exports",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let rows = first_sheet(&dir.path().join("exports/full_export_2024-01-15.xlsx"));
    assert_eq!(rows[0][0], Data::String("Subject:".into()));
    assert_eq!(rows[0][1], Data::String("Hydro".into()));
    assert!(rows
        .iter()
        .any(|r| r.first() == Some(&Data::String("Object:".into()))
            && r.get(1) == Some(&Data::String("North".into()))));
}

// =============================================================================
// table
// =============================================================================

const TABLE: &str = r#"{
    "name": "Потребление",
    "groupByDate": true,
    "tableConfig": [{
        "subject": 4,
        "data": [
            {"name": "P1", "date_value": [{"date": "2024-01-01", "value": 10}]},
            {"name": "P2", "date_value": [{"date": "2024-01-01", "value": null}]}
        ]
    }, {
        "subject": 5,
        "objects": [7],
        "data": [{"name": "P1"}, {"name": "P2"}]
    }]
}"#;

#[test]
fn table_prints_grouped_rows() {
    let dir = workspace();
    write(dir.path(), "table.json", TABLE);
    let output = run(dir.path(), &["table", "table.json"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("Потребление"));
    assert!(text.contains("Hydro (North)"));
    assert!(text
        .lines()
        .any(|l| l.starts_with("2024-01-01") && l.contains("10") && l.ends_with('-')));
    assert!(text.contains("Нет данных для отображения"));
}

#[test]
fn table_hides_rows() {
    let dir = workspace();
    write(dir.path(), "table.json", TABLE);
    let output = run(dir.path(), &["table", "table.json", "--hide", "5"]);
    assert!(!stdout(&output).contains("Hydro"));
}

#[test]
fn table_xlsx_writes_a_workbook_per_row() {
    let dir = workspace();
    write(dir.path(), "table.json", TABLE);
    let output = run(dir.path(), &["table", "table.json", "--xlsx", "sheets"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let rows = first_sheet(&dir.path().join("sheets/Потребление_Alpha.xlsx"));
    assert_eq!(rows[0][0], Data::String("Дата".into()));
    assert_eq!(rows[1][2], Data::Float(10.0));
    assert!(dir.path().join("sheets/Потребление_Hydro.xlsx").exists());
}

#[test]
fn table_xlsx_keeps_rows_of_the_same_subject() {
    let dir = workspace();
    write(
        dir.path(),
        "table.json",
        r#"{
            "name": "Потребление",
            "groupByDate": true,
            "tableConfig": [
                {"subject": 4, "data": [{"name": "P1", "date_value": [{"date": "2024-01-01", "value": 1}]}]},
                {"subject": 4, "data": [{"name": "P1", "date_value": [{"date": "2024-01-01", "value": 2}]}]}
            ]
        }"#,
    );
    let output = run(dir.path(), &["table", "table.json", "--xlsx", "sheets"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let first = first_sheet(&dir.path().join("sheets/Потребление_Alpha.xlsx"));
    let second = first_sheet(&dir.path().join("sheets/Потребление_Alpha_2.xlsx"));
    assert_eq!(first[1][2], Data::Float(1.0));
    assert_eq!(second[1][2], Data::Float(2.0));
    assert!(stderr(&output).contains("duplicate export name"));
}

// =============================================================================
// config
// =============================================================================

#[test]
fn config_file_sets_data_dir() {
    let dir = workspace();
    std::fs::rename(dir.path().join("data"), dir.path().join("elsewhere")).unwrap();
    write(dir.path(), "tariffgrid.toml", "data_dir = \"elsewhere\"\n");
    let output = run(
        dir.path(),
        &["plan", "show", "--subject", "4", "--date", "2024-01-15"],
    );
    assert!(stdout(&output).contains("115.00"));
}

#[test]
fn malformed_config_fails() {
    let dir = workspace();
    write(dir.path(), "tariffgrid.toml", "data_dir = [");
    let output = run(dir.path(), &["month", "2024", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to parse config TOML"));
}

#[test]
fn missing_named_config_fails() {
    let dir = workspace();
    let output = run(dir.path(), &["--config", "nope.toml", "month", "2024", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.toml"));
}
