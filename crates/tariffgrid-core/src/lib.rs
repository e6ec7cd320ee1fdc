//! # tariffgrid-core
//!
//! Core domain model and plan editing for the tariffgrid dispatch tables.
//!
//! This crate provides:
//! - Domain types: `Subject`, `DispatchObject`, `HourRecord`, `SeriesPoint`, `TableRow`
//! - The 24-slot hour plan editor (`PlanEditor`) with spreadsheet import
//! - Time axis helpers (`timegrid`), status labels, column summaries, direction grids
//! - The async fetch boundary with a generation guard against stale responses
//! - Error types shared by every crate in the workspace
//!
//! ## Example
//!
//! ```rust
//! use tariffgrid_core::{Cell, PlanEditor};
//!
//! let mut plan = PlanEditor::new();
//! plan.set_coefficient(1, 0.5).unwrap();
//!
//! let rows = vec![
//!     vec![Cell::text("Hour"), Cell::text("Coefficient"), Cell::text("Volume")],
//!     vec![Cell::Number(2.0), Cell::text("1.5"), Cell::text("20")],
//! ];
//! let report = plan.import_rows(&rows).unwrap();
//! assert_eq!(report.applied, 1);
//! assert_eq!(plan.hour(2).unwrap().coefficient, 1.5);
//! // import is a full overwrite
//! assert_eq!(plan.hour(1).unwrap().coefficient, 1.0);
//! ```

pub mod directions;
pub mod fetch;
pub mod notice;
pub mod plan;
pub mod record;
pub mod status;
pub mod summary;
pub mod timegrid;
pub mod view;

pub use directions::{Direction, DirectionGrid, TariffDirection};
pub use fetch::{PlanFetch, PlanSession, RecordSource, SelectionGuard, Target, Ticket};
pub use notice::NoticeBoard;
pub use plan::{ImportReport, ImportShape, PlanCall, PlanEditor, SkipReason, SkippedRow};
pub use record::{HourRecord, PlanSeries};
pub use status::{Badge, BadgeMode, PlanStatus, StatusMap, Tone};
pub use summary::ColumnSummary;
pub use view::{CellKey, ExpansionState, RowKey, VisibilityState};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a market participant
pub type SubjectId = u32;

/// Identifier of a site owned by a subject
pub type ObjectId = u32;

/// Rendered in place of a missing value. Zero is a measurement, this is not.
pub const PLACEHOLDER: &str = "-";

// ============================================================================
// Subjects and Objects
// ============================================================================

/// Kind of market participant
///
/// Consumers and regional grid companies have no generation side; every
/// other kind reports both consumption and `_Gen` series.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubjectType {
    Consumer,
    /// Regional grid company ("РЭК")
    Rek,
    /// Renewable producer ("ВИЭ")
    Vie,
    Other(String),
}

impl SubjectType {
    /// Whether `_Gen` series apply to this kind
    pub fn has_generation(&self) -> bool {
        !matches!(self, Self::Consumer | Self::Rek)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Consumer => "CONSUMER",
            Self::Rek => "РЭК",
            Self::Vie => "ВИЭ",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for SubjectType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CONSUMER" => Self::Consumer,
            "РЭК" => Self::Rek,
            "ВИЭ" => Self::Vie,
            _ => Self::Other(s),
        }
    }
}

impl From<SubjectType> for String {
    fn from(t: SubjectType) -> Self {
        t.as_str().to_string()
    }
}

impl Default for SubjectType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// A top-level energy-market participant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub subject_name: String,
    #[serde(default)]
    pub subject_type: SubjectType,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            subject_name: name.into(),
            subject_type: SubjectType::default(),
        }
    }

    /// Set the subject type
    pub fn kind(mut self, kind: SubjectType) -> Self {
        self.subject_type = kind;
        self
    }
}

/// A physical site owned by a subject
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchObject {
    pub id: ObjectId,
    pub object_name: String,
    /// Owning subject
    pub subject: SubjectId,
    #[serde(default)]
    pub object_type: SubjectType,
}

impl DispatchObject {
    pub fn new(id: ObjectId, name: impl Into<String>, subject: SubjectId) -> Self {
        Self {
            id,
            object_name: name.into(),
            subject,
            object_type: SubjectType::default(),
        }
    }

    /// Set the object type
    pub fn kind(mut self, kind: SubjectType) -> Self {
        self.object_type = kind;
        self
    }
}

/// Name lookup for subjects and objects
///
/// Rows only carry ids; display labels are resolved here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub objects: Vec<DispatchObject>,
}

impl Directory {
    pub fn new(subjects: Vec<Subject>, objects: Vec<DispatchObject>) -> Self {
        Self { subjects, objects }
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&DispatchObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects owned by a subject, in directory order
    pub fn objects_of(&self, subject: SubjectId) -> Vec<&DispatchObject> {
        self.objects.iter().filter(|o| o.subject == subject).collect()
    }

    /// Subject name, or `#<id>` when unknown
    pub fn subject_name(&self, id: SubjectId) -> String {
        self.subject(id)
            .map(|s| s.subject_name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Object name, or `#<id>` when unknown
    pub fn object_name(&self, id: ObjectId) -> String {
        self.object(id)
            .map(|o| o.object_name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Display label for a table row: `Subject` or `Subject (Obj A, Obj B)`
    pub fn row_label(&self, subject: SubjectId, objects: &[ObjectId]) -> String {
        let name = self.subject_name(subject);
        if objects.is_empty() {
            return name;
        }
        let objects: Vec<String> = objects.iter().map(|id| self.object_name(*id)).collect();
        format!("{} ({})", name, objects.join(", "))
    }
}

// ============================================================================
// Series
// ============================================================================

/// One hour's reading inside an hourly series value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourValue {
    pub hour: u8,
    pub value: Option<f64>,
}

impl HourValue {
    pub fn new(hour: u8, value: impl Into<Option<f64>>) -> Self {
        Self {
            hour,
            value: value.into(),
        }
    }
}

/// A reading that is either one number for the date or one number per hour
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Scalar(f64),
    Hourly(Vec<HourValue>),
}

impl SeriesValue {
    pub fn is_hourly(&self) -> bool {
        matches!(self, Self::Hourly(_))
    }

    /// Flat list of the contained numbers, missing hourly values skipped
    pub fn numbers(&self) -> Vec<f64> {
        match self {
            Self::Scalar(v) => vec![*v],
            Self::Hourly(hours) => hours.iter().filter_map(|h| h.value).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesValueRepr {
    Scalar(f64),
    Keyed(Vec<HourValue>),
    Bare(Vec<Option<f64>>),
}

impl From<SeriesValueRepr> for SeriesValue {
    fn from(repr: SeriesValueRepr) -> Self {
        match repr {
            SeriesValueRepr::Scalar(v) => Self::Scalar(v),
            SeriesValueRepr::Keyed(hours) => Self::Hourly(hours),
            // bare arrays are positional: element 0 is hour 1
            SeriesValueRepr::Bare(values) => Self::Hourly(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| HourValue {
                        hour: (i + 1) as u8,
                        value,
                    })
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for SeriesValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SeriesValueRepr::deserialize(deserializer).map(Into::into)
    }
}

/// One named resource's reading for a date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "dates")]
    pub date: NaiveDate,
    #[serde(default)]
    pub value: Option<SeriesValue>,
}

impl SeriesPoint {
    pub fn scalar(date: NaiveDate, value: impl Into<Option<f64>>) -> Self {
        Self {
            date,
            value: value.into().map(SeriesValue::Scalar),
        }
    }

    pub fn hourly(date: NaiveDate, hours: Vec<HourValue>) -> Self {
        Self {
            date,
            value: Some(SeriesValue::Hourly(hours)),
        }
    }
}

/// A named column of a report row
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    /// Un-grouped reading shown in the flat table
    #[serde(default)]
    pub value: Option<SeriesValue>,
    /// Dated readings used by the grouped tables
    #[serde(default)]
    pub date_value: Vec<SeriesPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the flat value
    pub fn value(mut self, value: SeriesValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Append a dated point
    pub fn point(mut self, point: SeriesPoint) -> Self {
        self.date_value.push(point);
        self
    }
}

// ============================================================================
// Tables
// ============================================================================

/// One row of a report table: a subject, a subset of its objects and its columns
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "subject")]
    pub subject_id: SubjectId,
    #[serde(rename = "objects", default)]
    pub object_ids: Vec<ObjectId>,
    #[serde(default)]
    pub data: Vec<NamedSeries>,
}

impl TableRow {
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            ..Self::default()
        }
    }

    /// Restrict the row to these objects
    pub fn objects(mut self, objects: Vec<ObjectId>) -> Self {
        self.object_ids = objects;
        self
    }

    /// Add a column
    pub fn series(mut self, series: NamedSeries) -> Self {
        self.data.push(series);
        self
    }

    /// Column names in row order
    pub fn series_names(&self) -> Vec<&str> {
        self.data.iter().map(|s| s.name.as_str()).collect()
    }

    /// Whether the first column carries dated points
    pub fn has_dated_points(&self) -> bool {
        self.data.first().is_some_and(|s| !s.date_value.is_empty())
    }
}

/// How a report table groups its dated readings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    #[default]
    None,
    ByDate,
    ByDateHour,
}

impl GroupMode {
    /// Resolve the two table checkboxes; grouping by hour wins
    pub fn from_flags(by_date: bool, by_hour: bool) -> Self {
        if by_hour {
            Self::ByDateHour
        } else if by_date {
            Self::ByDate
        } else {
            Self::None
        }
    }

    pub fn is_grouped(self) -> bool {
        self != Self::None
    }
}

/// A configured report table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: String,
    #[serde(default, with = "dates::option")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "dates::option")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub group_by_date: bool,
    #[serde(default)]
    pub group_by_hour: bool,
    #[serde(rename = "tableConfig", default)]
    pub rows: Vec<TableRow>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> GroupMode {
        GroupMode::from_flags(self.group_by_date, self.group_by_hour)
    }

    /// Column names, taken from the first row
    pub fn series_names(&self) -> Vec<&str> {
        self.rows.first().map(|r| r.series_names()).unwrap_or_default()
    }
}

// ============================================================================
// Cells
// ============================================================================

/// A display or spreadsheet cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// No value; renders as the placeholder
    Empty,
    Number(f64),
    Text(String),
    /// An hourly value shown inline, joined with ", "
    List(Vec<f64>),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// `Number` for present values, `Empty` otherwise
    pub fn from_value(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Number)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Numeric reading of the cell; text is parsed leniently
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str(PLACEHOLDER),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Serde helpers for `YYYY-MM-DD` dates; ISO datetimes are cut at the `T`
pub mod dates {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    /// Parse a date, ignoring any time part
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let day = raw.split('T').next().unwrap_or(raw);
        NaiveDate::parse_from_str(day.trim(), FORMAT).ok()
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => serializer.collect_str(&d.format(super::FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        /// `null` and `""` both mean unset
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => super::parse(s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Data-fetch failure; callers fall back to an empty result
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Import file rejected as a whole; prior state is untouched
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FormatError {
    #[error("File has no header row")]
    MissingHeader,

    #[error("Unexpected header [{found}]; expected one of: {expected}")]
    HeaderMismatch { expected: String, found: String },

    #[error("Unreadable workbook: {0}")]
    Unreadable(String),
}

/// An hour outside the 1..=24 day axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("Hour {hour} is outside 1..=24")]
pub struct RangeError {
    pub hour: i64,
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn subject_type_generation_side() {
        assert!(!SubjectType::Consumer.has_generation());
        assert!(!SubjectType::Rek.has_generation());
        assert!(SubjectType::Vie.has_generation());
        assert!(SubjectType::from("PRODUCER".to_string()).has_generation());
    }

    #[test]
    fn subject_type_round_trips_through_strings() {
        let subject: Subject =
            serde_json::from_str(r#"{"id": 3, "subject_name": "Грид", "subject_type": "РЭК"}"#)
                .unwrap();
        assert_eq!(subject.subject_type, SubjectType::Rek);
        let json = serde_json::to_string(&subject).unwrap();
        assert!(json.contains(r#""subject_type":"РЭК""#));
    }

    #[test]
    fn row_label_with_and_without_objects() {
        let directory = Directory::new(
            vec![Subject::new(1, "Alpha")],
            vec![
                DispatchObject::new(10, "North", 1),
                DispatchObject::new(11, "South", 1),
            ],
        );
        assert_eq!(directory.row_label(1, &[]), "Alpha");
        assert_eq!(directory.row_label(1, &[10, 11]), "Alpha (North, South)");
        assert_eq!(directory.row_label(7, &[99]), "#7 (#99)");
    }

    #[test]
    fn series_value_accepts_keyed_and_bare_arrays() {
        let keyed: SeriesValue =
            serde_json::from_str(r#"[{"hour": 3, "value": 1.5}, {"hour": 4, "value": null}]"#)
                .unwrap();
        assert_eq!(
            keyed,
            SeriesValue::Hourly(vec![HourValue::new(3, 1.5), HourValue::new(4, None)])
        );

        let bare: SeriesValue = serde_json::from_str("[5, 6]").unwrap();
        assert_eq!(
            bare,
            SeriesValue::Hourly(vec![HourValue::new(1, 5.0), HourValue::new(2, 6.0)])
        );

        let scalar: SeriesValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(scalar, SeriesValue::Scalar(12.5));
    }

    #[test]
    fn series_point_accepts_datetime_and_null() {
        let point: SeriesPoint =
            serde_json::from_str(r#"{"date": "2024-01-01T00:00:00Z", "value": null}"#).unwrap();
        assert_eq!(point.date, date(2024, 1, 1));
        assert_eq!(point.value, None);
    }

    #[test]
    fn table_definition_uses_dashboard_field_names() {
        let json = r#"{
            "name": "Losses",
            "startDate": "2024-03-01",
            "endDate": "",
            "groupByDate": true,
            "tableConfig": [
                {"subject": 1, "objects": [10], "data": [{"name": "A", "value": 4}]}
            ]
        }"#;
        let table: TableDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(table.start_date, Some(date(2024, 3, 1)));
        assert_eq!(table.end_date, None);
        assert_eq!(table.mode(), GroupMode::ByDate);
        assert_eq!(table.series_names(), vec!["A"]);
        assert_eq!(table.rows[0].object_ids, vec![10]);
    }

    #[test]
    fn group_mode_hour_flag_wins() {
        assert_eq!(GroupMode::from_flags(false, false), GroupMode::None);
        assert_eq!(GroupMode::from_flags(true, false), GroupMode::ByDate);
        assert_eq!(GroupMode::from_flags(true, true), GroupMode::ByDateHour);
        assert_eq!(GroupMode::from_flags(false, true), GroupMode::ByDateHour);
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Empty.to_string(), "-");
        assert_eq!(Cell::Number(10.0).to_string(), "10");
        assert_eq!(Cell::Number(0.0).to_string(), "0");
        assert_eq!(Cell::List(vec![1.0, 2.5]).to_string(), "1, 2.5");
        assert_eq!(Cell::text(" 0.5 ").as_number(), Some(0.5));
    }
}
