//! Decoders for the service's JSON payloads.
//!
//! Optional fields are defaulted by the core types; nothing beyond that is
//! validated.

use serde::de::DeserializeOwned;

use tariffgrid_core::{Directory, HourRecord, StatusMap, TableDefinition, TariffDirection};

use crate::ParseError;

fn decode<T: DeserializeOwned>(what: &'static str, input: &str) -> Result<T, ParseError> {
    serde_json::from_str(input).map_err(|source| ParseError::Json { what, source })
}

/// Hour records of a subject or object plan
pub fn decode_hours(input: &str) -> Result<Vec<HourRecord>, ParseError> {
    decode("hour records", input)
}

/// Report tables; a single table object is accepted as a one-element list
pub fn decode_tables(input: &str) -> Result<Vec<TableDefinition>, ParseError> {
    let value: serde_json::Value = decode("table definitions", input)?;
    let tables = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|t| vec![t])
    };
    tables.map_err(|source| ParseError::Json {
        what: "table definitions",
        source,
    })
}

pub fn decode_directory(input: &str) -> Result<Directory, ParseError> {
    decode("directory", input)
}

pub fn decode_directions(input: &str) -> Result<Vec<TariffDirection>, ParseError> {
    decode("tariff directions", input)
}

pub fn decode_statuses(input: &str) -> Result<StatusMap, ParseError> {
    decode("plan statuses", input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tariffgrid_core::{GroupMode, PlanStatus, SeriesValue, SubjectType};

    #[test]
    fn hours_with_missing_fields() {
        let hours = decode_hours(r#"[{"hour": 1, "P1": 12}, {"hour": 2, "coefficient": "0.8"}]"#)
            .unwrap();
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].p1, 12.0);
        assert_eq!(hours[0].coefficient, 1.0);
        assert_eq!(hours[1].coefficient, 0.8);
    }

    #[test]
    fn table_definition_with_hourly_series() {
        let input = r#"{
            "name": "Потребление",
            "startDate": "2024-01-01",
            "endDate": "",
            "groupByDate": false,
            "groupByHour": true,
            "tableConfig": [{
                "subject": 4,
                "objects": [7],
                "data": [{
                    "name": "P1",
                    "value": [1, 2, null],
                    "date_value": [{"date": "2024-01-01", "value": [{"hour": 1, "value": 5}]}]
                }]
            }]
        }"#;
        let tables = decode_tables(input).unwrap();
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.mode(), GroupMode::ByDateHour);
        assert_eq!(table.end_date, None);
        let series = &table.rows[0].data[0];
        assert!(matches!(series.value, Some(SeriesValue::Hourly(ref h)) if h.len() == 3));
        assert!(table.rows[0].has_dated_points());
    }

    #[test]
    fn table_list() {
        let tables = decode_tables(r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].name, "B");
    }

    #[test]
    fn directory_types() {
        let directory = decode_directory(
            r#"{"subjects": [{"id": 1, "subject_name": "Alpha", "subject_type": "ВИЭ"}],
                "objects": [{"id": 10, "object_name": "North", "subject": 1}]}"#,
        )
        .unwrap();
        assert_eq!(directory.subjects[0].subject_type, SubjectType::Vie);
        assert_eq!(directory.row_label(1, &[10]), "Alpha (North)");
    }

    #[test]
    fn statuses_and_directions() {
        let statuses = decode_statuses(r#"{"P1_Status": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(statuses["P1_Status"], PlanStatus::InProgress);
        let directions =
            decode_directions(r#"[{"date": "2024-02-01", "hour": 3, "direction": "UP"}]"#).unwrap();
        assert_eq!(directions[0].hour, 3);
    }

    #[test]
    fn errors_name_the_payload() {
        let err = decode_hours("{").unwrap_err();
        assert!(err.to_string().contains("hour records"));
    }
}
