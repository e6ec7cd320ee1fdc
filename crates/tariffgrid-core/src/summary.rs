//! Per-column sums and averages for a day's hour plan.

use crate::record::{HourRecord, PlanSeries};

/// Series shown in the summary footer, in column order
pub const SUMMARY_SERIES: [PlanSeries; 8] = [
    PlanSeries::P1,
    PlanSeries::P1Gen,
    PlanSeries::P2,
    PlanSeries::P2Gen,
    PlanSeries::P3,
    PlanSeries::P3Gen,
    PlanSeries::F1,
    PlanSeries::F1Gen,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSummary {
    pub series: PlanSeries,
    pub sum: f64,
    /// `sum / rows`, 0 for an empty plan
    pub average: f64,
}

/// Summaries for every applicable series
///
/// `_Gen` series are left out for entities without generation.
pub fn summarize(records: &[HourRecord], has_generation: bool) -> Vec<ColumnSummary> {
    SUMMARY_SERIES
        .into_iter()
        .filter(|s| has_generation || !s.is_gen())
        .map(|series| summarize_series(records, series))
        .collect()
}

pub fn summarize_series(records: &[HourRecord], series: PlanSeries) -> ColumnSummary {
    let sum: f64 = records.iter().map(|r| series.value(r)).sum();
    let average = if records.is_empty() {
        0.0
    } else {
        sum / records.len() as f64
    };
    ColumnSummary {
        series,
        sum,
        average,
    }
}

/// Records sorted by hour, the order the plan table shows them in
pub fn sorted_by_hour(records: &[HourRecord]) -> Vec<HourRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.hour);
    sorted
}
