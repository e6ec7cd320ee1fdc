//! Merge named series into a date (and hour) keyed lookup table.
//!
//! Keys keep first-seen order. Calendar order is opt-in through
//! [`AggregatedTable::sort_calendar`].

use chrono::NaiveDate;
use hashlink::LinkedHashMap;
use tracing::debug;

use tariffgrid_core::{NamedSeries, SeriesValue};

/// Series name to value; `None` is an explicit null reading
pub type Values = LinkedHashMap<String, Option<f64>>;

/// Everything aggregated under one date
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateEntry {
    /// Readings from scalar points
    pub daily: Values,
    /// Readings from hourly points, by hour
    pub hourly: LinkedHashMap<u8, Values>,
}

impl DateEntry {
    pub fn has_hours(&self) -> bool {
        !self.hourly.is_empty()
    }

    /// Hours in aggregation order
    pub fn hours(&self) -> Vec<u8> {
        self.hourly.keys().copied().collect()
    }
}

/// Insert or overwrite without moving an existing key
fn put<K: std::hash::Hash + Eq, V>(map: &mut LinkedHashMap<K, V>, key: K, value: V) {
    if let Some(slot) = map.get_mut(&key) {
        *slot = value;
    } else {
        map.insert(key, value);
    }
}

fn slot<'a, K: std::hash::Hash + Eq + Clone, V: Default>(
    map: &'a mut LinkedHashMap<K, V>,
    key: &K,
) -> &'a mut V {
    map.entry(key.clone()).or_insert_with(V::default)
}

/// Date-keyed lookup built from a set of named series
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatedTable {
    dates: LinkedHashMap<NaiveDate, DateEntry>,
}

impl AggregatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reading. `hour` selects the hourly bucket.
    pub fn insert(&mut self, date: NaiveDate, hour: Option<u8>, name: &str, value: Option<f64>) {
        let entry = slot(&mut self.dates, &date);
        match hour {
            Some(hour) => put(slot(&mut entry.hourly, &hour), name.to_string(), value),
            None => put(&mut entry.daily, name.to_string(), value),
        }
    }

    /// Dates in aggregation order
    pub fn dates(&self) -> impl Iterator<Item = (&NaiveDate, &DateEntry)> {
        self.dates.iter()
    }

    pub fn entry(&self, date: NaiveDate) -> Option<&DateEntry> {
        self.dates.get(&date)
    }

    /// Daily reading; `None` when absent or null
    pub fn daily(&self, date: NaiveDate, name: &str) -> Option<f64> {
        self.dates.get(&date)?.daily.get(name).copied().flatten()
    }

    pub fn hourly(&self, date: NaiveDate, hour: u8, name: &str) -> Option<f64> {
        self.dates
            .get(&date)?
            .hourly
            .get(&hour)?
            .get(name)
            .copied()
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of (date) and (date, hour) keys
    pub fn key_count(&self) -> usize {
        self.dates
            .values()
            .map(|e| usize::from(!e.daily.is_empty()) + e.hourly.len())
            .sum()
    }

    /// Reorder dates by calendar and hours ascending
    pub fn sort_calendar(&mut self) {
        let mut dates: Vec<(NaiveDate, DateEntry)> = self.dates.drain().collect();
        dates.sort_by_key(|(date, _)| *date);
        for (date, mut entry) in dates {
            let mut hours: Vec<(u8, Values)> = entry.hourly.drain().collect();
            hours.sort_by_key(|(hour, _)| *hour);
            entry.hourly = hours.into_iter().collect();
            self.dates.insert(date, entry);
        }
    }
}

/// Merge the dated points of every series.
///
/// Each point is keyed by its date alone when scalar (or null), and by
/// `(date, hour)` for every hour when hourly. Later points overwrite
/// earlier ones for the same key and name.
pub fn aggregate(series: &[NamedSeries]) -> AggregatedTable {
    let mut table = AggregatedTable::new();
    for named in series {
        for point in &named.date_value {
            match &point.value {
                Some(SeriesValue::Hourly(hours)) => {
                    for h in hours {
                        table.insert(point.date, Some(h.hour), &named.name, h.value);
                    }
                }
                Some(SeriesValue::Scalar(v)) => table.insert(point.date, None, &named.name, Some(*v)),
                None => table.insert(point.date, None, &named.name, None),
            }
        }
    }
    debug!(dates = table.len(), keys = table.key_count(), "aggregated series");
    table
}
