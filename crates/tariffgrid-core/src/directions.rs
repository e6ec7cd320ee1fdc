//! Monthly tariff direction grid (day × hour).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timegrid::{hour_index, month_days, normalize_month, HOURS_PER_DAY};
use crate::{dates, RangeError};

/// Price direction for an hour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    #[default]
    #[serde(other)]
    None,
}

impl Direction {
    /// Double-click behaviour: up becomes down, anything else becomes up
    pub fn toggled(self) -> Self {
        match self {
            Self::Up => Self::Down,
            _ => Self::Up,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::None => "",
        }
    }
}

/// A stored direction for one hour of one day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TariffDirection {
    #[serde(with = "dates")]
    pub date: NaiveDate,
    pub hour: i64,
    #[serde(default)]
    pub direction: Direction,
}

/// One day of the grid
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionDay {
    pub date: NaiveDate,
    pub hours: [Direction; HOURS_PER_DAY],
}

impl DirectionDay {
    /// `DD.MM.YYYY`
    pub fn label(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionGrid {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DirectionDay>,
}

impl DirectionGrid {
    /// Every day of the month with all hours `NONE`, then the records on top.
    ///
    /// Records for other months or for hours outside 1..=24 are ignored.
    pub fn for_month(year: i32, month: i32, records: &[TariffDirection]) -> Self {
        let Some((year, month)) = normalize_month(year, month) else {
            return Self {
                year,
                month: month.clamp(1, 12).unsigned_abs(),
                days: Vec::new(),
            };
        };
        let mut grid = Self {
            year,
            month,
            days: month_days(year, month as i32)
                .into_iter()
                .map(|date| DirectionDay {
                    date,
                    hours: [Direction::None; HOURS_PER_DAY],
                })
                .collect(),
        };
        let mut ignored = 0usize;
        for record in records {
            let Ok(idx) = hour_index(record.hour) else {
                ignored += 1;
                continue;
            };
            match grid.day_mut(record.date) {
                Some(day) => day.hours[idx] = record.direction,
                None => ignored += 1,
            }
        }
        if ignored > 0 {
            debug!(ignored, "direction records outside the grid");
        }
        grid
    }

    /// Grid for a month with no stored directions
    pub fn empty(year: i32, month: i32) -> Self {
        Self::for_month(year, month, &[])
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DirectionDay> {
        self.days.iter().find(|d| d.date == date)
    }

    fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DirectionDay> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    pub fn get(&self, date: NaiveDate, hour: i64) -> Result<Option<Direction>, RangeError> {
        let idx = hour_index(hour)?;
        Ok(self.day(date).map(|d| d.hours[idx]))
    }

    /// Flip one cell; returns the new direction, `None` if the date is not in the grid
    pub fn toggle(&mut self, date: NaiveDate, hour: i64) -> Result<Option<Direction>, RangeError> {
        let idx = hour_index(hour)?;
        Ok(self.day_mut(date).map(|day| {
            day.hours[idx] = day.hours[idx].toggled();
            day.hours[idx]
        }))
    }

    /// Flatten back into records, one per cell
    pub fn records(&self) -> Vec<TariffDirection> {
        self.days
            .iter()
            .flat_map(|day| {
                day.hours
                    .iter()
                    .enumerate()
                    .map(move |(i, direction)| TariffDirection {
                        date: day.date,
                        hour: i as i64 + 1,
                        direction: *direction,
                    })
            })
            .collect()
    }
}
