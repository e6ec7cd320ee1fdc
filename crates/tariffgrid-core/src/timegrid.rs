//! Fixed hour and day axes.

use chrono::{Datelike, NaiveDate};

use crate::{HourRecord, RangeError};

/// Slots in a day plan
pub const HOURS_PER_DAY: usize = 24;

/// 24 default records, hours 1..=24, zero readings and identity coefficients
pub fn build_default_hours() -> Vec<HourRecord> {
    (1..=HOURS_PER_DAY as u8).map(HourRecord::new).collect()
}

/// Zero-based slot index for a 1-based hour
pub fn hour_index(hour: i64) -> Result<usize, RangeError> {
    if (1..=HOURS_PER_DAY as i64).contains(&hour) {
        Ok((hour - 1) as usize)
    } else {
        Err(RangeError { hour })
    }
}

/// Interval label for an hour: 1 → "00 - 01", 24 → "23 - 00"
pub fn hour_interval_label(hour: u8) -> String {
    let hour = u32::from(hour);
    format!("{:02} - {:02}", (hour + 23) % 24, hour % 24)
}

/// Normalize a 1-based month that may overflow into neighbouring years.
///
/// Month 13 is January of the following year, month 0 is December of the
/// previous one. `None` when the carried year leaves `i32`.
pub fn normalize_month(year: i32, month: i32) -> Option<(i32, u32)> {
    let zero_based = i64::from(month) - 1;
    let year = i32::try_from(i64::from(year) + zero_based.div_euclid(12)).ok()?;
    let month = u32::try_from(zero_based.rem_euclid(12) + 1).ok()?;
    Some((year, month))
}

/// Every calendar day of a month, in order
pub fn month_days(year: i32, month: i32) -> Vec<NaiveDate> {
    let Some((year, month)) = normalize_month(year, month) else {
        return Vec::new();
    };
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// Number of days in a month, leap years included
pub fn days_in_month(year: i32, month: i32) -> usize {
    month_days(year, month).len()
}

/// Inclusive list of days between two dates; empty if `end < start`
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hours_are_complete_and_neutral() {
        let hours = build_default_hours();
        assert_eq!(hours.len(), 24);
        for (i, record) in hours.iter().enumerate() {
            assert_eq!(record.hour as usize, i + 1);
            assert_eq!(record.coefficient, 1.0);
            assert_eq!(record.coefficient_gen, 1.0);
            assert_eq!(record.volume, 0.0);
            assert_eq!(record.volume_gen, 0.0);
            assert_eq!(record.p1, 0.0);
            assert_eq!(record.p2, None);
            assert!(record.message.is_empty());
        }
    }

    #[test]
    fn interval_labels_wrap_at_midnight() {
        assert_eq!(hour_interval_label(1), "00 - 01");
        assert_eq!(hour_interval_label(13), "12 - 13");
        assert_eq!(hour_interval_label(24), "23 - 00");
    }

    #[test]
    fn hour_index_bounds() {
        assert_eq!(hour_index(1), Ok(0));
        assert_eq!(hour_index(24), Ok(23));
        assert_eq!(hour_index(0), Err(RangeError { hour: 0 }));
        assert_eq!(hour_index(25), Err(RangeError { hour: 25 }));
    }

    #[test]
    fn month_lengths_include_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn month_days_are_ordered_and_bounded() {
        let days = month_days(2024, 1);
        assert_eq!(days.first(), NaiveDate::from_ymd_opt(2024, 1, 1).as_ref());
        assert_eq!(days.last(), NaiveDate::from_ymd_opt(2024, 1, 31).as_ref());
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn out_of_range_months_overflow() {
        assert_eq!(normalize_month(2024, 13), Some((2025, 1)));
        assert_eq!(normalize_month(2024, 0), Some((2023, 12)));
        assert_eq!(normalize_month(2024, -11), Some((2023, 1)));
        assert_eq!(
            month_days(2024, 13).first(),
            NaiveDate::from_ymd_opt(2025, 1, 1).as_ref()
        );
    }

    #[test]
    fn extreme_months_yield_no_days() {
        assert_eq!(normalize_month(i32::MAX, 13), None);
        assert_eq!(normalize_month(i32::MIN, i32::MIN), None);
        assert_eq!(normalize_month(0, i32::MAX), Some((178_956_970, 7)));
        assert!(month_days(i32::MAX, 13).is_empty());
        assert!(month_days(2024, i32::MIN).is_empty());
        assert_eq!(days_in_month(i32::MAX, 12), 0);
    }

    #[test]
    fn date_range_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(date_range(start, end).len(), 4);
        assert!(date_range(end, start).is_empty());
    }
}
