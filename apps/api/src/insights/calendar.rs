use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::entry::TimelineEntry;

pub const WEEKS: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;

/// Sunday-first month grid. Cells outside the month are `None`.
pub type MonthMatrix = [[Option<u32>; DAYS_PER_WEEK]; WEEKS];

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Builds the 6×7 calendar grid for `month` (1-12). `None` for an invalid month.
pub fn month_matrix(year: i32, month: u32) -> Option<MonthMatrix> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days = days_in_month(year, month)?;
    let offset = first.weekday().num_days_from_sunday() as i64;

    let mut matrix: MonthMatrix = [[None; DAYS_PER_WEEK]; WEEKS];
    for (w, week) in matrix.iter_mut().enumerate() {
        for (d, cell) in week.iter_mut().enumerate() {
            let day = (w * DAYS_PER_WEEK + d) as i64 - offset + 1;
            if (1..=days as i64).contains(&day) {
                *cell = Some(day as u32);
            }
        }
    }
    Some(matrix)
}

/// Groups entries falling in the given month by day of month (UTC).
pub fn entries_by_day(
    entries: &[TimelineEntry],
    year: i32,
    month: u32,
) -> BTreeMap<u32, Vec<TimelineEntry>> {
    let mut days: BTreeMap<u32, Vec<TimelineEntry>> = BTreeMap::new();
    for entry in entries {
        let date = entry.date.date_naive();
        if date.year() == year && date.month() == month {
            days.entry(date.day()).or_default().push(entry.clone());
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::fixtures::entry;
    use crate::models::entry::EntryType;

    #[test]
    fn test_matrix_is_six_by_seven() {
        let m = month_matrix(2024, 2).unwrap();
        assert_eq!(m.len(), 6);
        assert!(m.iter().all(|w| w.len() == 7));
    }

    #[test]
    fn test_february_leap_year_alignment() {
        // 1 Feb 2024 was a Thursday
        let m = month_matrix(2024, 2).unwrap();
        assert_eq!(m[0], [None, None, None, None, Some(1), Some(2), Some(3)]);
        assert_eq!(m[4][4], Some(29));
        assert_eq!(m[4][5], None);
        assert!(m[5].iter().all(Option::is_none));
    }

    #[test]
    fn test_month_starting_sunday() {
        // 1 Sep 2024 was a Sunday
        let m = month_matrix(2024, 9).unwrap();
        assert_eq!(m[0][0], Some(1));
        assert_eq!(m[4][1], Some(30));
    }

    #[test]
    fn test_month_using_sixth_row() {
        // 1 Mar 2025 was a Saturday; 31 days spill into row six
        let m = month_matrix(2025, 3).unwrap();
        assert_eq!(m[0][6], Some(1));
        assert_eq!(m[5][0], Some(30));
        assert_eq!(m[5][1], Some(31));
    }

    #[test]
    fn test_every_day_appears_once() {
        let m = month_matrix(2023, 12).unwrap();
        let days: Vec<u32> = m.iter().flatten().flatten().copied().collect();
        assert_eq!(days, (1..=31).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_month() {
        assert!(month_matrix(2024, 0).is_none());
        assert!(month_matrix(2024, 13).is_none());
    }

    #[test]
    fn test_entries_grouped_by_day_within_month() {
        let entries = vec![
            entry("2024-03-05T10:00:00Z", EntryType::Text, None),
            entry("2024-03-05T20:00:00Z", EntryType::Photo, None),
            entry("2024-03-17T08:00:00Z", EntryType::Voice, None),
            entry("2024-04-05T08:00:00Z", EntryType::Voice, None),
        ];
        let days = entries_by_day(&entries, 2024, 3);
        assert_eq!(days.len(), 2);
        assert_eq!(days[&5].len(), 2);
        assert_eq!(days[&17].len(), 1);
    }
}
