// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar views derived from the stats history.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Habit, UserStats};
use crate::time_utils::day_key;

/// How a calendar day went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// After today
    Future,
    /// Every habit done
    Perfect,
    /// Some habits done
    Partial,
    /// Recorded, nothing done
    Missed,
    /// No history entry
    Empty,
}

/// Status of `date` given the stats history and the current date.
pub fn day_status(stats: &UserStats, date: NaiveDate, today: NaiveDate) -> DayStatus {
    if date > today {
        return DayStatus::Future;
    }

    match stats.history.get(&day_key(date)) {
        None => DayStatus::Empty,
        Some(day) if day.all_completed && day.total > 0 => DayStatus::Perfect,
        Some(day) if day.completed > 0 => DayStatus::Partial,
        Some(_) => DayStatus::Missed,
    }
}

/// Per-status day counts for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub perfect: u32,
    pub partial: u32,
    pub missed: u32,
    pub empty: u32,
    pub future: u32,
}

/// Summarize `year`-`month`. Returns `None` for an invalid month.
pub fn month_summary(
    stats: &UserStats,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<MonthSummary> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut summary = MonthSummary::default();

    for date in first.iter_days().take_while(|d| d.month() == month) {
        match day_status(stats, date, today) {
            DayStatus::Perfect => summary.perfect += 1,
            DayStatus::Partial => summary.partial += 1,
            DayStatus::Missed => summary.missed += 1,
            DayStatus::Empty => summary.empty += 1,
            DayStatus::Future => summary.future += 1,
        }
    }

    Some(summary)
}

/// Habits expected on a future day: every daily habit.
pub fn planned_count(habits: &[Habit]) -> usize {
    habits.iter().filter(|h| h.is_daily()).count()
}

/// Today's completion as a percentage; 0 for an empty list.
pub fn progress_percent(habits: &[Habit]) -> f64 {
    if habits.is_empty() {
        return 0.0;
    }
    let done = habits.iter().filter(|h| h.completed).count();
    done as f64 / habits.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::local::default_habits;
    use crate::models::{DayStats, Frequency};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stats_with(entries: &[(&str, u32, u32)]) -> UserStats {
        let mut stats = UserStats::default();
        for (key, completed, total) in entries {
            stats.record_day(
                key.to_string(),
                DayStats {
                    completed: *completed,
                    total: *total,
                    all_completed: completed == total && *total > 0,
                },
            );
        }
        stats
    }

    #[test]
    fn test_day_status_classification() {
        let stats = stats_with(&[
            ("2024-02-01", 2, 2),
            ("2024-02-02", 1, 2),
            ("2024-02-03", 0, 2),
            ("2024-02-04", 0, 0),
        ]);
        let today = date(2024, 2, 10);

        assert_eq!(day_status(&stats, date(2024, 2, 1), today), DayStatus::Perfect);
        assert_eq!(day_status(&stats, date(2024, 2, 2), today), DayStatus::Partial);
        assert_eq!(day_status(&stats, date(2024, 2, 3), today), DayStatus::Missed);
        assert_eq!(day_status(&stats, date(2024, 2, 4), today), DayStatus::Missed);
        assert_eq!(day_status(&stats, date(2024, 2, 5), today), DayStatus::Empty);
        assert_eq!(day_status(&stats, date(2024, 2, 11), today), DayStatus::Future);
    }

    #[test]
    fn test_today_is_not_future() {
        let stats = stats_with(&[("2024-02-10", 1, 1)]);
        let today = date(2024, 2, 10);
        assert_eq!(day_status(&stats, today, today), DayStatus::Perfect);
    }

    #[test]
    fn test_month_summary_leap_february() {
        let stats = stats_with(&[("2024-02-01", 2, 2), ("2024-02-02", 1, 2)]);
        let summary = month_summary(&stats, 2024, 2, date(2024, 2, 10)).unwrap();

        assert_eq!(summary.perfect, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.empty, 8);
        assert_eq!(summary.future, 19);
        assert_eq!(
            summary.perfect + summary.partial + summary.missed + summary.empty + summary.future,
            29
        );
    }

    #[test]
    fn test_month_summary_invalid_month() {
        assert!(month_summary(&UserStats::default(), 2024, 13, date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_planned_count_and_progress() {
        let mut habits = default_habits();
        habits[1].frequency = Frequency::Once;
        habits[0].completed = true;

        assert_eq!(planned_count(&habits), 1);
        assert_eq!(progress_percent(&habits), 50.0);
        assert_eq!(progress_percent(&[]), 0.0);
    }
}
