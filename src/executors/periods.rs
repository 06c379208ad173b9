//! Reporting windows.
//!
//! Week windows honor the user's week start day. Month and year windows are
//! calendar aligned. Every "current" window ends at the reference date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::agent_core::actions::{GoalPeriod, StatsPeriod};

/// An inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Calendar days in the window, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Most recent `week_start` on or before `today`.
pub fn start_of_week(today: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + today.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64)
        % 7;
    today - Duration::days(back)
}

pub fn today(today: NaiveDate) -> Window {
    Window::new(today, today)
}

pub fn week_to_date(today: NaiveDate, week_start: Weekday) -> Window {
    Window::new(start_of_week(today, week_start), today)
}

pub fn month_to_date(today: NaiveDate) -> Window {
    Window::new(today.with_day(1).unwrap_or(today), today)
}

pub fn year_to_date(today: NaiveDate) -> Window {
    Window::new(
        NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        today,
    )
}

/// Whole calendar month.
pub fn month(year: i32, month: u32) -> Option<Window> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(Window::new(start, next - Duration::days(1)))
}

/// Whole calendar year.
pub fn year(year: i32) -> Option<Window> {
    Some(Window::new(
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Window for a stats period; `None` means no date bound.
pub fn stats_window(period: StatsPeriod, today_: NaiveDate, week_start: Weekday) -> Option<Window> {
    match period {
        StatsPeriod::Week => Some(week_to_date(today_, week_start)),
        StatsPeriod::Month => Some(month_to_date(today_)),
        StatsPeriod::Year => Some(year_to_date(today_)),
        StatsPeriod::AllTime => None,
    }
}

/// Current window a goal is measured against.
pub fn goal_window(period: GoalPeriod, today_: NaiveDate, week_start: Weekday) -> Window {
    match period {
        GoalPeriod::Daily => today(today_),
        GoalPeriod::Weekly => week_to_date(today_, week_start),
        GoalPeriod::Monthly => month_to_date(today_),
        GoalPeriod::Yearly => year_to_date(today_),
    }
}

/// Calendar days in the full goal period containing `today_`, for pacing.
pub fn goal_period_days(period: GoalPeriod, today_: NaiveDate) -> i64 {
    match period {
        GoalPeriod::Daily => 1,
        GoalPeriod::Weekly => 7,
        GoalPeriod::Monthly => month(today_.year(), today_.month()).map_or(30, |w| w.days()),
        GoalPeriod::Yearly => year(today_.year()).map_or(365, |w| w.days()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_start_respects_setting() {
        // 2026-01-10 is a Saturday.
        let sat = d(2026, 1, 10);
        assert_eq!(start_of_week(sat, Weekday::Sun), d(2026, 1, 4));
        assert_eq!(start_of_week(sat, Weekday::Mon), d(2026, 1, 5));
        let sun = d(2026, 1, 11);
        assert_eq!(start_of_week(sun, Weekday::Sun), sun);
        assert_eq!(start_of_week(sun, Weekday::Mon), d(2026, 1, 5));
    }

    #[test]
    fn test_calendar_windows() {
        let feb = month(2024, 2).unwrap();
        assert_eq!(feb.end, d(2024, 2, 29));
        assert_eq!(feb.days(), 29);
        let dec = month(2025, 12).unwrap();
        assert_eq!(dec.end, d(2025, 12, 31));
        assert!(month(2025, 13).is_none());
        assert_eq!(year(2026).unwrap().days(), 365);
    }

    #[test]
    fn test_to_date_windows_end_today() {
        let t = d(2026, 3, 15);
        assert_eq!(month_to_date(t), Window::new(d(2026, 3, 1), t));
        assert_eq!(year_to_date(t).start, d(2026, 1, 1));
        assert!(stats_window(StatsPeriod::AllTime, t, Weekday::Sun).is_none());
        assert_eq!(goal_window(GoalPeriod::Daily, t, Weekday::Sun).days(), 1);
        assert_eq!(goal_period_days(GoalPeriod::Monthly, t), 31);
    }
}
