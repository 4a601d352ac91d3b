//! Upcoming-birthday window.
//!
//! Birthdays are compared by month and day only, encoded as
//! `month * 100 + day`. A window that crosses the new year wraps around.

use chrono::{Datelike, Duration, NaiveDate};

/// How many days ahead `upcoming_birthdays` looks, today included.
pub const UPCOMING_DAYS: i64 = 7;

/// Encode a date as `month * 100 + day`.
pub fn month_day(date: NaiveDate) -> i32 {
    date.month() as i32 * 100 + date.day() as i32
}

/// Inclusive month/day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayWindow {
    pub start: i32,
    pub end: i32,
}

impl BirthdayWindow {
    /// Window from `today` through `today + days`.
    pub fn starting(today: NaiveDate, days: i64) -> Self {
        let last = today + Duration::days(days);
        Self {
            start: month_day(today),
            end: month_day(last),
        }
    }

    /// True when the window runs past December 31st.
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, birthday: NaiveDate) -> bool {
        let md = month_day(birthday);
        if self.wraps() {
            md >= self.start || md <= self.end
        } else {
            (self.start..=self.end).contains(&md)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_within_a_month() {
        let w = BirthdayWindow::starting(d(2026, 3, 10), UPCOMING_DAYS);
        assert_eq!(w, BirthdayWindow { start: 310, end: 317 });
        assert!(!w.wraps());
        assert!(w.contains(d(1990, 3, 10)));
        assert!(w.contains(d(1985, 3, 17)));
        assert!(!w.contains(d(1985, 3, 18)));
        assert!(!w.contains(d(1985, 3, 9)));
    }

    #[test]
    fn window_across_months() {
        let w = BirthdayWindow::starting(d(2026, 4, 27), UPCOMING_DAYS);
        assert_eq!(w, BirthdayWindow { start: 427, end: 504 });
        assert!(w.contains(d(2000, 5, 1)));
        assert!(!w.contains(d(2000, 5, 5)));
    }

    #[test]
    fn window_across_new_year_wraps() {
        let w = BirthdayWindow::starting(d(2026, 12, 28), UPCOMING_DAYS);
        assert!(w.wraps());
        assert!(w.contains(d(1970, 12, 31)));
        assert!(w.contains(d(1970, 1, 1)));
        assert!(w.contains(d(1970, 1, 4)));
        assert!(!w.contains(d(1970, 1, 5)));
        assert!(!w.contains(d(1970, 12, 27)));
        assert!(!w.contains(d(1970, 6, 15)));
    }

    #[test]
    fn leap_day_birthday() {
        let w = BirthdayWindow::starting(d(2027, 2, 25), UPCOMING_DAYS);
        assert!(w.contains(d(2000, 2, 29)));
    }
}
