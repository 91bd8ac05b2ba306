//! Connection window between consecutive flights.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Longest gap between consecutive flights a window may allow.
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// The allowed range of days between consecutive flights, inclusive.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use flight_chains::domain::ConnectionWindow;
///
/// let window = ConnectionWindow::new(2, 4).unwrap();
/// let day = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
/// let (lower, upper) = window.bounds(day);
/// assert_eq!(lower, NaiveDate::from_ymd_opt(2020, 2, 3).unwrap());
/// assert_eq!(upper, NaiveDate::from_ymd_opt(2020, 2, 5).unwrap());
/// assert!(ConnectionWindow::new(4, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionWindow {
    min_days: i64,
    max_days: i64,
}

impl ConnectionWindow {
    /// Create a window. Offsets must satisfy
    /// `0 <= min_days <= max_days <= MAX_WINDOW_DAYS`.
    pub fn new(min_days: i64, max_days: i64) -> Result<Self, DomainError> {
        if min_days < 0 || min_days > max_days || max_days > MAX_WINDOW_DAYS {
            return Err(DomainError::InvalidWindow { min_days, max_days });
        }
        Ok(Self { min_days, max_days })
    }

    pub fn min_days(&self) -> i64 {
        self.min_days
    }

    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    /// Inclusive date range for the next flight after a flight on `date`.
    ///
    /// Both ends saturate at the last representable date.
    pub fn bounds(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            add_days(date, self.min_days),
            add_days(date, self.max_days),
        )
    }

    /// Whether a flight on `next` may follow a flight on `previous`.
    pub fn admits(&self, previous: NaiveDate, next: NaiveDate) -> bool {
        let delta = next.signed_duration_since(previous).num_days();
        (self.min_days..=self.max_days).contains(&delta)
    }

    /// The anchor date that lets the first flight depart on `first_day`
    /// at the earliest.
    pub fn anchor_for(&self, first_day: NaiveDate) -> NaiveDate {
        first_day
            .checked_sub_days(Days::new(self.min_days.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN)
    }
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_days(Days::new(days.unsigned_abs()))
        .unwrap_or(NaiveDate::MAX)
}
