//! Calendar-day time windows
//!
//! A backfill covers `days` windows counting backward from a start date.
//! Window `0` is the start date itself; window `i` is `start - i days`.

use chrono::{Days, NaiveDate};
use std::fmt;

/// Hour format used for the inclusive request range of a window.
const HOUR_FORMAT: &str = "%Y-%m-%dT%H";

/// A half-open calendar day `[date 00:00, date+1 00:00)` and its position in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    index: u32,
    date: NaiveDate,
}

impl TimeWindow {
    /// Create a window for `date` at position `index`.
    pub fn new(index: u32, date: NaiveDate) -> Self {
        Self { index, date }
    }

    /// Enumerate `days` windows in strictly decreasing date order.
    ///
    /// Stops early if the calendar runs out (before year -262143).
    pub fn backward_from(start: NaiveDate, days: u32) -> Vec<Self> {
        (0..days)
            .map_while(|index| {
                start
                    .checked_sub_days(Days::new(u64::from(index)))
                    .map(|date| Self::new(index, date))
            })
            .collect()
    }

    /// Position of this window within the run (0 = most recent).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Calendar day covered by this window.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// First hour of the window, e.g. `2025-05-12T00`.
    pub fn start_param(&self) -> String {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.format(HOUR_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Last hour of the window, e.g. `2025-05-12T23`.
    pub fn end_param(&self) -> String {
        self.date
            .and_hms_opt(23, 0, 0)
            .map(|dt| dt.format(HOUR_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} ({})", self.index, self.date)
    }
}
