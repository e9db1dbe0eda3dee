//! Trial ("demo") countdown arithmetic.
//!
//! A demo of `N` days runs from midnight UTC of the start date for `N + 1`
//! days, so the partial first day does not eat into the granted period.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Format of the persisted start date.
pub const DEMO_DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: i64 = 86_400;

/// An enabled demo period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoState {
    /// Effective window in days (requested period + 1).
    pub window_days: i64,
    /// Anchor date, persisted on first enable.
    pub start: NaiveDate,
}

impl DemoState {
    pub fn new(period_days: u32, start: NaiveDate) -> Self {
        Self {
            window_days: i64::from(period_days) + 1,
            start,
        }
    }

    /// A demo that has already run out, used when the persisted start date
    /// cannot be trusted.
    pub fn expired(start: NaiveDate) -> Self {
        Self {
            window_days: 0,
            start,
        }
    }

    /// Instant at which the demo ends, saturating at the latest
    /// representable time.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.start
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .checked_add_signed(Duration::days(self.window_days))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whole days left at `now`, truncated, never negative.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        let remaining = (self.ends_at() - now).num_seconds().max(0);
        remaining / SECONDS_PER_DAY
    }
}

/// Parse a persisted start date.
pub fn parse_start(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DEMO_DATE_FORMAT).ok()
}

/// Render a start date for persistence.
pub fn format_start(date: NaiveDate) -> String {
    date.format(DEMO_DATE_FORMAT).to_string()
}
