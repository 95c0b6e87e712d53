//! Wall-clock source for token expiry and "today".

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, NaiveDate};

pub trait Clock {
    /// Milliseconds since the unix epoch.
    fn now_millis(&self) -> i64;

    /// Calendar date used for date-scoped queries.
    fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.now_millis())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to. `today` is derived in UTC.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance_secs(5);
        assert_eq!(clock.now_millis(), 6_000);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn manual_clock_today_is_utc_date() {
        // 2026-10-19T12:00:00Z
        let clock = ManualClock::new(1_792_411_200_000);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }
}
