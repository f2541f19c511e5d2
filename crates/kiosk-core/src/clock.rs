// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time source for the queue store.
//!
//! Ticket numbering resets at local midnight, so the store needs both the
//! current instant and the local calendar date of any instant. Injecting the
//! clock keeps day-rollover testable.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeDelta, TimeZone, Utc};

/// Source of the current time and the kiosk's local calendar.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date of `instant`.
    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate;

    /// First instant of local date `date`, in UTC.
    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&Local).date_naive()
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        // A DST gap at midnight has no local instant; the earliest mapping
        // or a UTC reading is close enough for a lower bound.
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}

/// Wall clock at a fixed UTC offset, for hosts whose zone differs from the
/// training center's.
#[derive(Debug, Clone, Copy)]
pub struct FixedOffsetClock {
    offset: FixedOffset,
}

impl FixedOffsetClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offset in minutes east of UTC; `None` if out of range.
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for FixedOffsetClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        local_midnight(self.offset, date)
    }
}

/// Midnight of `date` at `offset`, as UTC.
pub fn local_midnight(offset: FixedOffset, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    (midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_offset_date_crosses_midnight_before_utc() {
        // 17:30 UTC is 01:30 the next day at UTC+8.
        let clock = FixedOffsetClock::from_minutes(8 * 60).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 3, 9, 17, 30, 0).unwrap();
        assert_eq!(
            clock.local_date(instant),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
        );
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let clock = FixedOffsetClock::from_minutes(8 * 60).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(
            clock.start_of_day(date),
            Utc.with_ymd_and_hms(2026, 3, 9, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(FixedOffsetClock::from_minutes(25 * 60).is_none());
        assert!(FixedOffsetClock::from_minutes(-5 * 60).is_some());
    }
}
