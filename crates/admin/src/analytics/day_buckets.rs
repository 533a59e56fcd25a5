//! Calendar-day windows for day-bucketed metrics.
//!
//! Days are calendar days in the server's reference time zone, read from an
//! injected [`Clock`]. Each day's midnight is resolved separately, so windows
//! on either side of a daylight-saving change keep their local boundaries.
//! Only completed days are bucketed: the first bucket is yesterday, and
//! anything created today falls in no bucket.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::store::TimeWindow;

/// Time zone calendar days are computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceZone {
    /// The host's local zone.
    #[default]
    Local,
    /// A named IANA zone.
    Named(Tz),
}

impl ReferenceZone {
    /// Calendar date of `at` in this zone.
    #[must_use]
    pub fn date_of(self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Named(tz) => at.with_timezone(&tz).date_naive(),
        }
    }

    /// UTC instant at which `date` begins in this zone.
    #[must_use]
    pub fn start_of_day(self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self {
            Self::Local => first_instant(&Local, midnight),
            Self::Named(tz) => first_instant(&tz, midnight),
        }
    }
}

/// Earliest instant at or after `local` that exists in `tz`.
///
/// A midnight repeated by a backward shift resolves to its first occurrence.
/// A midnight skipped by a forward shift resolves to the end of the gap.
fn first_instant<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = local;
    for _ in 0..=4 {
        if let Some(at) = tz.from_local_datetime(&candidate).earliest() {
            return at.with_timezone(&Utc);
        }
        candidate += TimeDelta::minutes(30);
    }
    local.and_utc()
}

/// Source of the current instant and the server's reference zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn zone(&self) -> ReferenceZone;
}

/// Wall clock in a configured zone, or the host's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    zone: ReferenceZone,
}

impl SystemClock {
    #[must_use]
    pub const fn new(zone: ReferenceZone) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn zone(&self) -> ReferenceZone {
        self.zone
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    zone: ReferenceZone,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>, zone: ReferenceZone) -> Self {
        Self { now, zone }
    }

    /// Frozen clock whose calendar days are UTC days.
    #[must_use]
    pub const fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, ReferenceZone::Named(Tz::UTC))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn zone(&self) -> ReferenceZone {
        self.zone
    }
}

/// One completed calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// `[start_of_day(date), start_of_day(date + 1))` in UTC.
    pub window: TimeWindow,
}

/// The `days` completed days before `now` in `zone`, most recent first.
#[must_use]
pub fn completed_days(now: DateTime<Utc>, zone: ReferenceZone, days: u32) -> Vec<DayBucket> {
    let mut upper = zone.date_of(now);
    let mut upper_start = zone.start_of_day(upper);
    let mut buckets = Vec::with_capacity(days as usize);

    for _ in 0..days {
        let Some(date) = upper.pred_opt() else {
            break;
        };
        let start = zone.start_of_day(date);
        buckets.push(DayBucket {
            date,
            window: TimeWindow::new(start, upper_start),
        });
        upper = date;
        upper_start = start;
    }

    buckets
}
