//! Business hours and the single fixed timezone all appointments live in.
//!
//! Appointment instants are stored as UTC. Every wall-clock concern (which
//! day an appointment falls on, whether it fits between opening and closing)
//! goes through [`BusinessHours`] so there is exactly one zone in play.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SalonError};

/// Default zone for the salon.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Default step between candidate slot start times.
pub const DEFAULT_STEP_MINUTES: u32 = 30;

/// Daily opening/closing bounds plus slot granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessHours {
    open: NaiveTime,
    close: NaiveTime,
    step_minutes: u32,
    timezone: Tz,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            step_minutes: DEFAULT_STEP_MINUTES,
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl BusinessHours {
    /// Build business hours, rejecting an empty day or a zero step.
    pub fn new(open: NaiveTime, close: NaiveTime, step_minutes: u32, timezone: Tz) -> Result<Self> {
        if open >= close {
            return Err(SalonError::InvalidHours(format!(
                "opening time {} must be before closing time {}",
                open.format("%H:%M"),
                close.format("%H:%M")
            )));
        }
        if step_minutes == 0 {
            return Err(SalonError::InvalidHours("step must be at least one minute".to_string()));
        }
        Ok(Self {
            open,
            close,
            step_minutes,
            timezone,
        })
    }

    /// Build business hours from textual settings (`"09:00"`, `"America/Sao_Paulo"`).
    pub fn parse(open: &str, close: &str, step_minutes: u32, timezone: &str) -> Result<Self> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| SalonError::InvalidTimezone(timezone.to_string()))?;
        Self::new(parse_wall_time(open)?, parse_wall_time(close)?, step_minutes, timezone)
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Same hours with a different slot step.
    pub fn with_step(self, step_minutes: u32) -> Result<Self> {
        Self::new(self.open, self.close, step_minutes, self.timezone)
    }

    /// Resolve a local wall-clock moment to a UTC instant.
    ///
    /// Returns `None` for local times skipped by a DST gap. Ambiguous times
    /// (clocks falling back) resolve to the earliest instant.
    pub fn localize(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.localize_naive(date.and_time(time))
    }

    pub fn localize_naive(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Local calendar date of a UTC instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Local wall-clock date-time of a UTC instant.
    pub fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }

    /// The UTC half-open window `[start of date, start of next date)`.
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(date);
        (self.start_of_day(date), self.start_of_day(next))
    }

    /// First instant of a local date. Zones that skip midnight start the day
    /// at the first valid minute after it.
    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        (0..=180)
            .map(|m| midnight + Duration::minutes(m))
            .find_map(|local| self.localize_naive(local))
            .unwrap_or_else(|| midnight.and_utc())
    }

    /// Whether `[start, start + duration)` lies inside the opening hours of
    /// the local day `start` falls on. The closing time is an inclusive end.
    pub fn fits(&self, start: DateTime<Utc>, duration_minutes: u32) -> bool {
        let date = self.local_date(start);
        let (Some(open), Some(close)) = (self.localize(date, self.open), self.localize(date, self.close)) else {
            return false;
        };
        let end = start + Duration::minutes(i64::from(duration_minutes));
        start >= open && end <= close
    }
}

/// Parse an `HH:MM` (or `HH:MM:SS`) wall-clock time.
pub fn parse_wall_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| SalonError::InvalidHours(format!("'{}' is not a HH:MM time", s)))
}
