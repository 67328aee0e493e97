//! Candidate appointment slots for a day and the booking admission check.
//!
//! Slots start at opening time and advance by the configured step. A slot is
//! generated only if the whole service fits before closing. Each slot is then
//! classified against the clock and the day's blocking appointments; every
//! candidate is returned, callers filter for free ones as they need.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::conflict::{first_conflict, BusyInterval};
use crate::error::{Result, SalonError};
use crate::hours::BusinessHours;
use crate::model::DEFAULT_DURATION_MINUTES;

/// Why a slot is or is not bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Free,
    /// Overlaps a pending or confirmed appointment.
    Booked,
    /// Starts at or before the current instant.
    Past,
}

/// A candidate start time within business hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Local wall-clock start.
    pub time: NaiveTime,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub state: SlotState,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.state != SlotState::Free
    }

    pub fn view(&self) -> SlotView {
        SlotView {
            hora: self.time.format("%H:%M").to_string(),
            ocupado: self.is_occupied(),
        }
    }
}

/// JSON shape consumed by the booking calendar: `{"hora": "09:00", "ocupado": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub hora: String,
    pub ocupado: bool,
}

fn effective_duration(duration_minutes: u32) -> u32 {
    if duration_minutes == 0 {
        DEFAULT_DURATION_MINUTES
    } else {
        duration_minutes
    }
}

/// List every candidate slot on `date` for a service of `duration_minutes`.
///
/// `busy` holds the blocking intervals known for that day; intervals outside
/// the day are harmless. Local times that do not exist (DST gaps) produce no
/// slot.
pub fn list_slots(
    date: NaiveDate,
    duration_minutes: u32,
    hours: &BusinessHours,
    busy: &[BusyInterval],
    clock: &dyn Clock,
) -> Vec<Slot> {
    let duration = effective_duration(duration_minutes);
    let now = clock.now();
    let step = Duration::minutes(i64::from(hours.step_minutes()));
    let length = Duration::minutes(i64::from(duration));
    let close = date.and_time(hours.close());

    let mut slots = Vec::new();
    let mut cursor = date.and_time(hours.open());

    while cursor + length <= close {
        if let Some(start) = hours.localize_naive(cursor) {
            let interval = BusyInterval::new(start, duration);
            let state = if start <= now {
                SlotState::Past
            } else if first_conflict(&interval, busy).is_some() {
                SlotState::Booked
            } else {
                SlotState::Free
            };
            slots.push(Slot {
                time: cursor.time(),
                start,
                end: interval.end,
                state,
            });
        }
        cursor += step;
    }

    debug!(
        %date,
        duration,
        total = slots.len(),
        free = slots.iter().filter(|s| !s.is_occupied()).count(),
        "listed slots"
    );
    slots
}

/// Decide whether `candidate` may be booked for a service of `duration_minutes`.
///
/// Checks, in order: the start is strictly in the future, the appointment
/// fits inside business hours, and it overlaps no blocking interval.
pub fn validate_booking(
    candidate: DateTime<Utc>,
    duration_minutes: u32,
    hours: &BusinessHours,
    busy: &[BusyInterval],
    clock: &dyn Clock,
) -> Result<()> {
    let duration = effective_duration(duration_minutes);

    if candidate <= clock.now() {
        return Err(SalonError::PastDateTime);
    }
    if !hours.fits(candidate, duration) {
        return Err(SalonError::OutsideBusinessHours);
    }
    if let Some(existing) = first_conflict(&BusyInterval::new(candidate, duration), busy) {
        return Err(SalonError::SlotConflict {
            conflicting_start: existing.start,
        });
    }
    Ok(())
}
