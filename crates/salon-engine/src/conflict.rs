//! Overlap rule between a candidate booking and existing appointments.
//!
//! Intervals are half-open: an appointment ending exactly when another
//! starts does NOT conflict with it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time occupied by a blocking appointment, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(duration_minutes)),
        }
    }
}

/// `a.start < b.end && a.end > b.start`.
pub fn overlaps(a: &BusyInterval, b: &BusyInterval) -> bool {
    a.start < b.end && a.end > b.start
}

/// First busy interval overlapping `candidate`, if any.
pub fn first_conflict<'a>(candidate: &BusyInterval, busy: &'a [BusyInterval]) -> Option<&'a BusyInterval> {
    busy.iter().find(|existing| overlaps(existing, candidate))
}
