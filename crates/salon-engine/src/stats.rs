//! Dashboard counters and the per-day booking series.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::clock::Clock;
use crate::hours::BusinessHours;
use crate::model::{ServiceId, Status};
use crate::store::Store;

const POPULAR_SERVICES: usize = 5;

/// Longest daily series `daily_counts` produces.
pub const MAX_DAILY_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularService {
    pub id: ServiceId,
    pub name: String,
    pub appointments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_services: usize,
    pub total_appointments: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
    /// Up to five services with the most appointments, busiest first.
    pub popular_services: Vec<PopularService>,
}

pub fn dashboard(store: &Store) -> Dashboard {
    let appointments = store.appointments();
    let count = |status: Status| appointments.iter().filter(|a| a.status == status).count();

    let mut popular: Vec<PopularService> = store
        .services()
        .into_iter()
        .map(|s| PopularService {
            id: s.id,
            name: s.name.clone(),
            appointments: appointments.iter().filter(|a| a.service_id == Some(s.id)).count(),
        })
        .collect();
    // Stable sort keeps alphabetical order among ties.
    popular.sort_by(|a, b| b.appointments.cmp(&a.appointments));
    popular.truncate(POPULAR_SERVICES);

    Dashboard {
        total_services: store.services().len(),
        total_appointments: appointments.len(),
        pending: count(Status::Pending),
        confirmed: count(Status::Confirmed),
        cancelled: count(Status::Cancelled),
        completed: count(Status::Completed),
        popular_services: popular,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Appointments starting on each of the last `days` local dates, oldest
/// first and ending today. Days without bookings are reported as zero.
/// `days` is capped at [`MAX_DAILY_DAYS`].
pub fn daily_counts(store: &Store, hours: &BusinessHours, clock: &dyn Clock, days: u32) -> Vec<DailyCount> {
    let today = hours.local_date(clock.now());
    let appointments = store.appointments();

    (0..i64::from(days.min(MAX_DAILY_DAYS)))
        .rev()
        .map(|back| today - Duration::days(back))
        .map(|date| DailyCount {
            date,
            count: appointments
                .iter()
                .filter(|a| hours.local_date(a.starts_at) == date)
                .count(),
        })
        .collect()
}
