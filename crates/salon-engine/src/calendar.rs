//! Calendar feed for the booking panel and the client-side "next
//! appointment" notice.

use chrono::Duration;
use serde::Serialize;

use crate::clock::Clock;
use crate::hours::BusinessHours;
use crate::model::{Appointment, ServiceId, Status};
use crate::store::Store;

/// Who is looking at the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// Staff see every appointment.
    Staff,
    /// A client sees only their own appointments, matched by email.
    Client(String),
}

/// Display colours for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub color: &'static str,
    pub text_color: &'static str,
    pub border_color: &'static str,
}

pub fn palette(status: Status) -> Palette {
    let (color, border_color) = match status {
        Status::Confirmed => ("#16a34a", "#15803d"),
        Status::Pending => ("#2563eb", "#1d4ed8"),
        Status::Cancelled => ("#dc2626", "#b91c1c"),
        Status::Completed => ("#9333ea", "#7e22ce"),
    };
    Palette {
        color,
        text_color: "#ffffff",
        border_color,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: u64,
    pub title: String,
    /// Local RFC 3339 start.
    pub start: String,
    pub end: String,
    pub status: Status,
    pub color: &'static str,
    pub text_color: &'static str,
    pub border_color: &'static str,
    pub extended_props: EventDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetails {
    pub status: Status,
    pub service_name: String,
    pub service_id: Option<ServiceId>,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
}

/// Build calendar events for `viewer`, chronologically.
pub fn calendar_events(store: &Store, hours: &BusinessHours, viewer: &Viewer) -> Vec<CalendarEvent> {
    let appointments: Vec<&Appointment> = match viewer {
        Viewer::Staff => store.appointments(),
        Viewer::Client(email) => match store.find_client_by_email(email) {
            Some(client) => store.appointments_for_client(client.id),
            None => Vec::new(),
        },
    };

    appointments
        .into_iter()
        .map(|appointment| event_for(store, hours, appointment))
        .collect()
}

fn event_for(store: &Store, hours: &BusinessHours, appointment: &Appointment) -> CalendarEvent {
    let tz = hours.timezone();
    let service = appointment.service_id.and_then(|id| store.service(id).ok());
    let client = store.client(appointment.client_id).ok();
    let interval = store.effective_interval(appointment);
    let colours = palette(appointment.status);

    let service_name = service.map(|s| s.name.clone()).unwrap_or_default();
    let client_name = client.map(|c| c.name.clone()).unwrap_or_default();

    CalendarEvent {
        id: appointment.id.0,
        title: format!(
            "{} - {}",
            service.map_or("Service", |s| s.name.as_str()),
            client.map_or("Client", |c| c.name.as_str())
        ),
        start: interval.start.with_timezone(&tz).to_rfc3339(),
        end: interval.end.with_timezone(&tz).to_rfc3339(),
        status: appointment.status,
        color: colours.color,
        text_color: colours.text_color,
        border_color: colours.border_color,
        extended_props: EventDetails {
            status: appointment.status,
            service_name,
            service_id: service.map(|s| s.id),
            client_name,
            client_email: client.map(|c| c.email.clone()).unwrap_or_default(),
            client_phone: client.and_then(|c| c.phone.clone()).unwrap_or_default(),
        },
    }
}

pub const NO_NOTIFICATIONS: &str = "No notifications right now.";

/// Window in which an upcoming appointment triggers a notice.
const NOTICE_WINDOW_MINUTES: i64 = 30;

/// Message about the client's next pending or confirmed appointment when it
/// starts within the next half hour.
pub fn next_appointment_notice(store: &Store, email: &str, clock: &dyn Clock) -> String {
    let Some(client) = store.find_client_by_email(email) else {
        return NO_NOTIFICATIONS.to_string();
    };
    let now = clock.now();

    let next = store
        .appointments_for_client(client.id)
        .into_iter()
        .find(|a| a.status.is_blocking() && a.starts_at >= now);

    if let Some(appointment) = next {
        let remaining = appointment.starts_at - now;
        if remaining > Duration::zero() && remaining < Duration::minutes(NOTICE_WINDOW_MINUTES) {
            let service = appointment
                .service_id
                .and_then(|id| store.service(id).ok())
                .map_or("Service", |s| s.name.as_str());
            return format!(
                "Your next {} appointment is in {} minutes.",
                service,
                remaining.num_minutes()
            );
        }
    }

    NO_NOTIFICATIONS.to_string()
}
