//! Reminder emails sent about an hour before confirmed appointments.
//!
//! Selection and message composition live here. Delivery goes through the
//! [`Mailer`] trait; the transport itself is supplied by the caller.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::hours::BusinessHours;
use crate::model::{Appointment, AppointmentId, Status};
use crate::store::Store;

/// Reminders go out for appointments starting between these many minutes
/// from now (inclusive on both ends).
const WINDOW_START_MINUTES: i64 = 59;
const WINDOW_END_MINUTES: i64 = 61;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer {
    fn send(&mut self, email: &Email) -> Result<()>;
}

/// The pair of messages sent for one appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub appointment: AppointmentId,
    pub to_client: Email,
    pub to_owner: Email,
}

/// Outcome of a reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

/// Confirmed appointments without a reminder, starting 59 to 61 minutes
/// from now.
pub fn due_reminders<'a>(store: &'a Store, clock: &dyn Clock) -> Vec<&'a Appointment> {
    let now = clock.now();
    let from = now + Duration::minutes(WINDOW_START_MINUTES);
    let to = now + Duration::minutes(WINDOW_END_MINUTES);
    store
        .appointments()
        .into_iter()
        .filter(|a| a.status == Status::Confirmed && !a.reminder_sent)
        .filter(|a| a.starts_at >= from && a.starts_at <= to)
        .collect()
}

/// Compose the client and owner messages for `appointment`.
pub fn compose(
    store: &Store,
    hours: &BusinessHours,
    appointment: &Appointment,
    owner_email: &str,
) -> Result<Reminder> {
    let client = store.client(appointment.client_id)?;
    let service = appointment
        .service_id
        .and_then(|id| store.service(id).ok())
        .map_or("your service", |s| s.name.as_str());
    let local = appointment.starts_at.with_timezone(&hours.timezone());
    let when = local.format("%d/%m/%Y at %H:%M");

    let to_client = Email {
        to: client.email.clone(),
        subject: format!("Appointment reminder - {}", service),
        body: format!(
            "Hello, {}!\n\n\
             This is a reminder of your appointment with us.\n\n\
             Service: {}\n\
             Date and time: {}\n\n\
             We look forward to seeing you!",
            client.name, service, when
        ),
    };
    let to_owner = Email {
        to: owner_email.to_string(),
        subject: format!("Reminder: {} at {}", service, local.format("%H:%M")),
        body: format!(
            "Reminder: {}'s appointment for '{}' starts in about one hour ({}).",
            client.name, service, when
        ),
    };

    Ok(Reminder {
        appointment: appointment.id,
        to_client,
        to_owner,
    })
}

/// Send every due reminder and flag the appointment once both messages
/// were accepted. A failed appointment is logged and left unflagged so the
/// next run retries it.
pub fn send_due_reminders(
    store: &mut Store,
    hours: &BusinessHours,
    mailer: &mut dyn Mailer,
    clock: &dyn Clock,
    owner_email: &str,
) -> ReminderReport {
    let reminders: Vec<Result<Reminder>> = due_reminders(store, clock)
        .into_iter()
        .map(|a| compose(store, hours, a, owner_email))
        .collect();

    let mut report = ReminderReport::default();
    for reminder in reminders {
        let outcome = reminder.and_then(|r| {
            mailer.send(&r.to_client)?;
            mailer.send(&r.to_owner)?;
            store.mark_reminder_sent(r.appointment)?;
            Ok(r.appointment)
        });
        match outcome {
            Ok(id) => {
                info!(appointment = %id, "reminder sent");
                report.sent += 1;
            }
            Err(e) => {
                warn!(error = %e, "reminder failed");
                report.failed += 1;
            }
        }
    }
    report
}
