//! Tabular exports of the appointment log and the service list.

use std::fmt;

use csv::Writer;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SalonError};
use crate::hours::BusinessHours;
use crate::store::Store;

const MISSING: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Pdf => "PDF",
        })
    }
}

/// Appointment log: service, client, local start time and status.
pub fn appointments_csv(store: &Store, hours: &BusinessHours) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["Service", "Client", "Date and time", "Status"])?;

    let tz = hours.timezone();
    let appointments = store.appointments();
    for appointment in &appointments {
        let service = appointment
            .service_id
            .and_then(|id| store.service(id).ok())
            .map_or(MISSING, |s| s.name.as_str());
        let client = store
            .client(appointment.client_id)
            .map_or(MISSING, |c| c.name.as_str());
        let when = appointment
            .starts_at
            .with_timezone(&tz)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        wtr.write_record([service, client, when.as_str(), appointment.status.as_str()])?;
    }

    info!(rows = appointments.len(), "exported appointment log");
    finish(wtr)
}

/// Service list: name, description, price and duration.
pub fn services_csv(store: &Store) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["Name", "Description", "Price", "Duration (min)"])?;

    let services = store.services();
    for service in &services {
        wtr.write_record([
            service.name.clone(),
            service.description.clone(),
            service.price.to_string(),
            service.duration_minutes.to_string(),
        ])?;
    }

    info!(rows = services.len(), "exported service list");
    finish(wtr)
}

/// Render the appointment log in `format`. Only CSV has a renderer; asking
/// for anything else refuses the export.
pub fn appointment_report(store: &Store, hours: &BusinessHours, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => appointments_csv(store, hours),
        ExportFormat::Pdf => {
            warn!(%format, "export requested but no renderer is available");
            Err(SalonError::ExportUnavailable("PDF"))
        }
    }
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| SalonError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    String::from_utf8(bytes).map_err(|e| SalonError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
