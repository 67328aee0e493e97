//! JSON-file backed records for clients, services and appointments.
//!
//! The store enforces the relational rules the booking flow depends on:
//! unique client email and tax ID, cascade delete of a client's
//! appointments, and nulling an appointment's service reference when the
//! service is deleted. Bookings are re-validated against the current
//! records immediately before insert.
//!
//! A file-backed store holds an exclusive advisory lock on `<path>.lock`
//! from [`Store::open`] until it is dropped. A second process opening the
//! same path waits for the lock and then reads the first one's saved
//! records, so neither overwrites the other.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
#[cfg(not(target_arch = "wasm32"))]
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::validate_booking;
use crate::clock::Clock;
use crate::conflict::{overlaps, BusyInterval};
use crate::error::{Result, SalonError};
use crate::hours::BusinessHours;
use crate::model::{
    Appointment, AppointmentId, Client, ClientDraft, ClientId, Service, ServiceDraft, ServiceId,
    Status,
};
use crate::validation::{validate_email, validate_name, validate_phone, validate_tax_id};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    next_client_id: u64,
    #[serde(default)]
    next_service_id: u64,
    #[serde(default)]
    next_appointment_id: u64,
    #[serde(default)]
    clients: Vec<Client>,
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    appointments: Vec<Appointment>,
}

#[derive(Debug, Default)]
pub struct Store {
    path: Option<PathBuf>,
    tables: Tables,
    /// Released when the store is dropped.
    _lock: Option<File>,
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Block until this process holds the exclusive lock for the store at `path`.
fn lock_store(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(sibling(path, ".lock"))?;
    #[cfg(not(target_arch = "wasm32"))]
    file.lock_exclusive()?;
    Ok(file)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Store {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Lock and load the store at `path`. A missing file is an empty store.
    ///
    /// Blocks while another open store holds the same path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = lock_store(&path)?;
        let tables = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            Tables::default()
        };
        debug!(path = %path.display(), "opened store");
        Ok(Self {
            path: Some(path),
            tables,
            _lock: Some(lock),
        })
    }

    /// Persist all records. Writes a sibling temp file and renames it over
    /// the target so readers never see a half-written store.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(&self.tables)?;
        let tmp = sibling(path, ".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "saved store");
        Ok(())
    }

    // ── Clients ─────────────────────────────────────────────────────────────

    fn check_client(&self, draft: &ClientDraft, exclude: Option<ClientId>) -> Result<ClientDraft> {
        let draft = ClientDraft {
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: non_empty(draft.phone.clone()),
            tax_id: non_empty(draft.tax_id.clone()),
        };

        validate_name(&draft.name)?;
        validate_email(&draft.email)?;
        if let Some(phone) = &draft.phone {
            validate_phone(phone)?;
        }
        if let Some(tax_id) = &draft.tax_id {
            validate_tax_id(tax_id)?;
        }

        let others = || self.tables.clients.iter().filter(|c| Some(c.id) != exclude);
        if let Some(tax_id) = &draft.tax_id {
            if others().any(|c| c.tax_id.as_deref() == Some(tax_id.as_str())) {
                return Err(SalonError::DuplicateUniqueField {
                    field: "tax_id",
                    value: tax_id.clone(),
                });
            }
        }
        if others().any(|c| c.email.eq_ignore_ascii_case(&draft.email)) {
            return Err(SalonError::DuplicateUniqueField {
                field: "email",
                value: draft.email.clone(),
            });
        }
        Ok(draft)
    }

    pub fn add_client(&mut self, draft: &ClientDraft, registered_on: NaiveDate) -> Result<Client> {
        let draft = self.check_client(draft, None)?;
        self.tables.next_client_id += 1;
        let client = Client {
            id: ClientId(self.tables.next_client_id),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            tax_id: draft.tax_id,
            registered_on,
        };
        self.tables.clients.push(client.clone());
        info!(client = %client.id, "client registered");
        Ok(client)
    }

    /// Replace a client's editable fields. The registration date is kept.
    pub fn update_client(&mut self, id: ClientId, draft: &ClientDraft) -> Result<Client> {
        let draft = self.check_client(draft, Some(id))?;
        let client = self
            .tables
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SalonError::NotFound {
                entity: "client",
                id: id.0,
            })?;
        client.name = draft.name;
        client.email = draft.email;
        client.phone = draft.phone;
        client.tax_id = draft.tax_id;
        info!(client = %id, "client updated");
        Ok(client.clone())
    }

    /// Delete a client together with all of their appointments.
    pub fn remove_client(&mut self, id: ClientId) -> Result<Client> {
        let index = self
            .tables
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or(SalonError::NotFound {
                entity: "client",
                id: id.0,
            })?;
        let client = self.tables.clients.remove(index);
        let before = self.tables.appointments.len();
        self.tables.appointments.retain(|a| a.client_id != id);
        info!(
            client = %id,
            appointments_removed = before - self.tables.appointments.len(),
            "client removed"
        );
        Ok(client)
    }

    pub fn client(&self, id: ClientId) -> Result<&Client> {
        self.tables
            .clients
            .iter()
            .find(|c| c.id == id)
            .ok_or(SalonError::NotFound {
                entity: "client",
                id: id.0,
            })
    }

    pub fn find_client_by_email(&self, email: &str) -> Option<&Client> {
        let email = email.trim();
        self.tables
            .clients
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
    }

    /// Clients whose name, email or tax ID contains `query` (case-insensitive),
    /// ordered by name. An empty query lists everyone.
    pub fn search_clients(&self, query: &str) -> Vec<&Client> {
        let query = query.trim().to_lowercase();
        let mut found: Vec<&Client> = self
            .tables
            .clients
            .iter()
            .filter(|c| {
                query.is_empty()
                    || c.name.to_lowercase().contains(&query)
                    || c.email.to_lowercase().contains(&query)
                    || c.tax_id.as_deref().is_some_and(|t| t.contains(&query))
            })
            .collect();
        found.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));
        found
    }

    // ── Services ────────────────────────────────────────────────────────────

    fn check_service(draft: &ServiceDraft) -> Result<()> {
        validate_name(&draft.name)?;
        if draft.duration_minutes == 0 {
            return Err(SalonError::InvalidIdentifier {
                field: "duration_minutes",
                reason: "must be at least one minute".to_string(),
            });
        }
        Ok(())
    }

    pub fn add_service(&mut self, draft: &ServiceDraft) -> Result<Service> {
        Self::check_service(draft)?;
        self.tables.next_service_id += 1;
        let service = Service {
            id: ServiceId(self.tables.next_service_id),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            price: draft.price,
            duration_minutes: draft.duration_minutes,
            image: non_empty(draft.image.clone()),
        };
        self.tables.services.push(service.clone());
        info!(service = %service.id, "service created");
        Ok(service)
    }

    pub fn update_service(&mut self, id: ServiceId, draft: &ServiceDraft) -> Result<Service> {
        Self::check_service(draft)?;
        let service = self
            .tables
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SalonError::NotFound {
                entity: "service",
                id: id.0,
            })?;
        service.name = draft.name.trim().to_string();
        service.description = draft.description.trim().to_string();
        service.price = draft.price;
        service.duration_minutes = draft.duration_minutes;
        service.image = non_empty(draft.image.clone());
        info!(service = %id, "service updated");
        Ok(service.clone())
    }

    /// Delete a service. Its appointments survive with no service reference
    /// and keep their booked duration.
    pub fn remove_service(&mut self, id: ServiceId) -> Result<Service> {
        let index = self
            .tables
            .services
            .iter()
            .position(|s| s.id == id)
            .ok_or(SalonError::NotFound {
                entity: "service",
                id: id.0,
            })?;
        let service = self.tables.services.remove(index);
        let mut orphaned = 0usize;
        for appointment in &mut self.tables.appointments {
            if appointment.service_id == Some(id) {
                appointment.booked_duration_minutes = service.duration_minutes;
                appointment.service_id = None;
                orphaned += 1;
            }
        }
        info!(service = %id, orphaned, "service removed");
        Ok(service)
    }

    pub fn service(&self, id: ServiceId) -> Result<&Service> {
        self.tables
            .services
            .iter()
            .find(|s| s.id == id)
            .ok_or(SalonError::NotFound {
                entity: "service",
                id: id.0,
            })
    }

    /// All services ordered by name.
    pub fn services(&self) -> Vec<&Service> {
        let mut services: Vec<&Service> = self.tables.services.iter().collect();
        services.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));
        services
    }

    // ── Appointments ────────────────────────────────────────────────────────

    /// Book `service` for `client` at `starts_at`.
    ///
    /// The conflict check runs here against the records as they are now, not
    /// as they were when slots were listed. The new appointment is Pending.
    pub fn book(
        &mut self,
        client_id: ClientId,
        service_id: ServiceId,
        starts_at: DateTime<Utc>,
        hours: &BusinessHours,
        clock: &dyn Clock,
    ) -> Result<Appointment> {
        self.client(client_id)?;
        let duration = self.service(service_id)?.duration_minutes;
        let busy = self.busy_on(hours.local_date(starts_at), hours);
        validate_booking(starts_at, duration, hours, &busy, clock)?;

        self.tables.next_appointment_id += 1;
        let appointment = Appointment {
            id: AppointmentId(self.tables.next_appointment_id),
            client_id,
            service_id: Some(service_id),
            booked_duration_minutes: duration,
            starts_at,
            status: Status::Pending,
            reminder_sent: false,
        };
        self.tables.appointments.push(appointment.clone());
        info!(
            appointment = %appointment.id,
            client = %client_id,
            service = %service_id,
            starts_at = %starts_at,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Set an appointment's status, returning the previous one.
    pub fn set_status(&mut self, id: AppointmentId, status: Status) -> Result<Status> {
        let appointment = self.appointment_mut(id)?;
        let previous = appointment.status.transition_to(status);
        info!(appointment = %id, from = %previous, to = %status, "status changed");
        Ok(previous)
    }

    pub fn mark_reminder_sent(&mut self, id: AppointmentId) -> Result<()> {
        self.appointment_mut(id)?.reminder_sent = true;
        Ok(())
    }

    fn appointment_mut(&mut self, id: AppointmentId) -> Result<&mut Appointment> {
        self.tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(SalonError::NotFound {
                entity: "appointment",
                id: id.0,
            })
    }

    pub fn appointment(&self, id: AppointmentId) -> Result<&Appointment> {
        self.tables
            .appointments
            .iter()
            .find(|a| a.id == id)
            .ok_or(SalonError::NotFound {
                entity: "appointment",
                id: id.0,
            })
    }

    /// All appointments in chronological order.
    pub fn appointments(&self) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self.tables.appointments.iter().collect();
        appointments.sort_by_key(|a| (a.starts_at, a.id));
        appointments
    }

    pub fn appointments_for_client(&self, client_id: ClientId) -> Vec<&Appointment> {
        self.appointments()
            .into_iter()
            .filter(|a| a.client_id == client_id)
            .collect()
    }

    /// Duration of the appointment's live service, or the snapshot taken at
    /// booking time once the service is gone.
    pub fn effective_duration(&self, appointment: &Appointment) -> u32 {
        appointment
            .service_id
            .and_then(|id| self.service(id).ok())
            .map(|s| s.duration_minutes)
            .unwrap_or(appointment.booked_duration_minutes)
    }

    pub fn effective_interval(&self, appointment: &Appointment) -> BusyInterval {
        BusyInterval::new(appointment.starts_at, self.effective_duration(appointment))
    }

    /// Intervals of blocking appointments that touch the local day `date`.
    pub fn busy_on(&self, date: NaiveDate, hours: &BusinessHours) -> Vec<BusyInterval> {
        let (start, end) = hours.day_window(date);
        let day = BusyInterval { start, end };
        let mut busy: Vec<BusyInterval> = self
            .tables
            .appointments
            .iter()
            .filter(|a| a.status.is_blocking())
            .map(|a| self.effective_interval(a))
            .filter(|interval| overlaps(interval, &day))
            .collect();
        busy.sort();
        busy
    }
}
