//! Clients, services, appointments and the small value types they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalonError};

/// Duration assumed when an appointment's service no longer exists and no
/// snapshot was recorded, and the default for new services.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ClientId);
id_type!(ServiceId);
id_type!(AppointmentId);

/// Currency amount with at most two decimal places, between 0 and 9999.99.
///
/// Serialized as a decimal string (`"45.50"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Decimal places kept for every amount.
    pub const SCALE: u32 = 2;

    /// Largest amount representable with six digits and two decimals.
    pub fn max() -> Decimal {
        Decimal::new(999_999, Self::SCALE)
    }

    pub fn new(amount: Decimal) -> Result<Self> {
        if amount.is_sign_negative() {
            return Err(SalonError::InvalidPrice(format!("{} is negative", amount)));
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(SalonError::InvalidPrice(format!(
                "{} has more than two decimal places",
                amount
            )));
        }
        if amount > Self::max() {
            return Err(SalonError::InvalidPrice(format!("{} exceeds {}", amount, Self::max())));
        }
        let mut amount = amount;
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self(Decimal::new(0, Self::SCALE))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = SalonError;

    fn try_from(amount: Decimal) -> Result<Self> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = SalonError;

    /// Accepts `45`, `45.5`, `45.50` and the comma decimal separator `45,50`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace(',', ".");
        if !normalized.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(SalonError::InvalidPrice(s.to_string()));
        }
        let amount = Decimal::from_str(&normalized).map_err(|_| SalonError::InvalidPrice(s.to_string()))?;
        Self::new(amount)
    }
}

/// Appointment status.
///
/// Any status may be set from any other; staff actions are not constrained
/// by a transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Confirmed,
        Status::Cancelled,
        Status::Completed,
    ];

    /// Pending and confirmed appointments occupy their interval.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Status::Pending | Status::Confirmed)
    }

    /// Move to `next`. Always permitted.
    pub fn transition_to(&mut self, next: Status) -> Status {
        std::mem::replace(self, next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Confirmed => "Confirmed",
            Status::Cancelled => "Cancelled",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SalonError;

    /// Accepts the English names and the legacy Portuguese labels.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Ok(Status::Pending),
            "confirmed" | "confirmado" => Ok(Status::Confirmed),
            "cancelled" | "canceled" | "cancelado" => Ok(Status::Cancelled),
            "completed" | "realizado" => Ok(Status::Completed),
            _ => Err(SalonError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Set when the client is created and never changed afterwards.
    pub registered_on: NaiveDate,
}

/// Client fields supplied by a form; identity and registration date are
/// assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    /// Path of an already square-cropped image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub duration_minutes: u32,
    pub image: Option<String>,
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: Price::default(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    /// Cleared when the service is deleted.
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    /// Service duration captured at booking time; used once the service is gone.
    #[serde(default = "default_duration")]
    pub booked_duration_minutes: u32,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub reminder_sent: bool,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}
