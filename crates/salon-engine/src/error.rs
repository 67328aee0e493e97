//! Error types for salon-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalonError {
    /// Booking attempted for an instant that is not strictly in the future.
    #[error("cannot book a time that has already passed")]
    PastDateTime,

    /// Booking overlaps a pending or confirmed appointment.
    #[error("this time is no longer available (overlaps the appointment at {conflicting_start}); choose another slot")]
    SlotConflict { conflicting_start: DateTime<Utc> },

    /// The appointment would start before opening or end after closing.
    #[error("appointment must fit within business hours")]
    OutsideBusinessHours,

    #[error("invalid {field}: {reason}")]
    InvalidIdentifier { field: &'static str, reason: String },

    #[error("a client with this {field} is already registered: {value}")]
    DuplicateUniqueField { field: &'static str, value: String },

    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid business hours: {0}")]
    InvalidHours(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// An export format whose renderer is not part of this build.
    #[error("{0} export is not available in this build")]
    ExportUnavailable(&'static str),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, SalonError>;
