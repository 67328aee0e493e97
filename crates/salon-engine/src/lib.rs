//! # salon-engine
//!
//! Appointment booking for a salon: which slots of a day are free for a
//! service, whether a specific start time may be booked, and the client,
//! service and appointment records those decisions read from.
//!
//! All instants are UTC; wall-clock reasoning happens in the single business
//! timezone carried by [`BusinessHours`]. "Now" is always supplied through a
//! [`Clock`] so every decision is reproducible.
//!
//! ## Modules
//!
//! - [`availability`] - day + duration → ordered slots; booking admission check
//! - [`conflict`] - half-open interval overlap rule
//! - [`hours`] - opening/closing times, slot step, timezone
//! - [`model`] - clients, services, appointments, status, price
//! - [`validation`] - phone, tax ID, email and name checks
//! - [`store`] - JSON-file records with uniqueness and cascade rules
//! - [`calendar`] - calendar feed and upcoming-appointment notice
//! - [`reminders`] - reminder selection, composition and dispatch
//! - [`stats`] - dashboard counters and daily series
//! - [`export`] - CSV exports
//! - [`clock`] - injectable time source
//! - [`error`] - Error types

pub mod availability;
pub mod calendar;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod export;
pub mod hours;
pub mod model;
pub mod reminders;
pub mod stats;
pub mod store;
pub mod validation;

pub use availability::{list_slots, validate_booking, Slot, SlotState, SlotView};
pub use clock::{Clock, FixedClock, SystemClock};
pub use conflict::{first_conflict, overlaps, BusyInterval};
pub use error::SalonError;
pub use hours::BusinessHours;
pub use model::{
    Appointment, AppointmentId, Client, ClientDraft, ClientId, Price, Service, ServiceDraft,
    ServiceId, Status,
};
pub use store::Store;
