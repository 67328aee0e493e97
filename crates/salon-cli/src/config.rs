use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use salon_engine::BusinessHours;
use serde::Deserialize;

/// Settings read from `SALON_*` environment variables (or a `.env` file).
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Path of the JSON record store
    #[serde(default = "default_store")]
    pub store: PathBuf,
    /// IANA timezone appointments are scheduled in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Opening time, `HH:MM`
    #[serde(default = "default_open")]
    pub open: String,
    /// Closing time, `HH:MM`
    #[serde(default = "default_close")]
    pub close: String,
    /// Minutes between candidate slot starts
    #[serde(default = "default_step")]
    pub step_minutes: u32,
    /// Address that receives the owner's copy of reminders
    #[serde(default = "default_owner_email")]
    pub owner_email: String,
    /// File reminder emails are appended to; stdout when unset
    #[serde(default)]
    pub outbox: Option<PathBuf>,
}

fn default_store() -> PathBuf {
    PathBuf::from("salon.json")
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_open() -> String {
    "09:00".to_string()
}

fn default_close() -> String {
    "18:00".to_string()
}

fn default_step() -> u32 {
    30
}

fn default_owner_email() -> String {
    "owner@localhost".to_string()
}

impl Config {
    /// Load configuration from the environment, after reading `.env` if present.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        envy::prefixed("SALON_")
            .from_env::<Config>()
            .context("Failed to read SALON_* configuration")
    }

    pub fn business_hours(&self) -> Result<BusinessHours> {
        BusinessHours::parse(&self.open, &self.close, self.step_minutes, &self.timezone)
            .context("Invalid business hours configuration")
    }
}
