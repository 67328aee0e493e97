//! WASM bindings for salon-engine.
//!
//! Exposes slot listing and booking validation to a browser booking page via
//! `wasm-bindgen`. The page holds the busy intervals it fetched from the
//! server, so it can grey out taken slots and reject a stale pick before
//! submitting. All complex types cross the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p salon-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/salon_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use salon_engine::{list_slots, validate_booking, BusinessHours, BusyInterval, FixedClock, SlotView};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Input format for busy intervals passed from JavaScript.
#[derive(Deserialize)]
struct BusyInput {
    start: String,
    end: String,
}

/// Business hours as the page sends them. Missing fields take the defaults.
#[derive(Deserialize)]
struct HoursInput {
    #[serde(default = "default_open")]
    open: String,
    #[serde(default = "default_close")]
    close: String,
    #[serde(default = "default_step")]
    step_minutes: u32,
    #[serde(default = "default_timezone")]
    timezone: String,
}

fn default_open() -> String {
    "09:00".to_string()
}

fn default_close() -> String {
    "18:00".to_string()
}

fn default_step() -> u32 {
    salon_engine::hours::DEFAULT_STEP_MINUTES
}

fn default_timezone() -> String {
    salon_engine::hours::DEFAULT_TIMEZONE.name().to_string()
}

#[derive(Serialize)]
struct SlotsDto {
    slots: Vec<SlotView>,
}

#[derive(Serialize)]
struct ValidationDto {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with an offset, and naive datetimes, which are read as
/// local time in the business timezone.
fn parse_instant(s: &str, hours: &BusinessHours) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))?;
    hours
        .localize_naive(naive)
        .ok_or_else(|| format!("'{}' does not exist in {}", s, hours.timezone()))
}

fn parse_hours_json(json: &str) -> Result<BusinessHours, String> {
    let input: HoursInput =
        serde_json::from_str(json).map_err(|e| format!("Invalid hours JSON: {}", e))?;
    BusinessHours::parse(&input.open, &input.close, input.step_minutes, &input.timezone)
        .map_err(|e| e.to_string())
}

/// Convert a JSON array of `{start, end}` objects into busy intervals.
fn parse_busy_json(json: &str, hours: &BusinessHours) -> Result<Vec<BusyInterval>, String> {
    let inputs: Vec<BusyInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid busy JSON: {}", e))?;

    inputs
        .into_iter()
        .map(|input| {
            Ok(BusyInterval {
                start: parse_instant(&input.start, hours)?,
                end: parse_instant(&input.end, hours)?,
            })
        })
        .collect()
}

fn slots_json(
    date: &str,
    duration_minutes: u32,
    busy_json: &str,
    hours_json: &str,
    now_iso: &str,
) -> Result<String, String> {
    let hours = parse_hours_json(hours_json)?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", date, e))?;
    let busy = parse_busy_json(busy_json, &hours)?;
    let clock = FixedClock(parse_instant(now_iso, &hours)?);

    let slots = list_slots(date, duration_minutes, &hours, &busy, &clock);
    let dto = SlotsDto {
        slots: slots.iter().map(|s| s.view()).collect(),
    };
    serde_json::to_string(&dto).map_err(|e| format!("Serialization error: {}", e))
}

fn validation_json(
    candidate_iso: &str,
    duration_minutes: u32,
    busy_json: &str,
    hours_json: &str,
    now_iso: &str,
) -> Result<String, String> {
    let hours = parse_hours_json(hours_json)?;
    let candidate = parse_instant(candidate_iso, &hours)?;
    let busy = parse_busy_json(busy_json, &hours)?;
    let clock = FixedClock(parse_instant(now_iso, &hours)?);

    let dto = match validate_booking(candidate, duration_minutes, &hours, &busy, &clock) {
        Ok(()) => ValidationDto { ok: true, error: None },
        Err(e) => ValidationDto {
            ok: false,
            error: Some(e.to_string()),
        },
    };
    serde_json::to_string(&dto).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// List candidate slots for a day.
///
/// Returns a JSON string `{"slots":[{"hora":"09:00","ocupado":false}, ...]}`.
///
/// # Arguments
/// - `date` -- local day, "YYYY-MM-DD"
/// - `duration_minutes` -- service length; 0 means 60
/// - `busy_json` -- JSON array of `{start, end}` for pending/confirmed appointments
/// - `hours_json` -- `{open, close, step_minutes, timezone}`; `{}` for defaults
/// - `now_iso` -- the current instant, RFC 3339
#[wasm_bindgen(js_name = "listSlots")]
pub fn list_slots_js(
    date: &str,
    duration_minutes: u32,
    busy_json: &str,
    hours_json: &str,
    now_iso: &str,
) -> Result<String, JsValue> {
    slots_json(date, duration_minutes, busy_json, hours_json, now_iso).map_err(|e| JsValue::from_str(&e))
}

/// Check a candidate start before submitting a booking.
///
/// Returns `{"ok":true}` or `{"ok":false,"error":"..."}`. Malformed input is
/// thrown as an error instead.
#[wasm_bindgen(js_name = "validateBooking")]
pub fn validate_booking_js(
    candidate_iso: &str,
    duration_minutes: u32,
    busy_json: &str,
    hours_json: &str,
    now_iso: &str,
) -> Result<String, JsValue> {
    validation_json(candidate_iso, duration_minutes, busy_json, hours_json, now_iso)
        .map_err(|e| JsValue::from_str(&e))
}
