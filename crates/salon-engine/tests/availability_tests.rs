//! Tests for slot listing and booking admission.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::Sao_Paulo;
use salon_engine::availability::{list_slots, validate_booking, SlotState};
use salon_engine::{BusinessHours, BusyInterval, FixedClock, SalonError};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn hours(step: u32) -> BusinessHours {
    BusinessHours::new(
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        step,
        Sao_Paulo,
    )
    .unwrap()
}

/// Local Sao Paulo wall-clock time on the test day, as UTC.
fn local(h: u32, m: u32) -> DateTime<Utc> {
    Sao_Paulo
        .with_ymd_and_hms(2026, 3, 16, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// A clock pinned to the day before the test day.
fn yesterday() -> FixedClock {
    FixedClock(
        Sao_Paulo
            .with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    )
}

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

// ── list_slots ──────────────────────────────────────────────────────────────

#[test]
fn hourly_slots_with_one_confirmed_appointment() {
    // 09:00-18:00, step 60, 60-minute service, booked 10:00-11:00.
    let busy = vec![BusyInterval::new(local(10, 0), 60)];

    let slots = list_slots(day(), 60, &hours(60), &busy, &yesterday());

    let times: Vec<String> = slots.iter().map(|s| hhmm(s.time)).collect();
    assert_eq!(
        times,
        ["09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
    );
    let occupied: Vec<bool> = slots.iter().map(|s| s.is_occupied()).collect();
    assert_eq!(
        occupied,
        [false, true, false, false, false, false, false, false, false]
    );
    assert_eq!(slots[1].state, SlotState::Booked);
}

#[test]
fn no_slot_starts_at_or_after_closing() {
    let slots = list_slots(day(), 60, &hours(60), &[], &yesterday());
    let last = slots.last().unwrap();
    assert_eq!(hhmm(last.time), "17:00");
    assert_eq!(last.end, local(18, 0));
}

#[test]
fn half_hour_step_lists_every_fitting_start() {
    let slots = list_slots(day(), 60, &hours(30), &[], &yesterday());
    // 09:00, 09:30, ..., 17:00
    assert_eq!(slots.len(), 17);
    assert_eq!(hhmm(slots[1].time), "09:30");
    assert!(slots.iter().all(|s| s.state == SlotState::Free));
}

#[test]
fn long_service_shrinks_the_day() {
    let slots = list_slots(day(), 150, &hours(30), &[], &yesterday());
    // Last start that still ends by 18:00 is 15:30.
    assert_eq!(hhmm(slots.last().unwrap().time), "15:30");
}

#[test]
fn service_longer_than_business_day_has_no_slots() {
    let slots = list_slots(day(), 10 * 60, &hours(30), &[], &yesterday());
    assert!(slots.is_empty());
}

#[test]
fn half_hour_slots_around_a_booking_are_occupied() {
    // Booked 10:00-11:00; a 60-minute slot at 09:30 runs into it, 11:00 does not.
    let busy = vec![BusyInterval::new(local(10, 0), 60)];
    let slots = list_slots(day(), 60, &hours(30), &busy, &yesterday());

    let state_at = |h: u32, m: u32| {
        slots
            .iter()
            .find(|s| s.start == local(h, m))
            .map(|s| s.state)
            .unwrap()
    };
    assert_eq!(state_at(9, 0), SlotState::Free);
    assert_eq!(state_at(9, 30), SlotState::Booked);
    assert_eq!(state_at(10, 0), SlotState::Booked);
    assert_eq!(state_at(10, 30), SlotState::Booked);
    assert_eq!(state_at(11, 0), SlotState::Free);
}

#[test]
fn todays_elapsed_slots_are_marked_past() {
    let noon = FixedClock(local(12, 0));
    let slots = list_slots(day(), 60, &hours(60), &[], &noon);

    // Every candidate is still listed.
    assert_eq!(slots.len(), 9);
    for slot in &slots {
        if slot.start <= local(12, 0) {
            assert_eq!(slot.state, SlotState::Past, "{} should be past", hhmm(slot.time));
        } else {
            assert_eq!(slot.state, SlotState::Free, "{} should be free", hhmm(slot.time));
        }
    }
}

#[test]
fn listing_is_idempotent() {
    let busy = vec![
        BusyInterval::new(local(10, 0), 60),
        BusyInterval::new(local(14, 30), 90),
    ];
    let clock = yesterday();
    let first = list_slots(day(), 45, &hours(30), &busy, &clock);
    let second = list_slots(day(), 45, &hours(30), &busy, &clock);
    assert_eq!(first, second);
}

#[test]
fn zero_duration_falls_back_to_an_hour() {
    let a = list_slots(day(), 0, &hours(60), &[], &yesterday());
    let b = list_slots(day(), 60, &hours(60), &[], &yesterday());
    assert_eq!(a, b);
}

#[test]
fn wire_view_uses_hora_and_ocupado() {
    let busy = vec![BusyInterval::new(local(9, 0), 60)];
    let slots = list_slots(day(), 60, &hours(60), &busy, &yesterday());
    let json = serde_json::to_string(&slots[0].view()).unwrap();
    assert_eq!(json, r#"{"hora":"09:00","ocupado":true}"#);
}

// ── validate_booking ────────────────────────────────────────────────────────

#[test]
fn booking_at_last_fitting_start_succeeds() {
    assert!(validate_booking(local(17, 0), 60, &hours(30), &[], &yesterday()).is_ok());
}

#[test]
fn booking_one_minute_past_last_fitting_start_fails() {
    let err = validate_booking(local(17, 1), 60, &hours(30), &[], &yesterday()).unwrap_err();
    assert!(matches!(err, SalonError::OutsideBusinessHours));
}

#[test]
fn booking_before_opening_fails() {
    let err = validate_booking(local(8, 30), 60, &hours(30), &[], &yesterday()).unwrap_err();
    assert!(matches!(err, SalonError::OutsideBusinessHours));
}

#[test]
fn booking_over_a_blocking_appointment_conflicts() {
    let busy = vec![BusyInterval::new(local(10, 0), 60)];
    let err = validate_booking(local(10, 0), 60, &hours(60), &busy, &yesterday()).unwrap_err();
    match err {
        SalonError::SlotConflict { conflicting_start } => assert_eq!(conflicting_start, local(10, 0)),
        other => panic!("expected SlotConflict, got {:?}", other),
    }
}

#[test]
fn partial_overlap_conflicts() {
    let busy = vec![BusyInterval::new(local(10, 0), 60)];
    let err = validate_booking(local(10, 30), 30, &hours(30), &busy, &yesterday()).unwrap_err();
    assert!(matches!(err, SalonError::SlotConflict { .. }));
}

#[test]
fn adjacent_booking_does_not_conflict() {
    let busy = vec![BusyInterval::new(local(10, 0), 60)];
    assert!(validate_booking(local(11, 0), 60, &hours(60), &busy, &yesterday()).is_ok());
    assert!(validate_booking(local(9, 0), 60, &hours(60), &busy, &yesterday()).is_ok());
}

#[test]
fn past_time_fails_even_when_conflicting() {
    let busy = vec![BusyInterval::new(local(10, 0), 60)];
    let afternoon = FixedClock(local(15, 0));
    let err = validate_booking(local(10, 0), 60, &hours(60), &busy, &afternoon).unwrap_err();
    assert!(matches!(err, SalonError::PastDateTime));
}

#[test]
fn booking_exactly_now_is_past() {
    let clock = FixedClock(local(10, 0));
    let err = validate_booking(local(10, 0), 60, &hours(60), &[], &clock).unwrap_err();
    assert!(matches!(err, SalonError::PastDateTime));
}
