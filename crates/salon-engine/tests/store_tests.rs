//! Tests for the record store: uniqueness, cascades, and write-time booking checks.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::Sao_Paulo;
use salon_engine::availability::{list_slots, SlotState};
use salon_engine::{
    BusinessHours, ClientDraft, ClientId, FixedClock, Price, SalonError, ServiceDraft, Status,
    Store,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn registered() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn local(h: u32, m: u32) -> DateTime<Utc> {
    Sao_Paulo
        .with_ymd_and_hms(2026, 3, 16, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn clock() -> FixedClock {
    FixedClock(
        Sao_Paulo
            .with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    )
}

fn hourly() -> BusinessHours {
    BusinessHours::default().with_step(60).unwrap()
}

fn client(name: &str, email: &str, tax_id: Option<&str>) -> ClientDraft {
    ClientDraft {
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("+55 (11) 98765-4321".to_string()),
        tax_id: tax_id.map(str::to_string),
    }
}

fn service(name: &str, minutes: u32) -> ServiceDraft {
    ServiceDraft {
        name: name.to_string(),
        description: format!("{} description", name),
        price: "120.00".parse::<Price>().unwrap(),
        duration_minutes: minutes,
        image: None,
    }
}

// ── Clients ─────────────────────────────────────────────────────────────────

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let mut store = Store::in_memory();
    store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();

    let err = store
        .add_client(&client("Ana B", "ANA@example.com", None), registered())
        .unwrap_err();
    assert!(matches!(err, SalonError::DuplicateUniqueField { field: "email", .. }));
    assert_eq!(store.search_clients("").len(), 1);
}

#[test]
fn duplicate_tax_id_is_rejected() {
    let mut store = Store::in_memory();
    store
        .add_client(&client("Ana", "ana@example.com", Some("12345678901")), registered())
        .unwrap();

    let err = store
        .add_client(&client("Bia", "bia@example.com", Some("12345678901")), registered())
        .unwrap_err();
    assert!(matches!(err, SalonError::DuplicateUniqueField { field: "tax_id", .. }));
}

#[test]
fn clients_without_tax_id_do_not_collide() {
    let mut store = Store::in_memory();
    store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    store.add_client(&client("Bia", "bia@example.com", Some("")), registered()).unwrap();
    assert_eq!(store.search_clients("").len(), 2);
}

#[test]
fn invalid_identifiers_are_reported_per_field() {
    let mut store = Store::in_memory();

    let mut bad_phone = client("Ana", "ana@example.com", None);
    bad_phone.phone = Some("ninety".to_string());
    let err = store.add_client(&bad_phone, registered()).unwrap_err();
    assert!(matches!(err, SalonError::InvalidIdentifier { field: "phone", .. }));

    let err = store
        .add_client(&client("Ana", "ana@example.com", Some("123")), registered())
        .unwrap_err();
    assert!(matches!(err, SalonError::InvalidIdentifier { field: "tax_id", .. }));
}

#[test]
fn update_keeps_registration_date_and_own_email() {
    let mut store = Store::in_memory();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();

    let updated = store
        .update_client(ana.id, &client("Ana Souza", "ana@example.com", Some("12345678901")))
        .unwrap();

    assert_eq!(updated.name, "Ana Souza");
    assert_eq!(updated.registered_on, registered());
    assert_eq!(updated.tax_id.as_deref(), Some("12345678901"));
}

#[test]
fn update_cannot_steal_another_clients_email() {
    let mut store = Store::in_memory();
    store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let bia = store.add_client(&client("Bia", "bia@example.com", None), registered()).unwrap();

    let err = store
        .update_client(bia.id, &client("Bia", "ana@example.com", None))
        .unwrap_err();
    assert!(matches!(err, SalonError::DuplicateUniqueField { .. }));
}

#[test]
fn search_matches_name_email_or_tax_id_ordered_by_name() {
    let mut store = Store::in_memory();
    store.add_client(&client("Carla", "carla@example.com", None), registered()).unwrap();
    store
        .add_client(&client("ana", "ana@salon.test", Some("98765432100")), registered())
        .unwrap();
    store.add_client(&client("Bruna", "bruna@example.com", None), registered()).unwrap();

    let names = |q: &str| -> Vec<String> {
        store.search_clients(q).iter().map(|c| c.name.clone()).collect()
    };
    assert_eq!(names(""), ["ana", "Bruna", "Carla"]);
    assert_eq!(names("EXAMPLE"), ["Bruna", "Carla"]);
    assert_eq!(names("987654"), ["ana"]);
}

#[test]
fn removing_a_client_cascades_to_appointments() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let bia = store.add_client(&client("Bia", "bia@example.com", None), registered()).unwrap();
    let lashes = store.add_service(&service("Lash lift", 60)).unwrap();

    store.book(ana.id, lashes.id, local(10, 0), &hours, &clock()).unwrap();
    store.book(bia.id, lashes.id, local(11, 0), &hours, &clock()).unwrap();

    store.remove_client(ana.id).unwrap();

    let remaining = store.appointments();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].client_id, bia.id);
    assert!(store.client(ana.id).is_err());
}

#[test]
fn missing_records_are_not_found() {
    let mut store = Store::in_memory();
    let err = store.remove_client(ClientId(42)).unwrap_err();
    assert!(matches!(err, SalonError::NotFound { entity: "client", id: 42 }));
}

// ── Services ────────────────────────────────────────────────────────────────

#[test]
fn services_are_listed_by_name() {
    let mut store = Store::in_memory();
    store.add_service(&service("Volume lashes", 90)).unwrap();
    store.add_service(&service("Brow design", 30)).unwrap();
    let names: Vec<&str> = store.services().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Brow design", "Volume lashes"]);
}

#[test]
fn zero_duration_service_is_rejected() {
    let mut store = Store::in_memory();
    assert!(store.add_service(&service("Instant", 0)).is_err());
}

#[test]
fn removing_a_service_keeps_its_appointments_blocking() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let long = store.add_service(&service("Full set", 90)).unwrap();
    let booked = store.book(ana.id, long.id, local(10, 0), &hours, &clock()).unwrap();

    store.remove_service(long.id).unwrap();

    let appointment = store.appointment(booked.id).unwrap();
    assert_eq!(appointment.service_id, None);
    assert_eq!(store.effective_duration(appointment), 90);
    let busy = store.busy_on(day(), &hours);
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].end, local(11, 30));
}

#[test]
fn service_duration_change_applies_to_existing_bookings() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let brows = store.add_service(&service("Brows", 30)).unwrap();
    store.book(ana.id, brows.id, local(10, 0), &hours, &clock()).unwrap();

    store.update_service(brows.id, &service("Brows", 60)).unwrap();

    assert_eq!(store.busy_on(day(), &hours)[0].end, local(11, 0));
}

// ── Booking ─────────────────────────────────────────────────────────────────

#[test]
fn new_bookings_are_pending_and_snapshot_duration() {
    let mut store = Store::in_memory();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let lift = store.add_service(&service("Lash lift", 75)).unwrap();

    let booked = store.book(ana.id, lift.id, local(9, 0), &hourly(), &clock()).unwrap();

    assert_eq!(booked.status, Status::Pending);
    assert_eq!(booked.booked_duration_minutes, 75);
    assert!(!booked.reminder_sent);
}

#[test]
fn second_booking_over_the_same_slot_conflicts() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let bia = store.add_client(&client("Bia", "bia@example.com", None), registered()).unwrap();
    let lift = store.add_service(&service("Lash lift", 60)).unwrap();

    store.book(ana.id, lift.id, local(10, 0), &hours, &clock()).unwrap();
    let err = store.book(bia.id, lift.id, local(10, 0), &hours, &clock()).unwrap_err();

    assert!(matches!(err, SalonError::SlotConflict { .. }));
    assert_eq!(store.appointments().len(), 1);
}

#[test]
fn cancelled_appointment_frees_its_slot() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let bia = store.add_client(&client("Bia", "bia@example.com", None), registered()).unwrap();
    let lift = store.add_service(&service("Lash lift", 60)).unwrap();

    let first = store.book(ana.id, lift.id, local(10, 0), &hours, &clock()).unwrap();
    store.set_status(first.id, Status::Confirmed).unwrap();
    assert!(store.book(bia.id, lift.id, local(10, 0), &hours, &clock()).is_err());

    store.set_status(first.id, Status::Cancelled).unwrap();
    assert!(store.book(bia.id, lift.id, local(10, 0), &hours, &clock()).is_ok());
}

#[test]
fn booking_then_listing_shows_the_slot_occupied() {
    let mut store = Store::in_memory();
    let hours = hourly();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let lift = store.add_service(&service("Lash lift", 60)).unwrap();

    store.book(ana.id, lift.id, local(14, 0), &hours, &clock()).unwrap();

    let slots = list_slots(day(), 60, &hours, &store.busy_on(day(), &hours), &clock());
    let at_two = slots.iter().find(|s| s.start == local(14, 0)).unwrap();
    assert_eq!(at_two.state, SlotState::Booked);
    assert_eq!(slots.iter().filter(|s| s.is_occupied()).count(), 1);
}

#[test]
fn booking_unknown_client_or_service_fails() {
    let mut store = Store::in_memory();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let err = store
        .book(ana.id, salon_engine::ServiceId(9), local(10, 0), &hourly(), &clock())
        .unwrap_err();
    assert!(matches!(err, SalonError::NotFound { entity: "service", .. }));
}

#[test]
fn status_changes_are_unrestricted() {
    let mut store = Store::in_memory();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let lift = store.add_service(&service("Lash lift", 60)).unwrap();
    let booked = store.book(ana.id, lift.id, local(10, 0), &hourly(), &clock()).unwrap();

    assert_eq!(store.set_status(booked.id, Status::Completed).unwrap(), Status::Pending);
    assert_eq!(store.set_status(booked.id, Status::Pending).unwrap(), Status::Completed);
}

#[test]
fn previous_day_appointment_running_past_midnight_is_busy() {
    let mut store = Store::in_memory();
    let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
    let long = store.add_service(&service("Marathon", 120)).unwrap();
    let late = Sao_Paulo
        .with_ymd_and_hms(2026, 3, 15, 23, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let early_clock = FixedClock(
        Sao_Paulo
            .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    );

    // Book through UTC hours so a 23:00 local start is admissible.
    let wide = BusinessHours::parse("00:00", "23:59", 30, "UTC").unwrap();
    store.book(ana.id, long.id, late, &wide, &early_clock).unwrap();

    let busy = store.busy_on(day(), &BusinessHours::default());
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].start, late);
}

// ── Persistence ─────────────────────────────────────────────────────────────

#[test]
fn save_and_reopen_preserves_records_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salon.json");

    {
        let mut store = Store::open(&path).unwrap();
        let ana = store.add_client(&client("Ana", "ana@example.com", None), registered()).unwrap();
        let lift = store.add_service(&service("Lash lift", 60)).unwrap();
        store.book(ana.id, lift.id, local(10, 0), &hourly(), &clock()).unwrap();
        store.remove_client(ana.id).unwrap();
        store.save().unwrap();
    }

    let mut reopened = Store::open(&path).unwrap();
    assert!(reopened.appointments().is_empty());
    assert_eq!(reopened.services().len(), 1);

    // Identifiers are not reused after deletion.
    let bia = reopened
        .add_client(&client("Bia", "bia@example.com", None), registered())
        .unwrap();
    assert_eq!(bia.id, ClientId(2));
}

#[test]
fn opening_a_missing_file_yields_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("absent.json")).unwrap();
    assert!(store.appointments().is_empty());
    assert!(store.services().is_empty());
}

#[test]
fn overlapping_opens_on_one_path_keep_both_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salon.json");

    let mut first = Store::open(&path).unwrap();

    // The second store waits for the first to be dropped, then sees its records.
    let (started, ready) = std::sync::mpsc::channel();
    let second_path = path.clone();
    let second = std::thread::spawn(move || {
        started.send(()).unwrap();
        let mut store = Store::open(&second_path).unwrap();
        let bia = store
            .add_client(&client("Bia", "bia@example.com", None), registered())
            .unwrap();
        store.save().unwrap();
        bia.id
    });

    ready.recv().unwrap();
    let ana = first
        .add_client(&client("Ana", "ana@example.com", None), registered())
        .unwrap();
    first.save().unwrap();
    drop(first);

    let bia = second.join().unwrap();
    assert_eq!(ana.id, ClientId(1));
    assert_eq!(bia, ClientId(2));

    let reopened = Store::open(&path).unwrap();
    let names: Vec<&str> = reopened.search_clients("").iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Ana", "Bia"]);
}
