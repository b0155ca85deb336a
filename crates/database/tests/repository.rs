//! Integration tests for the record access operations, run against an
//! in-memory SQLite database so no external service is required.

use chrono::{TimeZone, Utc};
use configuration::DatabaseSettings;
use core_types::{
    BookingFilter, BookingPatch, BookingStatus, CancellationFilter, FlightFilter, FlightPatch,
    NewBooking, NewCancellation, NewFlight, NewPassenger,
};
use database::{connect, ping, run_migrations, DbError, DbRepository};
use rust_decimal::Decimal;
use uuid::Uuid;

async fn repo() -> DbRepository {
    let settings = DatabaseSettings {
        driver: "sqlite".to_string(),
        database: ":memory:".to_string(),
        // A single pooled connection keeps every query on the same in-memory
        // database.
        max_connections: 1,
        ..DatabaseSettings::default()
    };
    let pool = connect(&settings).await.expect("in-memory sqlite pool");
    run_migrations(&pool).await.expect("schema applied");
    DbRepository::new(pool)
}

fn flight(code: &str, capacity: i64) -> NewFlight {
    NewFlight {
        code: code.to_string(),
        origin: "DEL".to_string(),
        destination: "BOM".to_string(),
        departure: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        capacity,
        fare: Decimal::new(45_000, 2), // 450.00 per seat
    }
}

fn passenger(name: &str) -> NewPassenger {
    NewPassenger {
        name: name.to_string(),
        nationality: Some("IN".to_string()),
        gender: None,
        passport_number: Some("P1234567".to_string()),
        phone: None,
        address: None,
    }
}

#[tokio::test]
async fn ping_reports_a_live_pool() {
    let settings = DatabaseSettings {
        driver: "sqlite".to_string(),
        database: ":memory:".to_string(),
        max_connections: 1,
        ..DatabaseSettings::default()
    };
    let pool = connect(&settings).await.expect("pool");
    assert!(ping(&pool).await);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = repo().await;
    // repo() already migrated once; creating data and migrating again must
    // neither fail nor wipe anything.
    let _ = repo.create_flight(&flight("AI201", 5)).await.unwrap();
    let flights = repo.find_flights(&FlightFilter::default()).await.unwrap();
    assert_eq!(flights.len(), 1);
}

#[tokio::test]
async fn booking_decrements_remaining_capacity_by_exactly_n() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI101", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Asha Verma")).await.unwrap();

    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 4,
        })
        .await
        .unwrap();

    let stored = repo.get_flight(flight_id).await.unwrap();
    assert_eq!(stored.capacity, 10);
    assert_eq!(stored.seats_available, 6);

    let booking = repo.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.seats, 4);
    assert_eq!(booking.status, BookingStatus::Active);
    // 4 seats at 450.00 each
    assert_eq!(booking.amount, Decimal::new(180_000, 2));
}

#[tokio::test]
async fn overbooking_fails_and_leaves_capacity_unchanged() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI102", 3)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Ravi Nair")).await.unwrap();

    let err = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 5,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)));

    let stored = repo.get_flight(flight_id).await.unwrap();
    assert_eq!(stored.seats_available, 3);
    // No booking row may survive the failed transaction.
    let bookings = repo.find_bookings(&BookingFilter::default()).await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn cancellation_flips_status_and_restores_capacity() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI103", 8)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Meera Iyer")).await.unwrap();
    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 5,
        })
        .await
        .unwrap();

    let cancellation_id = repo
        .create_cancellation(&NewCancellation {
            booking_id,
            reason: "change of plans".to_string(),
        })
        .await
        .unwrap();

    let booking = repo.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let stored = repo.get_flight(flight_id).await.unwrap();
    assert_eq!(stored.seats_available, 8);

    let cancellation = repo.get_cancellation(cancellation_id).await.unwrap();
    assert_eq!(cancellation.booking_id, booking_id);
    assert_eq!(cancellation.reason, "change of plans");
}

#[tokio::test]
async fn double_cancellation_fails_without_double_credit() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI104", 6)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Arjun Rao")).await.unwrap();
    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 2,
        })
        .await
        .unwrap();

    repo.create_cancellation(&NewCancellation {
        booking_id,
        reason: "first".to_string(),
    })
    .await
    .unwrap();

    let err = repo
        .create_cancellation(&NewCancellation {
            booking_id,
            reason: "second".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidState(_)));

    let stored = repo.get_flight(flight_id).await.unwrap();
    assert_eq!(stored.seats_available, 6);

    let cancellations = repo
        .find_cancellations(&CancellationFilter {
            booking_id: Some(booking_id),
        })
        .await
        .unwrap();
    assert_eq!(cancellations.len(), 1);
}

#[tokio::test]
async fn cancelling_a_nonexistent_booking_is_invalid_state() {
    let repo = repo().await;
    let err = repo
        .create_cancellation(&NewCancellation {
            booking_id: Uuid::new_v4(),
            reason: "noop".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidState(_)));
}

#[tokio::test]
async fn find_without_filter_returns_all_rows() {
    let repo = repo().await;
    repo.create_flight(&flight("AI105", 10)).await.unwrap();
    repo.create_flight(&flight("AI106", 20)).await.unwrap();
    repo.create_flight(&flight("AI107", 30)).await.unwrap();

    let all = repo.find_flights(&FlightFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn find_with_non_matching_filter_returns_empty_not_error() {
    let repo = repo().await;
    repo.create_flight(&flight("AI108", 10)).await.unwrap();

    let none = repo
        .find_flights(&FlightFilter {
            origin: Some("XXX".to_string()),
            ..FlightFilter::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn find_filters_match_exact_fields() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI109", 10)).await.unwrap();
    repo.create_flight(&flight("AI110", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Divya Menon")).await.unwrap();
    repo.create_booking(&NewBooking {
        flight_id,
        passenger_id,
        seats: 1,
    })
    .await
    .unwrap();

    let by_code = repo
        .find_flights(&FlightFilter {
            code: Some("AI109".to_string()),
            ..FlightFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(by_code[0].id, flight_id);

    let active = repo
        .find_bookings(&BookingFilter {
            flight_id: Some(flight_id),
            status: Some(BookingStatus::Active),
            ..BookingFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].passenger_id, passenger_id);
}

#[tokio::test]
async fn ai101_booking_lifecycle_scenario() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI101", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Sana Khan")).await.unwrap();

    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 7,
        })
        .await
        .unwrap();
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 3);

    let err = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 5,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)));
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 3);

    repo.create_cancellation(&NewCancellation {
        booking_id,
        reason: "trip postponed".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 10);
}

#[tokio::test]
async fn duplicate_flight_code_is_a_constraint_violation() {
    let repo = repo().await;
    repo.create_flight(&flight("AI111", 10)).await.unwrap();
    let err = repo.create_flight(&flight("AI111", 12)).await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)));
}

#[tokio::test]
async fn booking_against_unknown_rows_is_a_constraint_violation() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI112", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Rohit Shetty")).await.unwrap();

    let unknown_passenger = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id: Uuid::new_v4(),
            seats: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown_passenger, DbError::ConstraintViolation(_)));

    let unknown_flight = repo
        .create_booking(&NewBooking {
            flight_id: Uuid::new_v4(),
            passenger_id,
            seats: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown_flight, DbError::ConstraintViolation(_)));
}

#[tokio::test]
async fn validation_failures_never_reach_storage() {
    let repo = repo().await;

    let empty_code = repo.create_flight(&flight("   ", 10)).await.unwrap_err();
    assert!(matches!(empty_code, DbError::Validation { field: "code", .. }));

    let negative_capacity = repo.create_flight(&flight("AI113", -1)).await.unwrap_err();
    assert!(matches!(
        negative_capacity,
        DbError::Validation { field: "capacity", .. }
    ));

    let flight_id = repo.create_flight(&flight("AI114", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Nisha Paul")).await.unwrap();
    let zero_seats = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(zero_seats, DbError::Validation { field: "seats", .. }));

    let empty_name = repo
        .create_passenger(&NewPassenger {
            name: "".to_string(),
            nationality: None,
            gender: None,
            passport_number: None,
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(empty_name, DbError::Validation { field: "name", .. }));

    // Only AI114 survived; every rejected input stayed out of storage.
    assert_eq!(
        repo.find_flights(&FlightFilter::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn update_flight_patches_only_provided_fields() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI115", 10)).await.unwrap();

    repo.update_flight(
        flight_id,
        &FlightPatch {
            destination: Some("MAA".to_string()),
            fare: Some(Decimal::new(52_500, 2)),
            ..FlightPatch::default()
        },
    )
    .await
    .unwrap();

    let stored = repo.get_flight(flight_id).await.unwrap();
    assert_eq!(stored.code, "AI115");
    assert_eq!(stored.origin, "DEL");
    assert_eq!(stored.destination, "MAA");
    assert_eq!(stored.fare, Decimal::new(52_500, 2));

    let missing = repo
        .update_flight(Uuid::new_v4(), &FlightPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(missing, DbError::NotFound { entity: "flight", .. }));
}

#[tokio::test]
async fn booking_seat_change_settles_capacity_and_amount() {
    let repo = repo().await;
    let flight_id = repo.create_flight(&flight("AI116", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Vikram Das")).await.unwrap();
    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 7,
        })
        .await
        .unwrap();

    // Shrinking the booking returns seats to the flight.
    repo.update_booking(booking_id, &BookingPatch { seats: Some(4) })
        .await
        .unwrap();
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 6);
    let booking = repo.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.seats, 4);
    assert_eq!(booking.amount, Decimal::new(180_000, 2));

    // Growing past the remaining capacity is rejected and nothing moves.
    let err = repo
        .update_booking(booking_id, &BookingPatch { seats: Some(11) })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)));
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 6);
    assert_eq!(repo.get_booking(booking_id).await.unwrap().seats, 4);

    // A cancelled booking cannot be resized.
    repo.create_cancellation(&NewCancellation {
        booking_id,
        reason: "done".to_string(),
    })
    .await
    .unwrap();
    let cancelled = repo
        .update_booking(booking_id, &BookingPatch { seats: Some(2) })
        .await
        .unwrap_err();
    assert!(matches!(cancelled, DbError::InvalidState(_)));
}

#[tokio::test]
async fn empty_booking_patch_still_requires_an_existing_row() {
    let repo = repo().await;

    let err = repo
        .update_booking(Uuid::new_v4(), &BookingPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "booking", .. }));

    // Against an existing booking the empty patch is a pure no-op.
    let flight_id = repo.create_flight(&flight("AI119", 10)).await.unwrap();
    let passenger_id = repo.create_passenger(&passenger("Tara Singh")).await.unwrap();
    let booking_id = repo
        .create_booking(&NewBooking {
            flight_id,
            passenger_id,
            seats: 3,
        })
        .await
        .unwrap();

    repo.update_booking(booking_id, &BookingPatch::default())
        .await
        .unwrap();
    assert_eq!(repo.get_booking(booking_id).await.unwrap().seats, 3);
    assert_eq!(repo.get_flight(flight_id).await.unwrap().seats_available, 7);
}

#[tokio::test]
async fn passenger_fields_roundtrip() {
    let repo = repo().await;
    let passenger_id = repo
        .create_passenger(&NewPassenger {
            name: "Lakshmi Rao".to_string(),
            nationality: Some("IN".to_string()),
            gender: Some("female".to_string()),
            passport_number: Some("Z9876543".to_string()),
            phone: Some("+91-98765-43210".to_string()),
            address: Some("14 MG Road, Bengaluru".to_string()),
        })
        .await
        .unwrap();

    let stored = repo.get_passenger(passenger_id).await.unwrap();
    assert_eq!(stored.name, "Lakshmi Rao");
    assert_eq!(stored.nationality.as_deref(), Some("IN"));
    assert_eq!(stored.gender.as_deref(), Some("female"));
    assert_eq!(stored.passport_number.as_deref(), Some("Z9876543"));
    assert_eq!(stored.phone.as_deref(), Some("+91-98765-43210"));
    assert_eq!(stored.address.as_deref(), Some("14 MG Road, Bengaluru"));
}

#[tokio::test]
async fn deletes_remove_rows_and_report_not_found() {
    let repo = repo().await;
    let passenger_id = repo.create_passenger(&passenger("Kiran Bedi")).await.unwrap();

    repo.delete_passenger(passenger_id).await.unwrap();
    let err = repo.delete_passenger(passenger_id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "passenger", .. }));

    let err = repo.get_passenger(passenger_id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "passenger", .. }));

    let err = repo.delete_flight(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "flight", .. }));
}

#[tokio::test]
async fn find_is_restartable_and_reflects_current_state() {
    let repo = repo().await;
    repo.create_flight(&flight("AI117", 10)).await.unwrap();

    let first = repo.find_flights(&FlightFilter::default()).await.unwrap();
    assert_eq!(first.len(), 1);

    repo.create_flight(&flight("AI118", 10)).await.unwrap();

    // Re-querying repeats the scan against the database, not a cached view.
    let second = repo.find_flights(&FlightFilter::default()).await.unwrap();
    assert_eq!(second.len(), 2);
}
