use crate::enums::BookingStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled flight. `seats_available` is the remaining capacity, i.e. the
/// seats not yet allocated to any active booking; it starts at `capacity` and
/// is maintained exclusively by the booking and cancellation operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    /// Unique flight code, e.g. "AI101".
    pub code: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub capacity: i64,
    pub seats_available: i64,
    /// Fare per seat.
    pub fare: Decimal,
}

/// Input for creating a flight. The id is assigned by the repository and the
/// remaining capacity starts at `capacity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub code: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub capacity: i64,
    pub fare: Decimal,
}

/// Partial update for a flight; `None` fields are left untouched. Capacity is
/// deliberately not patchable, it is owned by the booking lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightPatch {
    pub code: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure: Option<DateTime<Utc>>,
    pub fare: Option<Decimal>,
}

/// Filter for flight queries; `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightFilter {
    pub code: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub passport_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPassenger {
    pub name: String,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub passport_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassengerPatch {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub passport_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassengerFilter {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
}

/// A seat reservation tying one passenger to one flight. `amount` is the
/// total fare captured at booking time (per-seat fare times `seats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub passenger_id: Uuid,
    pub seats: i64,
    pub amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub flight_id: Uuid,
    pub passenger_id: Uuid,
    pub seats: i64,
}

/// Partial update for a booking. Changing `seats` re-settles the flight's
/// remaining capacity and the booked amount in the same transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    pub seats: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingFilter {
    pub flight_id: Option<Uuid>,
    pub passenger_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

/// The record of a booking being cancelled. A booking has at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCancellation {
    pub booking_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationPatch {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationFilter {
    pub booking_id: Option<Uuid>,
}
