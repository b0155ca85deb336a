use crate::error::DbError;
use chrono::{DateTime, Utc};
use core_types::{
    Booking, BookingFilter, BookingPatch, BookingStatus, Cancellation, CancellationFilter,
    CancellationPatch, Flight, FlightFilter, FlightPatch, NewBooking, NewCancellation, NewFlight,
    NewPassenger, Passenger, PassengerFilter, PassengerPatch,
};
use rust_decimal::Decimal;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use std::str::FromStr;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// Every multi-statement operation (booking, cancellation, seat changes) runs
/// inside a single transaction scoped to the call, so concurrent clients of
/// the same database can never observe a partially applied capacity change.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: AnyPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Flights
    // ==========================================================================

    /// Inserts a flight and returns its assigned id. The remaining capacity
    /// starts at the full seat capacity.
    pub async fn create_flight(&self, flight: &NewFlight) -> Result<Uuid, DbError> {
        if flight.code.trim().is_empty() {
            return Err(DbError::Validation {
                field: "code",
                message: "flight code must not be empty".to_string(),
            });
        }
        if flight.capacity < 0 {
            return Err(DbError::Validation {
                field: "capacity",
                message: format!("seat capacity must be >= 0, got {}", flight.capacity),
            });
        }
        if flight.fare < Decimal::ZERO {
            return Err(DbError::Validation {
                field: "fare",
                message: format!("fare must not be negative, got {}", flight.fare),
            });
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO flights (id, code, origin, destination, departure, capacity, seats_available, fare) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id.to_string())
        .bind(&flight.code)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure.to_rfc3339())
        .bind(flight.capacity)
        .bind(flight.capacity)
        .bind(flight.fare.to_string())
        .execute(&self.pool)
        .await?;

        tracing::info!(flight_id = %id, code = %flight.code, "Flight created.");
        Ok(id)
    }

    /// Applies a partial update; `None` fields keep their stored value.
    pub async fn update_flight(&self, id: Uuid, patch: &FlightPatch) -> Result<(), DbError> {
        if let Some(code) = &patch.code {
            if code.trim().is_empty() {
                return Err(DbError::Validation {
                    field: "code",
                    message: "flight code must not be empty".to_string(),
                });
            }
        }
        if let Some(fare) = patch.fare {
            if fare < Decimal::ZERO {
                return Err(DbError::Validation {
                    field: "fare",
                    message: format!("fare must not be negative, got {fare}"),
                });
            }
        }

        let result = sqlx::query(
            "UPDATE flights SET \
                code = COALESCE($1, code), \
                origin = COALESCE($2, origin), \
                destination = COALESCE($3, destination), \
                departure = COALESCE($4, departure), \
                fare = COALESCE($5, fare) \
             WHERE id = $6",
        )
        .bind(patch.code.as_deref())
        .bind(patch.origin.as_deref())
        .bind(patch.destination.as_deref())
        .bind(patch.departure.map(|d| d.to_rfc3339()))
        .bind(patch.fare.map(|f| f.to_string()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "flight",
                id,
            });
        }
        Ok(())
    }

    pub async fn delete_flight(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "flight",
                id,
            });
        }
        Ok(())
    }

    pub async fn get_flight(&self, id: Uuid) -> Result<Flight, DbError> {
        let row = sqlx::query(
            "SELECT id, code, origin, destination, departure, capacity, seats_available, fare \
             FROM flights WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => flight_from_row(&row),
            None => Err(DbError::NotFound {
                entity: "flight",
                id,
            }),
        }
    }

    /// Fetches flights matching the filter; empty filter fields match every
    /// row. Each call re-executes the query against current state.
    pub async fn find_flights(&self, filter: &FlightFilter) -> Result<Vec<Flight>, DbError> {
        let rows = sqlx::query(
            "SELECT id, code, origin, destination, departure, capacity, seats_available, fare \
             FROM flights \
             WHERE ($1 IS NULL OR code = $1) \
               AND ($2 IS NULL OR origin = $2) \
               AND ($3 IS NULL OR destination = $3) \
             ORDER BY departure, code",
        )
        .bind(filter.code.as_deref())
        .bind(filter.origin.as_deref())
        .bind(filter.destination.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(flight_from_row).collect()
    }

    // ==========================================================================
    // Passengers
    // ==========================================================================

    pub async fn create_passenger(&self, passenger: &NewPassenger) -> Result<Uuid, DbError> {
        if passenger.name.trim().is_empty() {
            return Err(DbError::Validation {
                field: "name",
                message: "passenger name must not be empty".to_string(),
            });
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO passengers (id, name, nationality, gender, passport_number, phone, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id.to_string())
        .bind(&passenger.name)
        .bind(passenger.nationality.as_deref())
        .bind(passenger.gender.as_deref())
        .bind(passenger.passport_number.as_deref())
        .bind(passenger.phone.as_deref())
        .bind(passenger.address.as_deref())
        .execute(&self.pool)
        .await?;

        tracing::info!(passenger_id = %id, "Passenger created.");
        Ok(id)
    }

    pub async fn update_passenger(&self, id: Uuid, patch: &PassengerPatch) -> Result<(), DbError> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DbError::Validation {
                    field: "name",
                    message: "passenger name must not be empty".to_string(),
                });
            }
        }

        let result = sqlx::query(
            "UPDATE passengers SET \
                name = COALESCE($1, name), \
                nationality = COALESCE($2, nationality), \
                gender = COALESCE($3, gender), \
                passport_number = COALESCE($4, passport_number), \
                phone = COALESCE($5, phone), \
                address = COALESCE($6, address) \
             WHERE id = $7",
        )
        .bind(patch.name.as_deref())
        .bind(patch.nationality.as_deref())
        .bind(patch.gender.as_deref())
        .bind(patch.passport_number.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.address.as_deref())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "passenger",
                id,
            });
        }
        Ok(())
    }

    pub async fn delete_passenger(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM passengers WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "passenger",
                id,
            });
        }
        Ok(())
    }

    pub async fn get_passenger(&self, id: Uuid) -> Result<Passenger, DbError> {
        let row = sqlx::query(
            "SELECT id, name, nationality, gender, passport_number, phone, address \
             FROM passengers WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => passenger_from_row(&row),
            None => Err(DbError::NotFound {
                entity: "passenger",
                id,
            }),
        }
    }

    pub async fn find_passengers(
        &self,
        filter: &PassengerFilter,
    ) -> Result<Vec<Passenger>, DbError> {
        let rows = sqlx::query(
            "SELECT id, name, nationality, gender, passport_number, phone, address \
             FROM passengers \
             WHERE ($1 IS NULL OR name = $1) \
               AND ($2 IS NULL OR nationality = $2) \
               AND ($3 IS NULL OR passport_number = $3) \
             ORDER BY name",
        )
        .bind(filter.name.as_deref())
        .bind(filter.nationality.as_deref())
        .bind(filter.passport_number.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(passenger_from_row).collect()
    }

    // ==========================================================================
    // Bookings
    // ==========================================================================

    /// Books seats on a flight as a single all-or-nothing unit: the flight's
    /// remaining capacity is decremented only if it can cover the requested
    /// seats, and the booking row is inserted in the same transaction.
    ///
    /// Fails with `ConstraintViolation` when the flight or passenger does not
    /// exist or the flight cannot cover the requested seats; the flight's
    /// capacity is left unchanged in every failure case.
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Uuid, DbError> {
        if booking.seats < 1 {
            return Err(DbError::Validation {
                field: "seats",
                message: format!("a booking needs at least one seat, got {}", booking.seats),
            });
        }

        let mut tx = self.pool.begin().await?;

        // Referential checks run inside the transaction so both drivers report
        // unknown foreign keys identically.
        let passenger_exists = sqlx::query("SELECT id FROM passengers WHERE id = $1")
            .bind(booking.passenger_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !passenger_exists {
            return Err(DbError::ConstraintViolation(format!(
                "booking references unknown passenger {}",
                booking.passenger_id
            )));
        }

        let flight_row = sqlx::query("SELECT fare FROM flights WHERE id = $1")
            .bind(booking.flight_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(flight_row) = flight_row else {
            return Err(DbError::ConstraintViolation(format!(
                "booking references unknown flight {}",
                booking.flight_id
            )));
        };
        let fare = parse_decimal("fare", flight_row.try_get("fare")?)?;

        // Guarded decrement: the WHERE clause makes the capacity check and the
        // reservation one atomic statement, so two clients cannot both take
        // the last seats.
        let updated = sqlx::query(
            "UPDATE flights SET seats_available = seats_available - $1 \
             WHERE id = $2 AND seats_available >= $1",
        )
        .bind(booking.seats)
        .bind(booking.flight_id.to_string())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(DbError::ConstraintViolation(format!(
                "flight {} has insufficient remaining capacity for {} seats",
                booking.flight_id, booking.seats
            )));
        }

        let id = Uuid::new_v4();
        let amount = fare * Decimal::from(booking.seats);
        sqlx::query(
            "INSERT INTO bookings (id, flight_id, passenger_id, seats, amount, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id.to_string())
        .bind(booking.flight_id.to_string())
        .bind(booking.passenger_id.to_string())
        .bind(booking.seats)
        .bind(amount.to_string())
        .bind(BookingStatus::Active.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            booking_id = %id,
            flight_id = %booking.flight_id,
            seats = booking.seats,
            "Booking recorded."
        );
        Ok(id)
    }

    /// Changes the seat count of an active booking, settling the capacity
    /// delta against the flight and re-pricing the amount in one transaction.
    pub async fn update_booking(&self, id: Uuid, patch: &BookingPatch) -> Result<(), DbError> {
        if let Some(new_seats) = patch.seats {
            if new_seats < 1 {
                return Err(DbError::Validation {
                    field: "seats",
                    message: format!("a booking needs at least one seat, got {new_seats}"),
                });
            }
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT flight_id, seats, status FROM bookings WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(DbError::NotFound {
                entity: "booking",
                id,
            });
        };
        // An empty patch is a no-op, but only against a row that exists.
        let Some(new_seats) = patch.seats else {
            return Ok(());
        };
        let status = booking_status(&row.try_get::<String, _>("status")?)?;
        if status != BookingStatus::Active {
            return Err(DbError::InvalidState(format!(
                "booking {id} is cancelled and cannot be changed"
            )));
        }
        let flight_id: String = row.try_get("flight_id")?;
        let seats: i64 = row.try_get("seats")?;

        let delta = new_seats - seats;
        if delta > 0 {
            let updated = sqlx::query(
                "UPDATE flights SET seats_available = seats_available - $1 \
                 WHERE id = $2 AND seats_available >= $1",
            )
            .bind(delta)
            .bind(&flight_id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(DbError::ConstraintViolation(format!(
                    "flight {flight_id} has insufficient remaining capacity for {delta} more seats"
                )));
            }
        } else if delta < 0 {
            sqlx::query("UPDATE flights SET seats_available = seats_available + $1 WHERE id = $2")
                .bind(-delta)
                .bind(&flight_id)
                .execute(&mut *tx)
                .await?;
        }

        let fare_row = sqlx::query("SELECT fare FROM flights WHERE id = $1")
            .bind(&flight_id)
            .fetch_one(&mut *tx)
            .await?;
        let fare = parse_decimal("fare", fare_row.try_get("fare")?)?;
        let amount = fare * Decimal::from(new_seats);

        sqlx::query("UPDATE bookings SET seats = $1, amount = $2 WHERE id = $3")
            .bind(new_seats)
            .bind(amount.to_string())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes the booking row itself. This is a plain delete: it does not
    /// restore flight capacity, which is the cancellation flow's job.
    pub async fn delete_booking(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "booking",
                id,
            });
        }
        Ok(())
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, DbError> {
        let row = sqlx::query(
            "SELECT id, flight_id, passenger_id, seats, amount, status, created_at \
             FROM bookings WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => booking_from_row(&row),
            None => Err(DbError::NotFound {
                entity: "booking",
                id,
            }),
        }
    }

    pub async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, DbError> {
        let rows = sqlx::query(
            "SELECT id, flight_id, passenger_id, seats, amount, status, created_at \
             FROM bookings \
             WHERE ($1 IS NULL OR flight_id = $1) \
               AND ($2 IS NULL OR passenger_id = $2) \
               AND ($3 IS NULL OR status = $3) \
             ORDER BY created_at, id",
        )
        .bind(filter.flight_id.map(|id| id.to_string()))
        .bind(filter.passenger_id.map(|id| id.to_string()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    // ==========================================================================
    // Cancellations
    // ==========================================================================

    /// Cancels a booking as a single all-or-nothing unit: verifies the booking
    /// is currently active, marks it cancelled, credits the seats back to the
    /// flight's remaining capacity and inserts the cancellation record.
    ///
    /// Cancelling an already-cancelled or nonexistent booking fails with
    /// `InvalidState`, and capacity is never credited twice.
    pub async fn create_cancellation(
        &self,
        cancellation: &NewCancellation,
    ) -> Result<Uuid, DbError> {
        let booking_id = cancellation.booking_id;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT flight_id, seats, status FROM bookings WHERE id = $1")
            .bind(booking_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(DbError::InvalidState(format!(
                "cannot cancel booking {booking_id}: no such booking"
            )));
        };
        let status = booking_status(&row.try_get::<String, _>("status")?)?;
        if status != BookingStatus::Active {
            return Err(DbError::InvalidState(format!(
                "booking {booking_id} is already cancelled"
            )));
        }
        let flight_id: String = row.try_get("flight_id")?;
        let seats: i64 = row.try_get("seats")?;

        // Guarded flip. A concurrent cancellation of the same booking loses
        // this race and reports InvalidState instead of double-crediting.
        let flipped = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2 AND status = $3")
            .bind(BookingStatus::Cancelled.as_str())
            .bind(booking_id.to_string())
            .bind(BookingStatus::Active.as_str())
            .execute(&mut *tx)
            .await?;
        if flipped.rows_affected() == 0 {
            return Err(DbError::InvalidState(format!(
                "booking {booking_id} is already cancelled"
            )));
        }

        sqlx::query("UPDATE flights SET seats_available = seats_available + $1 WHERE id = $2")
            .bind(seats)
            .bind(&flight_id)
            .execute(&mut *tx)
            .await?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO cancellations (id, booking_id, reason, cancelled_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id.to_string())
        .bind(booking_id.to_string())
        .bind(&cancellation.reason)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            cancellation_id = %id,
            booking_id = %booking_id,
            seats_restored = seats,
            "Booking cancelled."
        );
        Ok(id)
    }

    pub async fn update_cancellation(
        &self,
        id: Uuid,
        patch: &CancellationPatch,
    ) -> Result<(), DbError> {
        let result =
            sqlx::query("UPDATE cancellations SET reason = COALESCE($1, reason) WHERE id = $2")
                .bind(patch.reason.as_deref())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "cancellation",
                id,
            });
        }
        Ok(())
    }

    /// Removes the cancellation record. The booking stays cancelled; this
    /// deletes the row and nothing else.
    pub async fn delete_cancellation(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM cancellations WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity: "cancellation",
                id,
            });
        }
        Ok(())
    }

    pub async fn get_cancellation(&self, id: Uuid) -> Result<Cancellation, DbError> {
        let row = sqlx::query(
            "SELECT id, booking_id, reason, cancelled_at FROM cancellations WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => cancellation_from_row(&row),
            None => Err(DbError::NotFound {
                entity: "cancellation",
                id,
            }),
        }
    }

    pub async fn find_cancellations(
        &self,
        filter: &CancellationFilter,
    ) -> Result<Vec<Cancellation>, DbError> {
        let rows = sqlx::query(
            "SELECT id, booking_id, reason, cancelled_at \
             FROM cancellations \
             WHERE ($1 IS NULL OR booking_id = $1) \
             ORDER BY cancelled_at, id",
        )
        .bind(filter.booking_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(cancellation_from_row).collect()
    }
}

// ==============================================================================
// Row mapping
// ==============================================================================
// Ids, timestamps and decimals are stored as text for portability across the
// supported drivers; corrupt stored values surface as `DbError::Decode`.

fn flight_from_row(row: &AnyRow) -> Result<Flight, DbError> {
    Ok(Flight {
        id: parse_uuid("id", row.try_get("id")?)?,
        code: row.try_get("code")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        departure: parse_timestamp("departure", row.try_get("departure")?)?,
        capacity: row.try_get("capacity")?,
        seats_available: row.try_get("seats_available")?,
        fare: parse_decimal("fare", row.try_get("fare")?)?,
    })
}

fn passenger_from_row(row: &AnyRow) -> Result<Passenger, DbError> {
    Ok(Passenger {
        id: parse_uuid("id", row.try_get("id")?)?,
        name: row.try_get("name")?,
        nationality: row.try_get("nationality")?,
        gender: row.try_get("gender")?,
        passport_number: row.try_get("passport_number")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
    })
}

fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    Ok(Booking {
        id: parse_uuid("id", row.try_get("id")?)?,
        flight_id: parse_uuid("flight_id", row.try_get("flight_id")?)?,
        passenger_id: parse_uuid("passenger_id", row.try_get("passenger_id")?)?,
        seats: row.try_get("seats")?,
        amount: parse_decimal("amount", row.try_get("amount")?)?,
        status: booking_status(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn cancellation_from_row(row: &AnyRow) -> Result<Cancellation, DbError> {
    Ok(Cancellation {
        id: parse_uuid("id", row.try_get("id")?)?,
        booking_id: parse_uuid("booking_id", row.try_get("booking_id")?)?,
        reason: row.try_get("reason")?,
        cancelled_at: parse_timestamp("cancelled_at", row.try_get("cancelled_at")?)?,
    })
}

fn parse_uuid(field: &str, value: String) -> Result<Uuid, DbError> {
    Uuid::parse_str(&value).map_err(|e| DbError::Decode(format!("{field}: {e}")))
}

fn parse_timestamp(field: &str, value: String) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Decode(format!("{field}: {e}")))
}

fn parse_decimal(field: &str, value: String) -> Result<Decimal, DbError> {
    Decimal::from_str(&value).map_err(|e| DbError::Decode(format!("{field}: {e}")))
}

fn booking_status(value: &str) -> Result<BookingStatus, DbError> {
    BookingStatus::from_str(value).map_err(|e| DbError::Decode(e.to_string()))
}
