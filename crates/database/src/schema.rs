//! Embedded schema definition.
//!
//! The DDL is written in the dialect subset shared by PostgreSQL and SQLite so
//! the same statements run under either driver. Every statement is idempotent
//! (`CREATE TABLE IF NOT EXISTS`), which makes `run_migrations` safe to call
//! on every startup.

/// Statements are executed one at a time, in order, since foreign keys
/// reference earlier tables.
pub const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS flights (
        id              TEXT PRIMARY KEY,
        code            TEXT NOT NULL UNIQUE,
        origin          TEXT NOT NULL,
        destination     TEXT NOT NULL,
        departure       TEXT NOT NULL,
        capacity        BIGINT NOT NULL CHECK (capacity >= 0),
        seats_available BIGINT NOT NULL CHECK (seats_available >= 0),
        fare            TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS passengers (
        id              TEXT PRIMARY KEY,
        name            TEXT NOT NULL,
        nationality     TEXT,
        gender          TEXT,
        passport_number TEXT,
        phone           TEXT,
        address         TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id           TEXT PRIMARY KEY,
        flight_id    TEXT NOT NULL REFERENCES flights(id),
        passenger_id TEXT NOT NULL REFERENCES passengers(id),
        seats        BIGINT NOT NULL CHECK (seats >= 1),
        amount       TEXT NOT NULL,
        status       TEXT NOT NULL,
        created_at   TEXT NOT NULL
    )
    "#,
    // booking_id is UNIQUE: a booking has at most one cancellation record.
    r#"
    CREATE TABLE IF NOT EXISTS cancellations (
        id           TEXT PRIMARY KEY,
        booking_id   TEXT NOT NULL UNIQUE REFERENCES bookings(id),
        reason       TEXT NOT NULL,
        cancelled_at TEXT NOT NULL
    )
    "#,
];
