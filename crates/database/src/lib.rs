//! # Flightdesk Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! flight database. It is the system's sole source of truth: there is no
//! in-memory cache in front of it.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** This crate encapsulates all database-specific logic. It
//!   provides a clean, typed API to the rest of the application, hiding the
//!   underlying SQL and driver details.
//! - **Driver-agnostic:** Uses the `sqlx` Any driver so the same repository
//!   runs against PostgreSQL in deployments and in-memory SQLite in tests.
//! - **Transactional:** Booking and cancellation are multi-statement
//!   operations and always execute as a single all-or-nothing transaction.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema, ensuring tables exist.
//! - `ping`: Startup diagnostic; acquire, query, release, report a boolean.
//! - `DbRepository`: The main struct that holds the connection pool and
//!   provides all record access operations per entity.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod schema;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, ping, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
