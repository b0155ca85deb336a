use sqlx::error::ErrorKind;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database configuration error: {0}")]
    Configuration(String),

    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("{entity} {id} was not found in the database")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to decode a stored value: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // Uniqueness, referential-integrity and check failures reported by the
        // storage layer are constraint violations; everything else the driver
        // raises is treated as a connection-level failure.
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return DbError::ConstraintViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        DbError::Connection(err)
    }
}
