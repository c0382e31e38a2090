//! Store error types.

use genrec_common::GenrecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Read from `{table}` failed: {message}")]
    ReadFailed { table: &'static str, message: String },

    #[error("Invalid row in `{table}`: {message}")]
    InvalidRow { table: &'static str, message: String },

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] GenrecError),

    #[error("PostgreSQL error: {0}")]
    Postgres(String),
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        DbError::Postgres(err.to_string())
    }
}
