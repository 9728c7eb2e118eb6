pub mod model;
pub mod service;
pub mod store;

use thiserror::Error;

use crate::database::DatabaseError;

pub use model::{Club, ClubChanges, ClubInput};
pub use service::ClubService;
pub use store::{ClubStore, PgClubStore};

/// Outcome of a failed unit of work on the clubs table
#[derive(Debug, Error)]
pub enum ClubError {
    /// Rejected before any storage access
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Zero rows matched; nothing was written
    #[error("Club {0} not found")]
    NotFound(i64),

    /// Statement or connection failure, carrying the engine's diagnostic
    #[error("{0}")]
    Storage(String),
}

impl From<sqlx::Error> for ClubError {
    fn from(err: sqlx::Error) -> Self {
        ClubError::Storage(err.to_string())
    }
}

impl From<DatabaseError> for ClubError {
    fn from(err: DatabaseError) -> Self {
        ClubError::Storage(err.to_string())
    }
}
