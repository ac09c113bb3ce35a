//! Error types for the app store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in app store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// App or license not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An app record already exists for the slug.
    #[error("app already exists: {0}")]
    Conflict(String),

    /// The single-tenant precondition does not hold.
    #[error("expected exactly one installed app, found {0}")]
    MultipleApps(usize),

    /// A persisted value could not be decoded.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
