//! Error types for the license sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while reconciling with the licensing authority.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A document failed verification, local or fetched.
    #[error("license error: {0}")]
    License(#[from] charter_license::LicenseError),

    /// The licensing authority could not be reached or answered abnormally.
    #[error("licensing authority unavailable: {0}")]
    Unavailable(String),

    /// The supplied document belongs to a different app.
    #[error("license is for app {actual}, not {expected}")]
    SlugMismatch { expected: String, actual: String },
}
