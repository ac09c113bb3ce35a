//! Error types for license verification and extraction.

use thiserror::Error;

/// License-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Document cannot be parsed into a license.
    #[error("malformed license document: {0}")]
    Malformed(String),

    /// Ed25519 signature verification failed.
    #[error("license signature invalid")]
    InvalidSignature,

    /// The `expires_at` grant is present but not an RFC3339 timestamp.
    #[error("invalid license expiration: {0}")]
    InvalidExpirationFormat(String),

    /// Trust anchor key material is unusable.
    #[error("invalid trust anchor: {0}")]
    InvalidTrustAnchor(String),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
