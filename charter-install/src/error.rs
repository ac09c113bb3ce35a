//! Error types for install transitions.

use thiserror::Error;

/// Result type for install operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur while driving an install transition.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The license failed verification or expiration parsing.
    #[error("license error: {0}")]
    License(#[from] charter_license::LicenseError),

    /// Reconciliation with the licensing authority failed.
    #[error("license sync failed: {0}")]
    Sync(#[from] charter_sync::SyncError),

    /// Persistence failed.
    #[error("store error: {0}")]
    Store(#[from] charter_store::StoreError),

    /// The license is past its expiration moment.
    #[error("license is expired")]
    Expired,

    /// Pulling the app's manifests from its upstream source failed.
    #[error("materialization failed: {0}")]
    Materialization(String),

    /// The local registry capability query failed.
    #[error("registry probe failed: {0}")]
    RegistryProbe(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}
