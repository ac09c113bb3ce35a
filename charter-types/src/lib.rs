//! Core type definitions for Charter.
//!
//! This crate defines the types shared across the install console:
//! - App identifiers (UUID v4)
//! - Install records (`App`, `PendingApp`) and the install state machine
//! - Upstream references (`charter://<slug>`) and slug/name derivation
//!
//! License-document types live in `charter-license`; nothing here depends
//! on the signature stack.

mod app;
mod ids;

pub use app::{
    display_name_for_slug, slugify, App, InstallState, InstallStatus, PendingApp, UpstreamRef,
};
pub use ids::AppId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid install state: {0}")]
    InvalidInstallState(String),
}
