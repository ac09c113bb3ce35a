//! API error type and its HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use charter_install::InstallError;
use charter_license::LicenseError;
use charter_store::StoreError;
use charter_sync::SyncError;
use serde_json::json;
use thiserror::Error;

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the HTTP layer.
///
/// Library errors pass through transparently; their messages are already
/// written for display to an operator.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session could be established for the request.
    #[error("not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    License(#[from] LicenseError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected failure outside the library error taxonomy.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::License(e) => license_status(e),
            Self::Sync(e) => sync_status(e),
            Self::Install(e) => install_status(e),
            Self::Store(e) => store_status(e),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn license_status(e: &LicenseError) -> StatusCode {
    match e {
        LicenseError::Malformed(_)
        | LicenseError::InvalidSignature
        | LicenseError::InvalidExpirationFormat(_) => StatusCode::BAD_REQUEST,
        LicenseError::InvalidTrustAnchor(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn sync_status(e: &SyncError) -> StatusCode {
    match e {
        SyncError::License(inner) => license_status(inner),
        SyncError::SlugMismatch { .. } => StatusCode::BAD_REQUEST,
        SyncError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::MultipleApps(_) => StatusCode::BAD_REQUEST,
        StoreError::Database(_) | StoreError::InvalidRecord(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn install_status(e: &InstallError) -> StatusCode {
    match e {
        InstallError::License(inner) => license_status(inner),
        InstallError::Sync(inner) => sync_status(inner),
        InstallError::Store(inner) => store_status(inner),
        InstallError::Expired => StatusCode::BAD_REQUEST,
        InstallError::Materialization(_)
        | InstallError::RegistryProbe(_)
        | InstallError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
