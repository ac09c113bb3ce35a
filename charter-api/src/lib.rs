//! HTTP license API for the Charter install console.
//!
//! Exposes the license lifecycle over axum: upload/accept, sync against
//! the licensing authority, the customer and platform entitlement
//! projections, install resume, and install-status polling. Every
//! `/api/v1` route requires a validated bearer session; the platform
//! compatibility route is called by the installed application itself
//! and carries none.

mod deploy;
mod error;
mod handlers;
mod session;

pub use deploy::{ManifestDirMaterializer, StaticRegistryProbe};
pub use error::{ApiError, ApiResult};
pub use handlers::{
    ApiState, InstallResponse, LicenseResponse, PlatformLicenseResponse, ResumeInstallRequest,
    SyncLicenseRequest, UploadLicenseRequest,
};
pub use session::{Session, SessionValidator, StaticTokenValidator};

use axum::routing::{get, post, put};
use axum::Router;

/// Builds the HTTP API router over the given state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/license", post(handlers::upload_license))
        .route(
            "/api/v1/app/{app_slug}/license",
            put(handlers::sync_license).get(handlers::get_license),
        )
        .route("/api/v1/license/resume", post(handlers::resume_install))
        .route("/api/v1/install/status", get(handlers::install_status))
        .route("/license/v1/license", get(handlers::platform_license))
        .with_state(state)
}
