//! Request handlers and JSON shapes for the license API.

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionValidator};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use charter_install::{AcceptOutcome, InstallDriver, InstallError, ResumeOutcome};
use charter_license::{
    customer_entitlements, platform_fields, EntitlementEntry, LicenseResult, LicenseType,
    LicenseVerifier, PlatformField, SignedLicense,
};
use charter_store::{Store, StoreResult};
use charter_sync::LicenseSyncer;
use charter_types::InstallStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state behind every route.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<Store>,
    driver: Arc<InstallDriver>,
    syncer: Arc<LicenseSyncer>,
    verifier: LicenseVerifier,
    sessions: Arc<dyn SessionValidator>,
    allow_outbound: bool,
}

impl ApiState {
    /// Assembles the API state from its collaborators.
    ///
    /// `allow_outbound` mirrors the switch handed to the install driver
    /// and gates the sync endpoint's remote fetch.
    pub fn new(
        store: Arc<Store>,
        driver: Arc<InstallDriver>,
        syncer: Arc<LicenseSyncer>,
        verifier: LicenseVerifier,
        sessions: Arc<dyn SessionValidator>,
        allow_outbound: bool,
    ) -> Self {
        Self {
            store,
            driver,
            syncer,
            verifier,
            sessions,
            allow_outbound,
        }
    }

    /// Validates the bearer token on a request.
    fn authenticate(&self, headers: &HeaderMap) -> ApiResult<Session> {
        let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;
        self.sessions.validate(token)
    }

    /// Runs a store operation off the async executor.
    async fn with_store<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| ApiError::Internal(format!("store task panicked: {e}")))?
            .map_err(ApiError::from)
    }
}

/// Extracts the bearer token from the Authorization header.
///
/// The `Bearer` scheme prefix is optional; clients may send the raw
/// token.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// ── Request/response shapes ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLicenseRequest {
    /// The raw signed license document.
    pub license_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLicenseRequest {
    /// Replacement document; empty means re-sync the stored one.
    #[serde(default)]
    pub license_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInstallRequest {
    /// Routing slug of the app whose online install should be re-driven.
    pub slug: String,
}

/// Envelope reported by the install transitions (upload and resume).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub has_preflight: bool,
    pub slug: String,
    pub is_airgap: bool,
    pub needs_registry: bool,
    pub is_configurable: bool,
}

impl InstallResponse {
    fn accepted(outcome: AcceptOutcome) -> Self {
        Self {
            success: true,
            error: None,
            has_preflight: outcome.has_preflight,
            slug: outcome.slug,
            is_airgap: outcome.is_airgap,
            needs_registry: outcome.needs_registry,
            is_configurable: outcome.is_configurable,
        }
    }

    fn resumed(outcome: ResumeOutcome) -> Self {
        Self {
            success: true,
            error: None,
            has_preflight: outcome.has_preflight,
            slug: outcome.slug,
            is_airgap: false,
            needs_registry: false,
            is_configurable: outcome.is_configurable,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            has_preflight: false,
            slug: String::new(),
            is_airgap: false,
            needs_registry: false,
            is_configurable: false,
        }
    }
}

/// Customer-facing view of an app's license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseResponse {
    /// The license ID.
    pub id: String,
    /// Expiration moment; `null` when none is configured.
    pub expires_at: Option<DateTime<Utc>>,
    pub channel_name: String,
    pub license_sequence: i64,
    pub license_type: LicenseType,
    pub entitlements: Vec<EntitlementEntry>,
}

impl LicenseResponse {
    fn from_license(license: &SignedLicense) -> LicenseResult<Self> {
        let (entitlements, expires_at) = customer_entitlements(license)?;
        Ok(Self {
            id: license.license_id().to_string(),
            expires_at,
            channel_name: license.payload().channel_name.clone(),
            license_sequence: license.sequence(),
            license_type: license.license_type(),
            entitlements,
        })
    }
}

/// Platform-compatibility view of the single installed app's license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformLicenseResponse {
    pub license_id: String,
    pub installation_id: String,
    pub assignee: String,
    pub release_channel: String,
    pub license_type: LicenseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    pub fields: Vec<PlatformField>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `POST /api/v1/license`: accept a new license and start the install.
pub(crate) async fn upload_license(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<UploadLicenseRequest>,
) -> Response {
    if let Err(e) = state.authenticate(&headers) {
        return e.into_response();
    }

    match state.driver.accept_new_license(&body.license_data).await {
        Ok(outcome) => Json(InstallResponse::accepted(outcome)).into_response(),
        Err(e) => install_failure(e),
    }
}

/// `POST /api/v1/license/resume`: re-drive an unfinished online install.
pub(crate) async fn resume_install(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ResumeInstallRequest>,
) -> Response {
    if let Err(e) = state.authenticate(&headers) {
        return e.into_response();
    }

    match state.driver.resume_online_install(&body.slug).await {
        Ok(outcome) => Json(InstallResponse::resumed(outcome)).into_response(),
        Err(e) => install_failure(e),
    }
}

/// Wraps an install transition error in the failed envelope, preserving
/// the mapped status code.
fn install_failure(e: InstallError) -> Response {
    let e = ApiError::from(e);
    warn!("Install transition failed: {}", e);
    (e.status(), Json(InstallResponse::failed(e.to_string()))).into_response()
}

/// `PUT /api/v1/app/{app_slug}/license`: reconcile and persist a license.
///
/// The body may carry a replacement document (an operator upload); when
/// it is empty the stored document is re-synced against the authority.
/// Whichever document wins reconciliation is persisted if it differs
/// from the stored blob.
pub(crate) async fn sync_license(
    State(state): State<ApiState>,
    Path(app_slug): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SyncLicenseRequest>,
) -> ApiResult<Json<LicenseResponse>> {
    state.authenticate(&headers)?;

    let app = state
        .with_store(move |s| s.get_app_by_slug(&app_slug))
        .await?;
    let stored = {
        let id = app.id;
        state.with_store(move |s| s.get_license_for_app(id)).await?
    };
    let raw = if body.license_data.is_empty() {
        stored.clone()
    } else {
        body.license_data
    };

    let winner = state.syncer.sync(&app, &raw, state.allow_outbound).await?;

    if winner.raw() != stored.as_str() {
        let id = app.id;
        let blob = winner.raw().to_string();
        state
            .with_store(move |s| s.update_app_license(id, &blob))
            .await?;
        info!(
            "Persisted license update for {} (sequence {})",
            app.slug,
            winner.sequence()
        );
    }

    Ok(Json(LicenseResponse::from_license(&winner)?))
}

/// `GET /api/v1/app/{app_slug}/license`: customer entitlement view.
pub(crate) async fn get_license(
    State(state): State<ApiState>,
    Path(app_slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LicenseResponse>> {
    state.authenticate(&headers)?;

    let app = state
        .with_store(move |s| s.get_app_by_slug(&app_slug))
        .await?;
    let raw = {
        let id = app.id;
        state.with_store(move |s| s.get_license_for_app(id)).await?
    };
    let license = state.verifier.verify(&raw)?;

    Ok(Json(LicenseResponse::from_license(&license)?))
}

/// `GET /api/v1/install/status`: install-state projection for polling.
pub(crate) async fn install_status(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<Json<InstallStatus>> {
    state.authenticate(&headers)?;

    let status = state.driver.pending_install_status().await?;
    Ok(Json(status))
}

/// `GET /license/v1/license`: platform compatibility projection.
///
/// Called by the installed application itself, before any console
/// session exists, so this route carries no session requirement. It
/// assumes a single-tenant deployment: exactly one installed app.
pub(crate) async fn platform_license(
    State(state): State<ApiState>,
) -> ApiResult<Json<PlatformLicenseResponse>> {
    let app = state.with_store(|s| s.single_installed_app()).await?;
    let raw = {
        let id = app.id;
        state.with_store(move |s| s.get_license_for_app(id)).await?
    };
    let license = state.verifier.verify(&raw)?;
    let (fields, expiration_time) = platform_fields(&license);

    Ok(Json(PlatformLicenseResponse {
        license_id: license.license_id().to_string(),
        installation_id: app.id.to_string(),
        assignee: license.payload().customer_name.clone(),
        release_channel: license.payload().channel_name.clone(),
        license_type: license.license_type(),
        expiration_time,
        fields,
    }))
}
