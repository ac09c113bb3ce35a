//! The install lifecycle state machine.
//!
//! Drives apps through
//! `NoLicense -> LicenseAccepted -> {OnlineInstallCompleted | AirgapPendingAssets}`,
//! with a resumable path back into the online branch when an earlier
//! attempt did not finish.
//!
//! Every transition runs to completion within a single invocation; there
//! is no background worker advancing install state. The driver holds no
//! in-process lock: concurrent duplicate submissions are serialized by
//! the store's slug uniqueness, which fails the second caller with
//! `Conflict`.

use crate::error::{InstallError, InstallResult};
use crate::registry::RegistryProbe;
use crate::upstream::{ManifestSet, Materializer};
use charter_license::LicenseVerifier;
use charter_store::{Store, StoreResult};
use charter_sync::LicenseSyncer;
use charter_types::{
    display_name_for_slug, App, InstallState, InstallStatus, PendingApp, UpstreamRef,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of accepting a new license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptOutcome {
    /// Routing slug of the created app.
    pub slug: String,
    /// The install took the airgap branch.
    pub is_airgap: bool,
    /// A preflight spec is present in the materialized manifests.
    pub has_preflight: bool,
    /// A config spec is present in the materialized manifests.
    pub is_configurable: bool,
    /// Airgap only: no local registry is configured yet, so credentials
    /// must be collected before the bundle is applied.
    pub needs_registry: bool,
}

/// Outcome of resuming an unfinished online install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    /// Routing slug of the resumed app.
    pub slug: String,
    /// A preflight spec is present in the materialized manifests.
    pub has_preflight: bool,
    /// A config spec is present in the materialized manifests.
    pub is_configurable: bool,
}

/// Drives install transitions against the store and the deployment
/// collaborators.
pub struct InstallDriver {
    store: Arc<Store>,
    materializer: Arc<dyn Materializer>,
    registry: Arc<dyn RegistryProbe>,
    verifier: LicenseVerifier,
    syncer: Arc<LicenseSyncer>,
    allow_outbound: bool,
}

impl InstallDriver {
    /// Creates a driver.
    ///
    /// `allow_outbound` is the operator-level switch for outbound network
    /// calls; with it off, license acceptance runs entirely on the
    /// supplied document.
    pub fn new(
        store: Arc<Store>,
        materializer: Arc<dyn Materializer>,
        registry: Arc<dyn RegistryProbe>,
        verifier: LicenseVerifier,
        syncer: Arc<LicenseSyncer>,
        allow_outbound: bool,
    ) -> Self {
        Self {
            store,
            materializer,
            registry,
            verifier,
            syncer,
            allow_outbound,
        }
    }

    /// Accepts a raw license document and drives the install as far as it
    /// can go.
    ///
    /// Verification, reconciliation, and expiration failures are terminal
    /// and leave no app behind. Once the app record exists, branch
    /// failures (materialization, registry probe) are reported but the
    /// record persists so the caller can retry via
    /// [`resume_online_install`](Self::resume_online_install).
    pub async fn accept_new_license(&self, raw: &str) -> InstallResult<AcceptOutcome> {
        let license = self.verifier.verify(raw)?;

        // Reconciliation runs before the expiration check: the authority
        // may hold a renewal with a later expiry. Any sync failure is
        // fatal to this transition.
        let license = if self.allow_outbound {
            self.syncer.get_latest(&license).await?
        } else {
            debug!("Outbound disabled, accepting local license as-is");
            license
        };

        if license.is_expired()? {
            return Err(InstallError::Expired);
        }

        let name = display_name_for_slug(license.app_slug());
        let upstream_ref = UpstreamRef::from_app_slug(license.app_slug());
        let is_airgap = license.is_airgap_supported();

        let app = {
            let upstream_ref = upstream_ref.clone();
            let raw_winner = license.raw().to_string();
            self.with_store(move |s| {
                s.create_app(&name, &upstream_ref, &raw_winner, is_airgap)
            })
            .await?
        };
        info!("Accepted license for {} (airgap: {})", app.slug, is_airgap);

        if app.is_airgap_supported {
            self.begin_airgap_install(&app).await
        } else {
            let manifests = self
                .run_online_install(&app, &upstream_ref, license.raw())
                .await?;
            Ok(AcceptOutcome {
                slug: app.slug,
                is_airgap: false,
                has_preflight: manifests.has_preflight,
                is_configurable: manifests.has_config,
                needs_registry: false,
            })
        }
    }

    /// Resumes the online branch for an app whose earlier attempt did not
    /// finish.
    ///
    /// Loads the persisted license blob (already the canonical document
    /// form), re-verifies it, and re-drives materialization with the
    /// upstream reference derived from the license. Never syncs: resume
    /// must work with outbound access gone.
    pub async fn resume_online_install(&self, slug: &str) -> InstallResult<ResumeOutcome> {
        let app = {
            let slug = slug.to_string();
            self.with_store(move |s| s.get_app_by_slug(&slug)).await?
        };
        let raw = {
            let id = app.id;
            self.with_store(move |s| s.get_license_for_app(id)).await?
        };

        let license = self.verifier.verify(&raw)?;

        if !app.install_state.is_resumable() {
            warn!(
                "Resuming online install for {} from state {}",
                app.slug, app.install_state
            );
        }

        let upstream_ref = UpstreamRef::from_app_slug(license.app_slug());
        let manifests = self.run_online_install(&app, &upstream_ref, &raw).await?;

        Ok(ResumeOutcome {
            slug: app.slug,
            has_preflight: manifests.has_preflight,
            is_configurable: manifests.has_config,
        })
    }

    /// Projects the current install state for polling clients.
    pub async fn pending_install_status(&self) -> InstallResult<InstallStatus> {
        self.with_store(|s| s.pending_install_status()).await
    }

    /// Materializes from upstream and completes the online install.
    async fn run_online_install(
        &self,
        app: &App,
        upstream_ref: &UpstreamRef,
        raw_license: &str,
    ) -> InstallResult<ManifestSet> {
        let pending = PendingApp::from_app(app, raw_license);
        let manifests = self
            .materializer
            .materialize_from_online(&pending, upstream_ref)
            .await?;

        let id = app.id;
        self.with_store(move |s| s.set_install_state(id, InstallState::OnlineInstallCompleted))
            .await?;
        info!("Online install completed for {}", app.slug);
        Ok(manifests)
    }

    /// Parks the app in `AirgapPendingAssets` and probes for a registry.
    ///
    /// The probe runs after the state move; a probe failure leaves the
    /// app parked, retryable by the caller.
    async fn begin_airgap_install(&self, app: &App) -> InstallResult<AcceptOutcome> {
        let id = app.id;
        self.with_store(move |s| s.set_install_state(id, InstallState::AirgapPendingAssets))
            .await?;

        let has_registry = self.registry.has_local_registry().await?;
        if !has_registry {
            debug!("No local registry configured for {}", app.slug);
        }

        Ok(AcceptOutcome {
            slug: app.slug.clone(),
            is_airgap: true,
            has_preflight: false,
            is_configurable: false,
            needs_registry: !has_registry,
        })
    }

    /// Runs a store operation off the async executor.
    async fn with_store<T, F>(&self, f: F) -> InstallResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| InstallError::Internal(format!("store task panicked: {e}")))?
            .map_err(InstallError::from)
    }
}
