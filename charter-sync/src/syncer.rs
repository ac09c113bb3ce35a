//! Pull-based reconciliation of installed licenses with the licensing
//! authority.
//!
//! The authority's copy of a license only replaces the local one when it
//! carries a strictly higher sequence; an equal or older copy leaves the
//! local document untouched. Fetched documents are verified from scratch
//! against the trust anchor and never merged field-by-field with local
//! state.

use crate::error::{SyncError, SyncResult};
use charter_license::{LicenseVerifier, SignedLicense};
use charter_types::App;
use std::time::Duration;
use tracing::{debug, info};

/// Tuning for outbound licensing-authority requests.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// When set, replaces the endpoint embedded in the license. Used by
    /// deployments that front the licensing authority with a proxy.
    pub endpoint_override: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            endpoint_override: None,
        }
    }
}

/// Reconciles installed licenses with the licensing authority.
pub struct LicenseSyncer {
    verifier: LicenseVerifier,
    client: reqwest::Client,
    config: SyncConfig,
}

impl LicenseSyncer {
    /// Creates a syncer checking documents against `verifier`'s anchor.
    #[must_use]
    pub fn new(verifier: LicenseVerifier, config: SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            verifier,
            client,
            config,
        }
    }

    /// Fetches the authority's copy of `local` and returns whichever
    /// document carries the higher sequence.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if no endpoint is configured or the authority
    /// cannot be reached, and `License` if the fetched document fails
    /// verification.
    pub async fn get_latest(&self, local: &SignedLicense) -> SyncResult<SignedLicense> {
        let endpoint = self
            .config
            .endpoint_override
            .as_deref()
            .unwrap_or_else(|| local.endpoint());
        if endpoint.is_empty() {
            return Err(SyncError::Unavailable(
                "no licensing endpoint configured".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/license/{}",
            endpoint.trim_end_matches('/'),
            local.app_slug()
        );
        debug!("Fetching latest license for {}", local.app_slug());

        let response = self
            .client
            .get(&url)
            .bearer_auth(local.license_id())
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SyncError::Unavailable(format!(
                "licensing authority returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Unavailable(format!("failed to read response body: {e}")))?;

        // The body is a raw signed document; it earns trust the same way
        // an operator upload does.
        let fetched = self.verifier.verify(&body)?;

        if fetched.sequence() > local.sequence() {
            info!(
                "License for {} advanced: sequence {} -> {}",
                local.app_slug(),
                local.sequence(),
                fetched.sequence()
            );
            Ok(fetched)
        } else {
            debug!(
                "Local license for {} is current at sequence {}",
                local.app_slug(),
                local.sequence()
            );
            Ok(local.clone())
        }
    }

    /// Reconciles `raw_license` for `app`, returning the winning document.
    ///
    /// With `allow_remote == false` the verified local document is returned
    /// unchanged; skipping the fetch is the offline fallback, not an error.
    ///
    /// # Errors
    ///
    /// Returns `License` if the local document fails verification,
    /// `SlugMismatch` if it belongs to a different app, and any
    /// [`get_latest`](Self::get_latest) error when remote is allowed.
    pub async fn sync(
        &self,
        app: &App,
        raw_license: &str,
        allow_remote: bool,
    ) -> SyncResult<SignedLicense> {
        let local = self.verifier.verify(raw_license)?;

        if local.app_slug() != app.slug {
            return Err(SyncError::SlugMismatch {
                expected: app.slug.clone(),
                actual: local.app_slug().to_string(),
            });
        }

        if !allow_remote {
            debug!("Outbound sync disabled, keeping local license for {}", app.slug);
            return Ok(local);
        }

        self.get_latest(&local).await
    }
}
