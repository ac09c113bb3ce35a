//! Upstream materialization abstraction.
//!
//! Defines the interface to whatever pulls an app's deployable manifests
//! from its upstream source.

use crate::error::InstallResult;
use async_trait::async_trait;
use charter_types::{PendingApp, UpstreamRef};

/// What materialization produced, reduced to the flags install responses
/// report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManifestSet {
    /// A preflight spec is present in the rendered manifests.
    pub has_preflight: bool,
    /// A config spec is present in the rendered manifests.
    pub has_config: bool,
}

/// Abstract upstream materializer interface.
#[async_trait]
pub trait Materializer: Send + Sync {
    /// Pulls and renders the app's manifests from its upstream reference.
    ///
    /// Called for the online install branch only; airgap installs receive
    /// their assets out of band.
    async fn materialize_from_online(
        &self,
        pending: &PendingApp,
        upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet>;
}
