//! Local image registry capability query.

use crate::error::InstallResult;
use async_trait::async_trait;

/// Abstract probe for a locally configured image registry.
///
/// Airgap installs push bundle images into a local registry; the probe
/// tells the install flow whether registry credentials still need to be
/// collected before the bundle can be applied.
#[async_trait]
pub trait RegistryProbe: Send + Sync {
    /// Returns whether a local registry is already configured.
    async fn has_local_registry(&self) -> InstallResult<bool>;
}
