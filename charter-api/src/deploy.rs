//! Deployment-facing implementations of the install collaborator traits.
//!
//! The cluster-specific machinery lives outside this workspace; these
//! cover the single-node deployment the server binary targets, where
//! manifests are pre-rendered on disk and registry configuration is
//! known at startup.

use async_trait::async_trait;
use charter_install::{InstallError, InstallResult, ManifestSet, Materializer, RegistryProbe};
use charter_types::{PendingApp, UpstreamRef};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Materializer reading pre-rendered manifests from a local directory.
///
/// Expects `<root>/<slug>/` to hold at least one `.yaml` manifest;
/// `preflight.yaml` and `config.yaml` toggle the corresponding flags in
/// the returned [`ManifestSet`].
pub struct ManifestDirMaterializer {
    root: PathBuf,
}

impl ManifestDirMaterializer {
    /// Creates a materializer rooted at the given manifests directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Materializer for ManifestDirMaterializer {
    async fn materialize_from_online(
        &self,
        pending: &PendingApp,
        upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet> {
        let dir = self.root.join(&pending.slug);
        debug!("Materializing {} from {}", upstream.as_str(), dir.display());

        let slug = pending.slug.clone();
        let (manifests, count) = tokio::task::spawn_blocking(move || scan_manifest_dir(&dir))
            .await
            .map_err(|e| InstallError::Internal(format!("manifest scan panicked: {e}")))??;

        info!("Materialized {} manifests for {}", count, slug);
        Ok(manifests)
    }
}

/// Scans one app's manifest directory, counting manifests and flagging
/// the well-known ones.
fn scan_manifest_dir(dir: &Path) -> InstallResult<(ManifestSet, usize)> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        InstallError::Materialization(format!("no manifests at {}: {e}", dir.display()))
    })?;

    let mut manifests = ManifestSet::default();
    let mut count = 0usize;
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::Materialization(e.to_string()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".yaml") && !name.ends_with(".yml") {
            continue;
        }
        count += 1;
        match name {
            "preflight.yaml" => manifests.has_preflight = true,
            "config.yaml" => manifests.has_config = true,
            _ => {}
        }
    }

    if count == 0 {
        return Err(InstallError::Materialization(format!(
            "no manifests at {}",
            dir.display()
        )));
    }
    Ok((manifests, count))
}

/// Registry probe answering from startup configuration.
///
/// The single-node deployment knows at boot whether a local image
/// registry exists; cluster-backed lookups implement the same trait
/// elsewhere.
pub struct StaticRegistryProbe {
    configured: bool,
}

impl StaticRegistryProbe {
    /// Creates a probe with a fixed answer.
    #[must_use]
    pub fn new(configured: bool) -> Self {
        Self { configured }
    }
}

#[async_trait]
impl RegistryProbe for StaticRegistryProbe {
    async fn has_local_registry(&self) -> InstallResult<bool> {
        Ok(self.configured)
    }
}
