//! Install records and the install state machine.
//!
//! An `App` row is created exactly once per accepted license and is
//! addressed by its slug from then on. The raw license document stays in
//! the store (not here); `PendingApp` carries it transiently while a
//! materialization is in flight.

use crate::{AppId, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// States an install moves through once a license is accepted.
///
/// `NoLicense` is the projection reported when no app record exists yet;
/// it is never persisted on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// No license has been accepted; no app record exists.
    NoLicense,
    /// License verified and the app record persisted; install not finished.
    LicenseAccepted,
    /// The online branch materialized the app successfully.
    OnlineInstallCompleted,
    /// Airgap-capable license accepted; waiting for the airgap bundle.
    AirgapPendingAssets,
}

impl InstallState {
    /// Returns the stable string form used for persistence.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoLicense => "no_license",
            Self::LicenseAccepted => "license_accepted",
            Self::OnlineInstallCompleted => "online_install_completed",
            Self::AirgapPendingAssets => "airgap_pending_assets",
        }
    }

    /// Returns true if an online install can still be (re-)driven from this
    /// state, i.e. a previous attempt did not finish.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::LicenseAccepted | Self::AirgapPendingAssets)
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_license" => Ok(Self::NoLicense),
            "license_accepted" => Ok(Self::LicenseAccepted),
            "online_install_completed" => Ok(Self::OnlineInstallCompleted),
            "airgap_pending_assets" => Ok(Self::AirgapPendingAssets),
            other => Err(Error::InvalidInstallState(other.to_string())),
        }
    }
}

/// Reference to the upstream source an app is materialized from.
///
/// The canonical form is `charter://<app-slug>`; the slug half is the
/// license's `appSlug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpstreamRef(String);

impl UpstreamRef {
    /// URI scheme for licensed upstream sources.
    pub const SCHEME: &'static str = "charter";

    /// Derives the upstream reference for a license's app slug.
    #[must_use]
    pub fn from_app_slug(app_slug: &str) -> Self {
        Self(format!("{}://{app_slug}", Self::SCHEME))
    }

    /// Wraps an already-formed reference string (e.g. loaded from the store).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the reference as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the app slug half if this is a `charter://` reference.
    #[must_use]
    pub fn app_slug(&self) -> Option<&str> {
        self.0.strip_prefix("charter://")
    }
}

impl fmt::Display for UpstreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted app record created when a license is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    /// Generated record id.
    pub id: AppId,
    /// Display name.
    pub name: String,
    /// Stable routing slug, unique per deployment.
    pub slug: String,
    /// Where the app's manifests are materialized from.
    pub upstream_ref: UpstreamRef,
    /// Whether the accepted license permits airgap installation.
    pub is_airgap_supported: bool,
    /// Current install state.
    pub install_state: InstallState,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// The transient shape handed to the upstream materializer while an
/// install completes. Carries the raw license document so the materializer
/// can authenticate against the upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingApp {
    pub id: AppId,
    pub slug: String,
    pub name: String,
    pub license_data: String,
}

impl PendingApp {
    /// Builds the materializer input from a persisted app and its raw
    /// license document.
    #[must_use]
    pub fn from_app(app: &App, license_data: impl Into<String>) -> Self {
        Self {
            id: app.id,
            slug: app.slug.clone(),
            name: app.name.clone(),
            license_data: license_data.into(),
        }
    }
}

/// Read-only projection of the current install state for polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallStatus {
    /// Current state; `NoLicense` when no app record exists.
    pub state: InstallState,
    /// Slug of the app the state belongs to, if one exists.
    pub slug: Option<String>,
}

impl InstallStatus {
    /// The projection reported before any license has been accepted.
    #[must_use]
    pub fn none() -> Self {
        Self {
            state: InstallState::NoLicense,
            slug: None,
        }
    }
}

/// Derives the display name for an app from its license slug: every hyphen
/// becomes a space (`"my-app"` → `"my app"`).
#[must_use]
pub fn display_name_for_slug(app_slug: &str) -> String {
    app_slug.replace('-', " ")
}

/// Normalizes a display name into a routing slug: lowercase, runs of
/// non-alphanumeric characters collapse to single hyphens, no leading or
/// trailing hyphen. Inverse of [`display_name_for_slug`] for well-formed
/// slugs.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

