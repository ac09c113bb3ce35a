//! License payload structure and the verified document wrapper.
//!
//! The payload is a JSON object carrying the license identity, sequence
//! number, capability flags, and the grant set. Two grant keys are
//! reserved ([`ReservedGrant`]) and never surface as generic entitlements.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a license; drives feature gating upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Time-limited evaluation.
    Trial,
    /// Paid customer.
    Paid,
    /// Community edition.
    Community,
    /// Development and test.
    Dev,
}

impl LicenseType {
    /// Returns the stable string form used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Paid => "paid",
            Self::Community => "community",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of an entitlement grant.
///
/// Untagged: the wire form is a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntitlementValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl EntitlementValue {
    /// Returns the string form if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One grant-set entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Display name.
    #[serde(default)]
    pub title: String,
    /// Declared interpretation of `value` (issuer-supplied, not enforced).
    #[serde(default)]
    pub value_type: String,
    /// The granted value.
    pub value: EntitlementValue,
    /// Excluded from customer-facing listings when set.
    #[serde(default)]
    pub is_hidden: bool,
}

/// Grant keys with dedicated meaning. These are consumed by the system
/// itself and never listed as generic entitlements in the customer
/// projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedGrant {
    /// RFC3339 expiration moment; diverted to the expiration output.
    ExpiresAt,
    /// Consumed by the gitops subsystem; dropped from customer listings.
    GitopsEnabled,
}

impl ReservedGrant {
    /// Grant key carrying the expiration timestamp.
    pub const EXPIRES_AT: &'static str = "expires_at";
    /// Grant key toggling gitops workflows.
    pub const GITOPS_ENABLED: &'static str = "gitops_enabled";

    /// Returns the reserved meaning of a grant key, if it has one.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            Self::EXPIRES_AT => Some(Self::ExpiresAt),
            Self::GITOPS_ENABLED => Some(Self::GitopsEnabled),
            _ => None,
        }
    }

    /// Returns the grant key for this reserved meaning.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExpiresAt => Self::EXPIRES_AT,
            Self::GitopsEnabled => Self::GITOPS_ENABLED,
        }
    }
}

/// The decoded license payload (the signed JSON document body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePayload {
    /// Opaque stable license identity.
    pub license_id: String,
    /// Product line; source of the app's routing slug.
    pub app_slug: String,
    /// Monotonic version counter; higher always wins during sync.
    #[serde(default)]
    pub license_sequence: i64,
    /// Release channel the license is pinned to.
    #[serde(default)]
    pub channel_name: String,
    /// License classification.
    pub license_type: LicenseType,
    /// Licensee display name.
    #[serde(default)]
    pub customer_name: String,
    /// Whether installation without outbound network access is permitted.
    #[serde(default)]
    pub is_airgap_supported: bool,
    /// Licensing-authority base URL for sync.
    #[serde(default)]
    pub endpoint: String,
    /// The grant set, keyed by grant name. Key-sorted iteration keeps
    /// projections deterministic.
    #[serde(default)]
    pub entitlements: BTreeMap<String, Entitlement>,
}

/// A parsed license document that passed signature verification.
///
/// Holds the raw document string alongside the decoded payload so the
/// byte-exact wire form can be persisted and re-verified later. Only
/// constructed by [`crate::LicenseVerifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedLicense {
    /// The raw document string.
    raw: String,
    /// Decoded payload.
    payload: LicensePayload,
}

impl SignedLicense {
    pub(crate) fn new(raw: String, payload: LicensePayload) -> Self {
        Self { raw, payload }
    }

    /// Returns the raw document string (the persisted wire form).
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the decoded payload.
    #[must_use]
    pub fn payload(&self) -> &LicensePayload {
        &self.payload
    }

    /// Returns the license identity.
    #[must_use]
    pub fn license_id(&self) -> &str {
        &self.payload.license_id
    }

    /// Returns the licensed app slug.
    #[must_use]
    pub fn app_slug(&self) -> &str {
        &self.payload.app_slug
    }

    /// Returns the monotonic license sequence.
    #[must_use]
    pub fn sequence(&self) -> i64 {
        self.payload.license_sequence
    }

    /// Returns the license classification.
    #[must_use]
    pub fn license_type(&self) -> LicenseType {
        self.payload.license_type
    }

    /// Returns true if the license permits airgap installation.
    #[must_use]
    pub fn is_airgap_supported(&self) -> bool {
        self.payload.is_airgap_supported
    }

    /// Returns the licensing-authority base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.payload.endpoint
    }

    /// Returns the expiration moment from the `expires_at` grant.
    ///
    /// An absent grant or an empty string means no expiration is
    /// configured (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidExpirationFormat` if the grant is present but not
    /// an RFC3339 timestamp string. Never silently treats a malformed
    /// timestamp as unexpiring.
    pub fn expires_at(&self) -> LicenseResult<Option<DateTime<Utc>>> {
        match self.payload.entitlements.get(ReservedGrant::EXPIRES_AT) {
            Some(grant) => expiration_from_grant(grant),
            None => Ok(None),
        }
    }

    /// Returns true if the license is past its expiration moment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExpirationFormat` if the `expires_at` grant cannot
    /// be parsed.
    pub fn is_expired(&self) -> LicenseResult<bool> {
        Ok(match self.expires_at()? {
            Some(at) => at < Utc::now(),
            None => false,
        })
    }
}

/// Parses the expiration moment out of the `expires_at` grant.
///
/// Shared by [`SignedLicense::expires_at`] and the customer projection so
/// both fail identically on malformed timestamps.
pub(crate) fn expiration_from_grant(
    grant: &Entitlement,
) -> LicenseResult<Option<DateTime<Utc>>> {
    let value = match grant.value.as_str() {
        Some(s) => s,
        None => {
            return Err(LicenseError::InvalidExpirationFormat(
                "expires_at grant must be a string".to_string(),
            ));
        }
    };
    if value.is_empty() {
        return Ok(None);
    }
    let at = DateTime::parse_from_rfc3339(value).map_err(|e| {
        LicenseError::InvalidExpirationFormat(format!("{value:?}: {e}"))
    })?;
    Ok(Some(at.with_timezone(&Utc)))
}
