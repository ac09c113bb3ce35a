//! Entitlement projections over a verified license's grant set.
//!
//! Two projections exist over the same grants: the customer listing,
//! which excludes reserved and hidden grants, and the platform listing,
//! which keeps hidden grants behind an explicit marker. Both walk the
//! grant set in key order and share the [`ReservedGrant`] dispatch so
//! reserved keys are handled identically.

use crate::document::{expiration_from_grant, EntitlementValue, ReservedGrant, SignedLicense};
use crate::error::LicenseResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One customer-visible entitlement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementEntry {
    /// Display name from the grant.
    pub title: String,
    /// The granted value.
    pub value: EntitlementValue,
    /// The grant key.
    pub label: String,
}

/// One platform-projection field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformField {
    /// The grant key.
    pub field: String,
    /// Display name from the grant.
    pub title: String,
    /// Declared value interpretation.
    #[serde(rename = "type")]
    pub value_type: String,
    /// The granted value.
    pub value: EntitlementValue,
    /// Set for grants the customer projection would hide.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_from_customer: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Projects the customer-facing entitlement list and the expiration moment.
///
/// Reserved grants never appear as rows: `expires_at` is diverted to the
/// returned expiration and `gitops_enabled` is dropped. Hidden grants are
/// excluded.
///
/// # Errors
///
/// Returns `InvalidExpirationFormat` if the `expires_at` grant is present
/// but not an RFC3339 timestamp.
pub fn customer_entitlements(
    license: &SignedLicense,
) -> LicenseResult<(Vec<EntitlementEntry>, Option<DateTime<Utc>>)> {
    let mut entries = Vec::new();
    let mut expires_at = None;

    for (key, grant) in &license.payload().entitlements {
        match ReservedGrant::from_key(key) {
            Some(ReservedGrant::ExpiresAt) => {
                expires_at = expiration_from_grant(grant)?;
            }
            Some(ReservedGrant::GitopsEnabled) => {}
            None => {
                if grant.is_hidden {
                    continue;
                }
                entries.push(EntitlementEntry {
                    title: grant.title.clone(),
                    value: grant.value.clone(),
                    label: key.clone(),
                });
            }
        }
    }

    Ok((entries, expires_at))
}

/// Projects every grant into the platform compatibility listing.
///
/// Hidden grants are kept with `hide_from_customer` set. The `expires_at`
/// grant is diverted to the second return value as the raw grant string
/// (empty or non-string means no expiration); the platform listing passes
/// it through without parsing, so this projection is infallible.
#[must_use]
pub fn platform_fields(license: &SignedLicense) -> (Vec<PlatformField>, Option<String>) {
    let mut fields = Vec::new();
    let mut expiration = None;

    for (key, grant) in &license.payload().entitlements {
        match ReservedGrant::from_key(key) {
            Some(ReservedGrant::ExpiresAt) => {
                if let Some(s) = grant.value.as_str() {
                    if !s.is_empty() {
                        expiration = Some(s.to_string());
                    }
                }
            }
            // gitops_enabled is an ordinary platform field; only the
            // customer projection drops it.
            Some(ReservedGrant::GitopsEnabled) | None => {
                fields.push(PlatformField {
                    field: key.clone(),
                    title: grant.title.clone(),
                    value_type: grant.value_type.clone(),
                    value: grant.value.clone(),
                    hide_from_customer: grant.is_hidden,
                });
            }
        }
    }

    (fields, expiration)
}
