//! Signed license documents for Charter.
//!
//! This crate handles:
//! - License document parsing and Ed25519 signature verification
//! - Expiration computed from the reserved `expires_at` grant
//! - Entitlement projections (customer-facing and platform)
//!
//! # Design Principles
//!
//! - **No partial trust**: a document that fails signature verification is
//!   rejected whole; no field of it is honored
//! - **Byte-faithful persistence**: the raw document string is retained on
//!   every parsed license so stores persist exactly what the issuer signed
//! - **Pure validation**: nothing in this crate performs I/O
//!
//! # License Document Format
//!
//! Documents are formatted as `base64url(payload).base64url(signature)`.
//! The payload is a JSON object signed with Ed25519, carrying the license
//! identity, sequence number, capability flags, and the grant set.

mod document;
mod entitlements;
mod error;
mod verifier;

pub use document::{
    Entitlement, EntitlementValue, LicensePayload, LicenseType, ReservedGrant, SignedLicense,
};
pub use entitlements::{customer_entitlements, platform_fields, EntitlementEntry, PlatformField};
pub use error::{LicenseError, LicenseResult};
pub use verifier::{LicenseVerifier, TrustAnchor};
