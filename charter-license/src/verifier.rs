//! Trust anchor material and license document verification.

use crate::document::{LicensePayload, SignedLicense};
use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Embedded Ed25519 public key for production license verification (32 bytes).
const CHARTER_PUBLIC_KEY: [u8; 32] = [
    61, 64, 23, 195, 232, 67, 137, 90, 146, 183, 10, 167, 77, 27, 126, 188,
    156, 152, 44, 207, 46, 196, 150, 140, 192, 205, 85, 241, 42, 244, 102, 12,
];

/// Ed25519 public key material that license signatures are checked against.
///
/// Deployments either use the embedded production anchor or supply their
/// own key bytes at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustAnchor([u8; 32]);

impl TrustAnchor {
    /// Returns the production anchor embedded in the binary.
    #[must_use]
    pub fn embedded() -> Self {
        Self(CHARTER_PUBLIC_KEY)
    }

    /// Wraps deployment-supplied raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Decodes deployment-supplied key material from base64url (no padding).
    ///
    /// # Errors
    ///
    /// Returns `InvalidTrustAnchor` if the input is not base64url or does
    /// not decode to 32 bytes.
    pub fn from_base64(encoded: &str) -> LicenseResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| LicenseError::InvalidTrustAnchor(format!("invalid base64: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LicenseError::InvalidTrustAnchor("key must be 32 bytes".to_string()))?;
        Ok(Self(bytes))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Default for TrustAnchor {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Verifies license documents against a trust anchor.
///
/// Documents use the format `base64url(payload).base64url(signature)`; the
/// signature covers the base64url-encoded payload string bytes, not the
/// decoded JSON.
#[derive(Debug, Clone)]
pub struct LicenseVerifier {
    anchor: TrustAnchor,
}

impl LicenseVerifier {
    /// Creates a verifier checking against the given anchor.
    #[must_use]
    pub fn new(anchor: TrustAnchor) -> Self {
        Self { anchor }
    }

    /// Returns the anchor this verifier checks against.
    #[must_use]
    pub fn anchor(&self) -> &TrustAnchor {
        &self.anchor
    }

    /// Parses and verifies a raw license document.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the document cannot be parsed into a license
    /// and `InvalidSignature` if the signature does not match the anchor.
    /// A license failing either check is wholly untrusted; no field of it
    /// may be honored.
    pub fn verify(&self, raw: &str) -> LicenseResult<SignedLicense> {
        let raw = raw.trim();

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 2 {
            return Err(LicenseError::Malformed(
                "document must have exactly two parts separated by a dot".to_string(),
            ));
        }

        let payload_b64 = parts[0];
        let signature_b64 = parts[1];

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| LicenseError::Malformed(format!("invalid payload base64: {e}")))?;

        let payload: LicensePayload = serde_json::from_slice(&payload_json)
            .map_err(|e| LicenseError::Malformed(format!("invalid payload JSON: {e}")))?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| LicenseError::Malformed(format!("invalid signature base64: {e}")))?;

        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| LicenseError::Malformed("invalid signature length".to_string()))?;

        let verifying_key = VerifyingKey::from_bytes(self.anchor.as_bytes())
            .map_err(|e| LicenseError::InvalidTrustAnchor(e.to_string()))?;

        // The signature covers the encoded payload string (matches the issuer).
        verifying_key
            .verify(payload_b64.as_bytes(), &signature)
            .map_err(|_| LicenseError::InvalidSignature)?;

        Ok(SignedLicense::new(raw.to_string(), payload))
    }
}

impl Default for LicenseVerifier {
    fn default() -> Self {
        Self::new(TrustAnchor::embedded())
    }
}
