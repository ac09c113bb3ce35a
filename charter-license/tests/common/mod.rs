//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use charter_license::TrustAnchor;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, TrustAnchor) {
    let seed = [42u8; 32];
    let signing_key = SigningKey::from_bytes(&seed);
    let anchor = TrustAnchor::from_bytes(signing_key.verifying_key().to_bytes());
    (signing_key, anchor)
}

/// Signs a payload JSON string into a license document:
/// `base64url(payload_json).base64url(signature)`. The signature covers
/// the base64url-encoded payload string bytes (matching the issuer).
pub fn sign_document(signing_key: &SigningKey, payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key.sign(payload_b64.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
    format!("{payload_b64}.{sig_b64}")
}

/// Returns a baseline payload for `app_slug` with an empty grant set.
pub fn base_payload(app_slug: &str) -> Value {
    json!({
        "licenseId": "lic-0001",
        "appSlug": app_slug,
        "licenseSequence": 1,
        "channelName": "stable",
        "licenseType": "paid",
        "customerName": "Test Customer",
        "isAirgapSupported": false,
        "endpoint": "https://licensing.example.com",
        "entitlements": {}
    })
}

/// Signs a JSON payload value into a document.
pub fn sign_payload(signing_key: &SigningKey, payload: &Value) -> String {
    sign_document(signing_key, &payload.to_string())
}

/// Returns a signed document for `app_slug` carrying the given grant set.
pub fn document_with_entitlements(
    signing_key: &SigningKey,
    app_slug: &str,
    entitlements: Value,
) -> String {
    let mut payload = base_payload(app_slug);
    payload["entitlements"] = entitlements;
    sign_payload(signing_key, &payload)
}
