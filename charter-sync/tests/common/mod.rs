//! Shared test helpers for sync tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use charter_license::TrustAnchor;
use charter_types::{App, AppId, InstallState, UpstreamRef};
use chrono::Utc;
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
/// `base64url(payload_json).base64url(signature)`.
pub fn sign_document(signing_key: &SigningKey, payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key.sign(payload_b64.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
    format!("{payload_b64}.{sig_b64}")
}

/// Signs a JSON payload value into a document.
pub fn sign_payload(signing_key: &SigningKey, payload: &Value) -> String {
    sign_document(signing_key, &payload.to_string())
}

/// Returns a payload for `app_slug` at `sequence`, pointing at `endpoint`.
pub fn payload(app_slug: &str, sequence: i64, endpoint: &str) -> Value {
    json!({
        "licenseId": "lic-sync-0001",
        "appSlug": app_slug,
        "licenseSequence": sequence,
        "channelName": "stable",
        "licenseType": "paid",
        "customerName": "Test Customer",
        "isAirgapSupported": false,
        "endpoint": endpoint,
        "entitlements": {}
    })
}

/// Returns an installed app record for `slug`.
pub fn installed_app(slug: &str) -> App {
    App {
        id: AppId::new(),
        name: slug.to_string(),
        slug: slug.to_string(),
        upstream_ref: UpstreamRef::from_app_slug(slug),
        is_airgap_supported: false,
        install_state: InstallState::OnlineInstallCompleted,
        created_at: Utc::now(),
    }
}
