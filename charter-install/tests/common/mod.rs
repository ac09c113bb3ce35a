//! Shared test helpers for install driver tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use charter_install::{
    InstallDriver, InstallError, InstallResult, ManifestSet, Materializer, RegistryProbe,
};
use charter_license::{LicenseVerifier, TrustAnchor};
use charter_store::Store;
use charter_sync::{LicenseSyncer, SyncConfig};
use charter_types::{PendingApp, UpstreamRef};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

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

/// Returns a payload for `app_slug` with the given airgap capability.
pub fn payload(app_slug: &str, is_airgap_supported: bool) -> Value {
    json!({
        "licenseId": "lic-install-0001",
        "appSlug": app_slug,
        "licenseSequence": 1,
        "channelName": "stable",
        "licenseType": "paid",
        "customerName": "Test Customer",
        "isAirgapSupported": is_airgap_supported,
        "endpoint": "",
        "entitlements": {}
    })
}

/// Flips one signature byte of a document, keeping it well-formed.
pub fn corrupt_signature(document: &str) -> String {
    let (payload_b64, sig_b64) = document.split_once('.').unwrap();
    let mut sig = URL_SAFE_NO_PAD.decode(sig_b64).unwrap();
    sig[0] ^= 0x01;
    format!("{payload_b64}.{}", URL_SAFE_NO_PAD.encode(sig))
}

/// What a scripted materializer should do when invoked.
pub enum MaterializeScript {
    Succeed(ManifestSet),
    Fail(String),
}

/// Materializer double that records invocations.
pub struct ScriptedMaterializer {
    script: MaterializeScript,
    calls: AtomicUsize,
    seen_upstream: Mutex<Option<String>>,
}

impl ScriptedMaterializer {
    pub fn succeeding(manifests: ManifestSet) -> Arc<Self> {
        Arc::new(Self {
            script: MaterializeScript::Succeed(manifests),
            calls: AtomicUsize::new(0),
            seen_upstream: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            script: MaterializeScript::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
            seen_upstream: Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_upstream(&self) -> Option<String> {
        self.seen_upstream.lock().unwrap().clone()
    }
}

#[async_trait]
impl Materializer for ScriptedMaterializer {
    async fn materialize_from_online(
        &self,
        _pending: &PendingApp,
        upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_upstream.lock().unwrap() = Some(upstream.as_str().to_string());
        match &self.script {
            MaterializeScript::Succeed(manifests) => Ok(*manifests),
            MaterializeScript::Fail(message) => {
                Err(InstallError::Materialization(message.clone()))
            }
        }
    }
}

/// What a scripted registry probe should report.
pub enum ProbeScript {
    Configured,
    Missing,
    Fail(String),
}

/// Registry probe double.
pub struct ScriptedProbe {
    script: ProbeScript,
}

impl ScriptedProbe {
    pub fn configured() -> Arc<Self> {
        Arc::new(Self {
            script: ProbeScript::Configured,
        })
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            script: ProbeScript::Missing,
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            script: ProbeScript::Fail(message.to_string()),
        })
    }
}

#[async_trait]
impl RegistryProbe for ScriptedProbe {
    async fn has_local_registry(&self) -> InstallResult<bool> {
        match &self.script {
            ProbeScript::Configured => Ok(true),
            ProbeScript::Missing => Ok(false),
            ProbeScript::Fail(message) => Err(InstallError::RegistryProbe(message.clone())),
        }
    }
}

/// Builds a driver over an in-memory store with outbound sync disabled.
pub fn offline_driver(
    store: Arc<Store>,
    anchor: TrustAnchor,
    materializer: Arc<dyn Materializer>,
    probe: Arc<dyn RegistryProbe>,
) -> InstallDriver {
    driver_with_outbound(store, anchor, materializer, probe, false, None)
}

/// Builds a driver with full control over the outbound settings.
pub fn driver_with_outbound(
    store: Arc<Store>,
    anchor: TrustAnchor,
    materializer: Arc<dyn Materializer>,
    probe: Arc<dyn RegistryProbe>,
    allow_outbound: bool,
    endpoint_override: Option<String>,
) -> InstallDriver {
    let verifier = LicenseVerifier::new(anchor);
    let syncer = Arc::new(LicenseSyncer::new(
        LicenseVerifier::new(anchor),
        SyncConfig {
            endpoint_override,
            ..Default::default()
        },
    ));
    InstallDriver::new(store, materializer, probe, verifier, syncer, allow_outbound)
}

/// Opens a fresh in-memory store.
pub fn memory_store() -> Arc<Store> {
    Arc::new(Store::open_in_memory().unwrap())
}
