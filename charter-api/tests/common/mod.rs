//! Shared test helpers for the license API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use charter_api::{build_router, ApiState, StaticTokenValidator};
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
use std::sync::Arc;

/// Token every authenticated test request presents.
pub const API_TOKEN: &str = "test-operator-token";

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

/// Returns a baseline payload for `app_slug` at the given sequence.
pub fn payload(app_slug: &str, sequence: i64) -> Value {
    json!({
        "licenseId": "lic-api-0001",
        "appSlug": app_slug,
        "licenseSequence": sequence,
        "channelName": "stable",
        "licenseType": "paid",
        "customerName": "Test Customer",
        "isAirgapSupported": false,
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

/// Materializer double returning a fixed manifest set.
pub struct FixedMaterializer {
    manifests: ManifestSet,
}

impl FixedMaterializer {
    pub fn new(manifests: ManifestSet) -> Arc<Self> {
        Arc::new(Self { manifests })
    }
}

#[async_trait]
impl Materializer for FixedMaterializer {
    async fn materialize_from_online(
        &self,
        _pending: &PendingApp,
        _upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet> {
        Ok(self.manifests)
    }
}

/// Materializer double that always fails.
pub struct FailingMaterializer;

#[async_trait]
impl Materializer for FailingMaterializer {
    async fn materialize_from_online(
        &self,
        _pending: &PendingApp,
        _upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet> {
        Err(InstallError::Materialization(
            "upstream unreachable".to_string(),
        ))
    }
}

/// Materializer double failing a set number of calls, then succeeding.
pub struct FlakyMaterializer {
    manifests: ManifestSet,
    failures_left: AtomicUsize,
}

impl FlakyMaterializer {
    pub fn failing_once(manifests: ManifestSet) -> Arc<Self> {
        Arc::new(Self {
            manifests,
            failures_left: AtomicUsize::new(1),
        })
    }
}

#[async_trait]
impl Materializer for FlakyMaterializer {
    async fn materialize_from_online(
        &self,
        _pending: &PendingApp,
        _upstream: &UpstreamRef,
    ) -> InstallResult<ManifestSet> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(InstallError::Materialization(
                "upstream unreachable".to_string(),
            ));
        }
        Ok(self.manifests)
    }
}

/// Registry probe double with a fixed answer.
pub struct FixedProbe {
    configured: bool,
}

impl FixedProbe {
    pub fn new(configured: bool) -> Arc<Self> {
        Arc::new(Self { configured })
    }
}

#[async_trait]
impl RegistryProbe for FixedProbe {
    async fn has_local_registry(&self) -> InstallResult<bool> {
        Ok(self.configured)
    }
}

/// Knobs for a test server.
pub struct ApiOptions {
    pub allow_outbound: bool,
    pub endpoint_override: Option<String>,
    pub materializer: Arc<dyn Materializer>,
    pub registry_configured: bool,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            allow_outbound: false,
            endpoint_override: None,
            materializer: FixedMaterializer::new(ManifestSet {
                has_preflight: true,
                has_config: true,
            }),
            registry_configured: true,
        }
    }
}

/// A running API server plus the handles tests assert against.
pub struct TestApi {
    pub base: String,
    pub store: Arc<Store>,
    pub client: reqwest::Client,
}

impl TestApi {
    /// Full URL for a path under the server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Spins up the API over an in-memory store with default options:
/// outbound disabled, full manifests, registry configured.
pub async fn spawn_api(anchor: TrustAnchor) -> TestApi {
    spawn_api_with(anchor, ApiOptions::default()).await
}

/// Spins up the API with full control over the options, returning the
/// base URL and the store backing the server.
pub async fn spawn_api_with(anchor: TrustAnchor, options: ApiOptions) -> TestApi {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let syncer = Arc::new(LicenseSyncer::new(
        LicenseVerifier::new(anchor),
        SyncConfig {
            endpoint_override: options.endpoint_override,
            ..Default::default()
        },
    ));
    let driver = Arc::new(InstallDriver::new(
        Arc::clone(&store),
        options.materializer,
        FixedProbe::new(options.registry_configured),
        LicenseVerifier::new(anchor),
        Arc::clone(&syncer),
        options.allow_outbound,
    ));
    let sessions = Arc::new(StaticTokenValidator::new(API_TOKEN));
    let state = ApiState::new(
        Arc::clone(&store),
        driver,
        syncer,
        LicenseVerifier::new(anchor),
        sessions,
        options.allow_outbound,
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApi {
        base: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}
