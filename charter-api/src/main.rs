//! Charter license API server.
//!
//! Serves the license lifecycle API for a single installed application:
//! license upload and acceptance, sync against the licensing authority,
//! entitlement queries, and install resume.
//!
//! Usage:
//!   charter-api --api-token <token> [--port 3000] [--db charter.db]

use anyhow::{Context, Result};
use charter_api::{
    build_router, ApiState, ManifestDirMaterializer, StaticRegistryProbe, StaticTokenValidator,
};
use charter_install::InstallDriver;
use charter_license::{LicenseVerifier, TrustAnchor};
use charter_store::Store;
use charter_sync::{LicenseSyncer, SyncConfig};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "charter-api")]
#[command(about = "Charter license lifecycle API server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Path to the SQLite app store
    #[arg(long, default_value = "charter.db")]
    db: String,

    /// Operator API token required on /api/v1 routes
    #[arg(long)]
    api_token: String,

    /// Base64 Ed25519 trust anchor (defaults to the embedded key)
    #[arg(long)]
    trust_anchor: Option<String>,

    /// Directory of pre-rendered app manifests
    #[arg(long, default_value = "./manifests")]
    manifests_dir: String,

    /// Local registry host available for airgap bundle pushes
    #[arg(long)]
    registry_host: Option<String>,

    /// Disable all outbound network calls (also: CHARTER_DISABLE_OUTBOUND=1)
    #[arg(long)]
    disable_outbound: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Charter API starting...");

    let anchor = match &args.trust_anchor {
        Some(encoded) => TrustAnchor::from_base64(encoded).context("Invalid trust anchor")?,
        None => TrustAnchor::embedded(),
    };

    // The operator switch is read once here and threaded as
    // configuration; nothing below reads the environment.
    let disable_outbound = args.disable_outbound
        || std::env::var("CHARTER_DISABLE_OUTBOUND")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
    let allow_outbound = !disable_outbound;
    if !allow_outbound {
        info!("Outbound network calls disabled");
    }

    let store = Arc::new(Store::new(&args.db).context("Failed to open app store")?);
    let syncer = Arc::new(LicenseSyncer::new(
        LicenseVerifier::new(anchor),
        SyncConfig::default(),
    ));
    let materializer = Arc::new(ManifestDirMaterializer::new(&args.manifests_dir));
    let registry = Arc::new(StaticRegistryProbe::new(
        args.registry_host.as_deref().is_some_and(|h| !h.is_empty()),
    ));
    let driver = Arc::new(InstallDriver::new(
        Arc::clone(&store),
        materializer,
        registry,
        LicenseVerifier::new(anchor),
        Arc::clone(&syncer),
        allow_outbound,
    ));
    let sessions = Arc::new(StaticTokenValidator::new(&args.api_token));

    let state = ApiState::new(
        store,
        driver,
        syncer,
        LicenseVerifier::new(anchor),
        sessions,
        allow_outbound,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .context("Failed to bind API port")?;
    info!("License API listening on port {}", args.port);
    axum::serve(listener, app).await.context("API server failed")?;

    Ok(())
}
