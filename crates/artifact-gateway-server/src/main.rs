// crates/artifact-gateway-server/src/main.rs
// ============================================================================
// Module: Artifact Gateway Entry Point
// Description: Process bootstrap for the registry-driven gateway.
// Purpose: Load configuration and the registry, then serve until shutdown.
// Dependencies: artifact-gateway-{config,core,server,store}, clap, tokio
// ============================================================================

//! ## Overview
//! The gateway binary resolves settings from the environment (with CLI
//! overrides), loads the endpoint registry once, wires the executor over the
//! file-backed store and flow source, and serves until interrupted. Registry
//! failures abort startup; SIGINT triggers graceful shutdown and cancels
//! in-flight flow executions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use artifact_gateway_config::FsFlowSource;
use artifact_gateway_config::GatewaySettings;
use artifact_gateway_config::load_registry;
use artifact_gateway_core::FlowExecutor;
use artifact_gateway_server::GatewayState;
use artifact_gateway_server::build_router;
use artifact_gateway_store::FsDatasetStore;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Contract-first artifact gateway.
#[derive(Debug, Parser)]
#[command(name = "artifact-gateway", version, about)]
struct Cli {
    /// Repository directory (overrides REPO_PATH).
    #[arg(long)]
    repo_path: Option<PathBuf>,
    /// Route base path (overrides BASE_PATH).
    #[arg(long)]
    base_path: Option<String>,
    /// Listen address (overrides GATEWAY_ADDR).
    #[arg(long)]
    addr: Option<String>,
}

impl Cli {
    /// Merges CLI overrides onto environment-derived settings.
    fn settings(&self) -> GatewaySettings {
        let mut settings = GatewaySettings::from_env();
        if let Some(repo_path) = &self.repo_path {
            settings.repo_path = repo_path.clone();
        }
        if let Some(base_path) = &self.base_path {
            settings.base_path = base_path.clone();
        }
        if let Some(addr) = &self.addr {
            settings.listen_addr = addr.clone();
        }
        settings
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    let registry = match load_registry(&settings.registry_path()) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!("failed to load registry: {err}");
            return ExitCode::FAILURE;
        }
    };

    let flows = Arc::new(FsFlowSource::new(&settings.repo_path));
    let store = Arc::new(FsDatasetStore::new(&settings.repo_path));
    let executor = Arc::new(FlowExecutor::new(flows, store));

    let cancel = CancellationToken::new();
    let state = GatewayState {
        executor,
        cancel: cancel.clone(),
    };

    let router = match build_router(&settings, &registry, state) {
        Ok(router) => router,
        Err(err) => {
            tracing::error!("failed to build router: {err}");
            return ExitCode::FAILURE;
        }
    };

    let bind_addr = settings.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind {bind_addr}: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        addr = %bind_addr,
        base = %settings.base_path,
        repo = %settings.repo_path.display(),
        "artifact gateway listening"
    );

    let shutdown = cancel.clone();
    let served = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    });

    if let Err(err) = served.await {
        tracing::error!("server failed: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
