//! Matrix Benchmark Server (mxs-server) - Main entry point
//!
//! Accepts one benchmark request per connection and streams progress and the
//! final timing result back to the client.

use anyhow::{Context, Result};
use clap::Parser;
use mxs_common::config::{ConfigSource, TomlConfig};
use mxs_server::cli::{Args, Settings};
use mxs_server::Server;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before logging exists; problems are reported below
    let loaded = TomlConfig::resolve(args.config.as_deref()).context("Failed to load config")?;
    let settings = Settings::merge(&args, &loaded.config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mxs_server={0},mxs_common={0}", settings.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting mxs-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &loaded.source {
        ConfigSource::File(path) => info!("Config loaded from {}", path.display()),
        ConfigSource::Defaults { missing: Some(path) } => {
            warn!("Config file {} not found, using defaults", path.display())
        }
        ConfigSource::Defaults { missing: None } => {
            warn!("No config directory on this platform, using defaults")
        }
    }

    let server = Server::bind(settings.bind_addr(), settings.session_options())
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_addr()))?;

    server
        .serve(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
