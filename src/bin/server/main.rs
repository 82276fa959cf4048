//! dimfilter HTTP Server
//!
//! Serves chart resources over a JSON dataset. Each resource answers
//! `POST /api/<resource>` with the chart data computed under the filter set
//! sent in the request body.
//!
//! # Endpoints
//!
//! - `POST /api/:resource` - Restore filters and compute chart data
//! - `GET /api/:resource/stats` - Resource totals
//! - `GET /api/resources` - Served resources
//! - `GET /health` - Health check
//!
//! # CLI Commands
//!
//! - `start` - Start the HTTP server (default if no command specified)
//! - `check-config` - Validate configuration file and dataset
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `DIMFILTER_CONFIG` environment variable (path to TOML file)
//! 2. `./dimfilter.toml` in current directory
//! 3. Default configuration

mod config;

use clap::{Parser, Subcommand};
use config::load_config;
use dimfilter::config::Config;
use dimfilter::server::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, warn};

// =============================================================================
// CLI Definition
// =============================================================================

/// dimfilter - coordinated dimensional filtering server
#[derive(Parser)]
#[command(name = "dimfilter-server")]
#[command(version)]
#[command(about = "Aggregation server for coordinated dashboard charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (overrides DIMFILTER_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long, global = true)]
    listen: Option<String>,

    /// Override dataset path
    #[arg(short, long, global = true)]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration and dataset without starting the server
    CheckConfig,
}

/// Resolve configuration with CLI overrides applied
fn resolve_config(cli: &Cli) -> dimfilter::Result<Config> {
    if let Some(config_path) = &cli.config {
        std::env::set_var("DIMFILTER_CONFIG", config_path);
    }

    let mut config = load_config();
    if let Some(data_file) = &cli.data_file {
        config.dataset.path = data_file.clone();
    }
    if let Some(listen) = &cli.listen {
        config.apply_listen_override(listen)?;
    }
    Ok(config)
}

// =============================================================================
// CLI Command Handlers
// =============================================================================

/// Validate configuration, load the dataset and print a summary
fn cmd_check_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(cli)?;
    config.validate()?;
    let state = AppState::from_config(&config)?;

    println!("Configuration is valid!");
    println!();
    println!("Server Settings:");
    println!("  Listen address: {}", config.listen_addr());
    println!("  Log level: {}", config.server.log_level);
    println!();
    println!("Dataset:");
    println!("  Path: {}", config.dataset.path.display());
    println!("  Dimensions: {}", config.dimensions.len());
    for dim in &config.dimensions {
        println!("    {} ({:?}): {}", dim.key, dim.shape, dim.fields.join(", "));
    }
    println!();
    println!("Resources:");
    for (name, adapter) in &state.adapters {
        let stats = adapter.stats();
        println!("  {} ({:?}): {} records", name, adapter.kind(), stats.total);
    }

    Ok(())
}

// =============================================================================
// Server Lifecycle
// =============================================================================

/// Graceful shutdown signal handler
///
/// Signal registration failures are logged and the handler waits forever,
/// leaving the server to be killed forcefully.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler installation failed - graceful shutdown unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "SIGTERM handler installation failed - SIGTERM shutdown unavailable");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::CheckConfig) => return cmd_check_config(&cli),
        Some(Commands::Start) | None => {},
    }

    let config = resolve_config(&cli)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("Starting dimfilter server v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    let state = Arc::new(AppState::from_config(&config)?);
    for (name, adapter) in &state.adapters {
        debug!(resource = %name, kind = ?adapter.kind(), "Resource ready");
    }

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!(
        addr = %listen_addr,
        resources = state.adapters.len(),
        "Server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
