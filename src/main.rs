//! scipnet server.
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!   HTTP(S)  ─────▶│ http::server ─┐                              │
//!                  │               ├─▶ routing::Dispatcher ─▶ handlers
//!   JSON-RPC ─────▶│ rpc::server ──┘        │                     │
//!                  │                 session::SessionGate         │
//!                  │                 permissions::PermissionSet   │
//!                  └──────────────────────────────────────────────┘
//! ```
//!
//! Serves the asset manifest and forwards page requests. Login processing
//! and page rendering are registered by embedding applications through
//! `lifecycle::build_services`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use scipnet::config::{load_config, ServerConfig};
use scipnet::lifecycle::{build_services, serve, trigger_on_signal, Shutdown};
use scipnet::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "scipnet")]
#[command(about = "Request dispatcher for the wiki platform", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("scipnet v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        rpc = config.rpc.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr);
    }

    let services = build_services(&config, |routes| routes)?;

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    serve(&config, services, &shutdown).await?;

    tracing::info!("scipnet stopped");
    Ok(())
}
