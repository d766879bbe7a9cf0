//! Web relay
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!     Client Request     │                  WEB RELAY                   │
//!     ───────────────────┼─▶ listener ─▶ router ─┬─▶ render ─▶ browser  │
//!                        │                       │                      │
//!                        │                       └─▶ forward ─▶ headers ┼──▶ Upstream
//!     Client Response    │                                              │
//!     ◀──────────────────┼── response ◀── inbound header policy ◀───────┼───
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use web_relay::config::{resolve_config, RelayMode};
use web_relay::observability::{logging, metrics};
use web_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "web-relay")]
#[command(about = "Render a page headlessly or relay a fixed upstream", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Relay variant; overrides the file and RELAY_MODE.
    #[arg(short, long)]
    mode: Option<RelayMode>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.mode)?;

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "web-relay starting");
    tracing::info!(
        mode = %config.mode,
        bind_address = %config.listener.bind_address(),
        upstream = %config.forward.upstream,
        hardened = config.forward.hardened,
        target_url = %config.render.target_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
