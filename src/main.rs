//! Forward Gateway
//!
//! A header-directed HTTP forwarding gateway built with Tokio and Axum.
//! Callers name the destination origin per request in `X-Proxy-Target`;
//! the gateway authenticates them with `X-Proxy-Auth`, forwards the request
//! (optionally through an upstream proxy) and logs both sides of the exchange.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────────┐
//!                              │                    FORWARD GATEWAY                        │
//!                              │                                                           │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐          │
//!     ─────────────────────────┼─▶│  http   │───▶│security │───▶│   routing    │          │
//!     X-Proxy-Target           │  │ server  │    │  auth   │    │   target     │          │
//!     X-Proxy-Auth             │  └────┬────┘    └─────────┘    └──────┬───────┘          │
//!                              │       │ dump                          │                   │
//!                              │       ▼                               ▼                   │
//!                              │  ┌─────────┐                  ┌──────────────┐           │
//!                              │  │ dumper  │                  │    proxy     │  upstream  │
//!                              │  │immediate│◀─────────────────│  dispatcher  │──(proxy)──┼──▶ Destination
//!                              │  │deferred │     head         │   + egress   │           │
//!                              │  └────▲────┘                  └──────┬───────┘           │
//!                              │       │ close                         │                   │
//!     Client Response          │  ┌────┴─────────────┐                 │                   │
//!     ◀────────────────────────┼──│ capture stream   │◀────────────────┘                   │
//!                              │  │ (tee to buffer)  │                                     │
//!                              │  └──────────────────┘                                     │
//!                              │                                                           │
//!                              │  ┌─────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                  │ │
//!                              │  │  ┌─────────┐ ┌──────────────┐ ┌──────────────────┐  │ │
//!                              │  │  │ config  │ │observability │ │    lifecycle     │  │ │
//!                              │  │  │ + flags │ │ logs/metrics │ │ startup/shutdown │  │ │
//!                              │  │  └─────────┘ └──────────────┘ └──────────────────┘  │ │
//!                              │  └─────────────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forward_gateway::config::{load_config, CliOverrides};
use forward_gateway::observability::{logging, metrics};
use forward_gateway::{GatewayServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "forward-gateway")]
#[command(about = "Header-directed HTTP forwarding gateway", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (e.g., 127.0.0.1:8080)
    #[arg(long)]
    addr: Option<String>,

    /// Shared secret expected in X-Proxy-Auth; empty disables authentication
    #[arg(long)]
    proxy_auth: Option<String>,

    /// Append log output to this file instead of stdout
    #[arg(long = "log")]
    log_file: Option<PathBuf>,

    /// Include bodies in request and response dumps
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    dump_body: Option<bool>,

    /// Forward proxy for all destination traffic (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    local_proxy: Option<String>,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            bind_address: self.addr.clone(),
            secret: self.proxy_auth.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
            dump_body: self.dump_body,
            upstream_proxy: self.local_proxy.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration; flags win over the file
    let config = load_config(cli.config.as_deref(), cli.overrides())?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = logging::init_logging(&config.observability)?;

    tracing::info!("forward-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        auth = config.auth.secret.as_deref().is_some_and(|s| !s.is_empty()),
        dump_enabled = config.dump.enabled,
        dump_body = config.dump.body,
        upstream_proxy = config.upstream.proxy_url.as_deref().unwrap_or("none"),
        request_timeout_secs = ?config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already validated
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind listener");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = GatewayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
