//! Edge proxy binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌────────────────────────────────────────────────┐
//!                          │                   EDGE PROXY                    │
//!                          │                                                 │
//!   Client Request         │  ┌─────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ───────────────────────┼─▶│  http   │──▶│ routing  │──▶│ http client │──┼──▶ CDN / API
//!                          │  │ server  │   │  gate +  │   │  + backoff  │  │
//!                          │  └────┬────┘   │ dispatch │   └──────┬──────┘  │
//!                          │       │        └──────────┘          │         │
//!   Client Response        │       ▼                              ▼         │
//!   ◀──────────────────────┼── response (pass through / settings rewrite)   │
//!                          │       │                                         │
//!                          │       ▼ after responding                        │
//!                          │  ┌──────────┐   ┌──────────┐   ┌────────────┐  │
//!                          │  │ log      │──▶│ exporter │──▶│ auth token │──┼──▶ entries:write
//!                          │  │ buffer   │   │ + backoff│   │  (RS256)   │  │
//!                          │  └──────────┘   └──────────┘   └────────────┘  │
//!                          └────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;

use edge_proxy::config::loader::load_from_env;
use edge_proxy::lifecycle::signals::forward_signals;
use edge_proxy::observability::{logging::init_tracing, metrics::init_metrics};
use edge_proxy::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    init_tracing(&config.observability)?;

    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        cdn_subdomain = %config.routing.cdn_subdomain,
        api_subdomain = %config.routing.api_subdomain,
        export_enabled = config.export.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    forward_signals(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
