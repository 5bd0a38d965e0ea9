use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use fedgate_federation::FederationService;
use fedgate_federation_server::api::{self, AppState};
use fedgate_federation_server::config::AppConfig;
use fedgate_federation_server::state_factory;
use fedgate_state_memory::{MemoryGatewayRepository, MemoryToolStatusSink};

/// Gateway federation service HTTP server.
#[derive(Parser, Debug)]
#[command(name = "fedgate-federation-server", about = "Gateway federation control plane")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "fedgate.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config: AppConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    // The persistence layer and the sibling Tool Service are both out of
    // scope (§1); this composition root ships only the in-memory
    // repository/sink, matching the spec's "degenerate zero-external-
    // dependency deployment" (see DESIGN.md).
    let repository = Arc::new(MemoryGatewayRepository::new());
    let tool_sink = Arc::new(MemoryToolStatusSink::new());
    let lock = state_factory::create_lock(
        config.federation.cache_type,
        config.federation.redis_url.as_deref(),
        config.federation.filelock_path.as_deref(),
    )?;

    let service = Arc::new(FederationService::new(config.federation, repository, tool_sink, lock)?);
    service.initialize().await?;
    info!("federation service initialized");

    let app = api::router(AppState { service: Arc::clone(&service) });

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "fedgate-federation-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    info!("fedgate-federation-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
