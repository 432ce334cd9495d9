//! Admission guard service entry point.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use admission_guard::config::{self, GuardConfig};
use admission_guard::http::HttpServer;
use admission_guard::lifecycle::{signals, Shutdown};
use admission_guard::observability::metrics;

#[derive(Parser, Debug)]
#[command(name = "admission-guard")]
#[command(about = "Request admission guard: sliding-window rate limiting and CSRF protection")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admission_guard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("admission-guard v0.1.0 starting");

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        profiles = config.rate_limit.profiles.len(),
        csrf_ttl_secs = config.csrf.ttl_secs,
        sweep_interval_secs = config.sweep.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    signals::wait_for_signal().await;
    shutdown.trigger();
    handle.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
