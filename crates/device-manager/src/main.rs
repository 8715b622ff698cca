use anyhow::Result;
use clap::Parser;
use infrastructure::config::{LatencyBackend, ServiceConfig};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use device_manager::{api, setup_app_state};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding default.toml and the per-environment overrides
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// API Port
    #[arg(long)]
    port: Option<u16>,

    /// Seconds since the last ping for a device to still count as ONLINE
    #[arg(long)]
    threshold_secs: Option<u64>,

    /// Keep latencies in memory regardless of the configured backend
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,device_manager=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();
    let args = Args::parse();
    info!("📟 Device Manager Starting...");

    let mut config = match ServiceConfig::load(&args.config_dir) {
        Ok(config) => config,
        Err(e) => {
            error!(config_dir = %args.config_dir, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(threshold) = args.threshold_secs {
        config.threshold_secs = threshold;
    }
    if args.in_memory {
        config.latency.backend = LatencyBackend::Memory;
    }
    config.validate()?;
    config.log_summary();

    let state = setup_app_state(&config).await?;

    let app = api::create_router(state.clone());
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("🚀 API Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let draining = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            draining.cancel_in_flight();
        })
        .await?;

    state.shutdown().await;
    info!("Device Manager stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
