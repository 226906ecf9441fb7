mod config;
use config::AppConfig;
use pxdash_core::dashboard::DashboardServer;
use pxdash_core::telemetry;
use pxdash_core::DataStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env next to the binary
    dotenvy::dotenv().ok();

    // Logging / tracing
    telemetry::init_tracing()?;

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = AppConfig::load();
    let addr = cfg.dashboard.addr();

    info!(
        target: "datasets_dashboard",
        addr = %addr,
        title = %cfg.dashboard.title,
        data_dir = %cfg.dashboard.data_dir.display(),
        "Starting datasets dashboard"
    );

    // Tables are read once; a file that exists but is broken stops startup
    let data = match DataStore::load_dir(&cfg.dashboard.data_dir) {
        Ok(d) => d,
        Err(e) => {
            error!(target: "datasets_dashboard", error = %e, "Failed to load datasets");
            return Err(e.into());
        }
    };

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(target: "datasets_dashboard", addr = %addr, error = %e, "Failed to bind");
            return Err(e.into());
        }
    };

    // Ctrl+C handler to shutdown gracefully
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(target: "datasets_dashboard", error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!(target: "datasets_dashboard", "Shutting down...");
    };

    DashboardServer::new(cfg.dashboard)
        .with_data(data)
        .serve_with_listener(listener, shutdown)
        .await?;

    Ok(())
}
