pub mod admission; // Admission coordinator: atomic admit/discharge
pub mod api; // HTTP surface
pub mod billing; // Settlement cascade + totals
pub mod config;
pub mod core_state;
pub mod db;
pub mod error;
pub mod models;
pub mod notify; // Fire-and-forget notification hub
pub mod views; // Read-side joins + inconsistency report

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Initialize tracing and start serving the lifecycle API.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Wardflow starting v{}", config::APP_VERSION);

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let core = Arc::new(core_state::CoreState::new(config::database_path()));
    // Open once at startup so migrations run before the first request
    core.open_db()?;

    let addr: std::net::SocketAddr = std::env::var("WARDFLOW_BIND")
        .unwrap_or_else(|_| config::DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    let server = api::server::start_api_server(core, addr).await?;
    tracing::info!(addr = %server.local_addr, "Wardflow ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
