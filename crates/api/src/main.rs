//! Hazard Monitor - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Hazard Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Monitoring {} zones, incident log: {}",
        config.monitor.zones.len(),
        config.storage.incident_db.as_deref().unwrap_or("in-memory")
    );

    run_server(config).await?;

    Ok(())
}
