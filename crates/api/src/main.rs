//! Drowsiness Dashboard - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppState, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use storage::CsvEventLog;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file = std::env::args().nth(1).map(PathBuf::from);
    let settings =
        Settings::load(config_file.as_deref()).context("Failed to load dashboard settings")?;

    init_logging(&settings.logging.level)?;

    info!("=== Drowsiness Dashboard v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Serving events from {}", settings.storage.log_path.display());

    let event_log = Arc::new(CsvEventLog::new(settings.storage.log_path.clone()));
    let state = Arc::new(AppState::new(event_log));

    run_server(&settings.dashboard.bind_addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("Dashboard stopped");
    Ok(())
}
