//! Drowsiness Monitor - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppState};
use clap::Parser;
use dms::SessionContext;
use monitor::{Monitor, MonitorSettings, ReplayProvider, StopFlag};
use std::path::PathBuf;
use std::sync::Arc;
use storage::{CsvEventLog, EventLog};
use tracing::{error, info};

/// Replay recorded landmark frames through the drowsiness pipeline
#[derive(Parser, Debug)]
#[command(name = "drowsiness-monitor", version, about)]
struct Args {
    /// JSON-lines file of recorded frames
    #[arg(short, long)]
    input: PathBuf,

    /// Settings file (defaults to ./drowsiness.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event log CSV, overrides `storage.log_path`
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Session id; generated from the start time when omitted
    #[arg(long)]
    session_id: Option<String>,

    /// Also serve the dashboard while monitoring
    #[arg(long)]
    dashboard: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings =
        MonitorSettings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(log_path) = args.log_path {
        settings.storage.log_path = log_path;
    }
    settings.monitor.serve_dashboard |= args.dashboard;

    init_logging(&settings.logging.level)?;
    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let session = args
        .session_id
        .map(SessionContext::new)
        .unwrap_or_else(SessionContext::generate);
    let event_log: Arc<dyn EventLog> = Arc::new(
        CsvEventLog::open(&settings.storage.log_path).context("Failed to open event log")?,
    );

    let dashboard = settings.monitor.serve_dashboard.then(|| {
        let addr = settings.dashboard.bind_addr.clone();
        let state = Arc::new(AppState::new(event_log.clone()));
        tokio::spawn(async move {
            if let Err(e) = run_server(&addr, state, std::future::pending()).await {
                error!("Dashboard server failed: {}", e);
            }
        })
    });

    let stop = StopFlag::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            ctrl_c_stop.stop();
        }
    });

    let mut monitor = Monitor::from_settings(&settings, session, event_log, stop)?;
    let input = args.input;
    let stats = tokio::task::spawn_blocking(move || {
        let mut provider = ReplayProvider::open(&input)?;
        monitor.run(&mut provider)
    })
    .await
    .context("Frame loop panicked")??;

    info!(
        "Session finished: {} frames, {} events, {} at-risk frames",
        stats.frames, stats.events, stats.risk_frames
    );

    if let Some(handle) = dashboard {
        handle.abort();
    }
    Ok(())
}
