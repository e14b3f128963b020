//! Drowsiness Dashboard API
//!
//! Read-only HTTP surface over the shared event log.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use storage::EventLog;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
pub mod settings;

pub use error::ApiError;
pub use settings::{load_settings, DashboardSettings, LoggingSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Event log queried by every route
    pub event_log: Arc<dyn EventLog>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(event_log: Arc<dyn EventLog>) -> Self {
        Self {
            event_log,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub event_log: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub rows: Option<usize>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sessions", get(routes::sessions::list_sessions))
        .route("/api/events", get(routes::events::get_events))
        .route("/api/v1/health", get(health_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let event_log = match routes::read_log(&state.event_log, |log| log.rows()).await {
        Ok(rows) => ComponentHealth {
            status: "ok".to_string(),
            rows: Some(rows.len()),
        },
        Err(e) => ComponentHealth {
            status: format!("error: {}", e),
            rows: None,
        },
    };
    let status = if event_log.rows.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus { event_log },
    })
}

/// Initialize logging at `level` (trace, debug, info, warn, error)
pub fn init_logging(level: &str) -> Result<(), ApiError> {
    let level: Level = level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown log level '{}'", level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ApiError::Logging(e.to_string()))
}

/// Serve the dashboard on `addr` until `shutdown` resolves
pub async fn run_server<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> Result<(), ApiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Starting dashboard server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use dms::{Event, EventType};
    use serde_json::Value;
    use std::fs;
    use storage::{CsvEventLog, EventRow, MemoryEventLog};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn event(session: &str, event_type: EventType, timestamp: f64) -> Event {
        Event {
            session_id: session.to_string(),
            event_type,
            timestamp,
            metric_value: 0.2,
        }
    }

    async fn get_json(log: Arc<dyn EventLog>, uri: &str) -> (StatusCode, Value) {
        let app = create_router(Arc::new(AppState::new(log)));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn seeded_log() -> Arc<dyn EventLog> {
        let log = MemoryEventLog::new();
        log.append(&event("morning", EventType::EyeClosure, 2.0)).unwrap();
        log.append(&event("evening", EventType::Yawn, 4.0)).unwrap();
        log.append(&event("evening", EventType::EyeClosure, 6.0)).unwrap();
        Arc::new(log)
    }

    #[tokio::test]
    async fn test_sessions() {
        let (status, body) = get_json(seeded_log(), "/api/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["morning", "evening"]));
    }

    #[tokio::test]
    async fn test_events_for_session() {
        let (status, body) = get_json(seeded_log(), "/api/events?session_id=morning").await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["event_type"], "eye_closure");
        assert_eq!(rows[0]["timestamp"], 2.0);
    }

    #[tokio::test]
    async fn test_events_default_to_latest_session() {
        let (_, body) = get_json(seeded_log(), "/api/events").await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["session_id"] == "evening"));
    }

    #[tokio::test]
    async fn test_missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn EventLog> = Arc::new(CsvEventLog::new(dir.path().join("none.csv")));

        let (status, body) = get_json(log.clone(), "/api/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (status, body) = get_json(log, "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_malformed_log_is_server_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        fs::write(&path, "session_id,timestamp,event_type,metric_value\ns,x,olhos\n").unwrap();
        let log: Arc<dyn EventLog> = Arc::new(CsvEventLog::new(&path));

        let (status, body) = get_json(log.clone(), "/api/events").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Malformed"));

        let (status, body) = get_json(log, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    struct PanickingLog;

    impl EventLog for PanickingLog {
        fn append(&self, _event: &Event) -> Result<(), storage::StorageError> {
            Ok(())
        }

        fn rows(&self) -> Result<Vec<EventRow>, storage::StorageError> {
            panic!("reader crashed");
        }
    }

    #[tokio::test]
    async fn test_crashed_read_is_server_error() {
        let log: Arc<dyn EventLog> = Arc::new(PanickingLog);

        let (status, body) = get_json(log.clone(), "/api/sessions").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Log read did not complete"));

        let (status, _) = get_json(log.clone(), "/api/events?session_id=s").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get_json(log, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(seeded_log(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["event_log"]["rows"], 3);
    }
}
