//! Event Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use storage::EventRow;
use tracing::debug;

use super::read_log;
use crate::{ApiError, AppState};

/// Query parameters for events endpoint
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Session to fetch; the most recent session when absent
    pub session_id: Option<String>,
}

/// Get events for one session
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventQuery>,
) -> Result<Json<Vec<EventRow>>, ApiError> {
    let session_id = params.session_id.filter(|id| !id.is_empty());
    let query = session_id.clone();
    let rows = read_log(&state.event_log, move |log| log.events(query.as_deref())).await?;
    debug!("Serving {} events for {:?}", rows.len(), session_id);
    Ok(Json(rows))
}
