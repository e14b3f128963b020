//! Session Routes

use axum::{extract::State, Json};
use std::sync::Arc;

use super::read_log;
use crate::{ApiError, AppState};

/// List every session id in the log, in order of first appearance
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let sessions = read_log(&state.event_log, |log| log.list_session_ids()).await?;
    Ok(Json(sessions))
}
