//! Proof-of-play HTTP API

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use signage_core::models::CreatePlayLogRequest;

use crate::http::{message, AppResult, AppState};

/// Record one completed play
#[axum::debug_handler]
pub async fn create_log(
    State(state): State<AppState>,
    Json(req): Json<CreatePlayLogRequest>,
) -> AppResult<impl IntoResponse> {
    state.services.play_log_service.record(req).await?;
    Ok((StatusCode::CREATED, message("Log received.")))
}

/// Most recent plays first
#[axum::debug_handler]
pub async fn list_logs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let logs = state.services.play_log_service.list().await?;
    Ok(Json(logs))
}
