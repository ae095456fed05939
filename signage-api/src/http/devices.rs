//! Device polling endpoint
//!
//! Devices call this every few seconds; the reply tells them whether to show
//! their pairing code, wait, or play the attached manifest.

use axum::{extract::State, Json};
use signage_core::models::{HeartbeatRequest, HeartbeatResponse};

use crate::http::{AppResult, AppState};

/// POST /api/devices/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> AppResult<Json<HeartbeatResponse>> {
    let response = state.services.pairing_service.heartbeat(&req).await?;
    Ok(Json(response))
}
