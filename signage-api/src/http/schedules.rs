//! Schedule HTTP API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use signage_core::models::{CreateScheduleRequest, ScheduleId};

use crate::http::{message, AppResult, AppState};

#[axum::debug_handler]
pub async fn list_schedules(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let schedules = state.services.schedule_service.list().await?;
    Ok(Json(schedules))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> AppResult<impl IntoResponse> {
    let schedule = state.services.schedule_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .services
        .schedule_service
        .delete(&ScheduleId::from_string(id))
        .await?;
    Ok(message("Schedule deleted successfully"))
}
