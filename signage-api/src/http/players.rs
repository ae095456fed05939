//! Player management HTTP API

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use serde_json::json;
use signage_core::models::{
    AssignContentRequest, PairPlayerRequest, PlayerId, UpdatePlayerRequest,
};

use crate::http::{message, AppResult, AppState};

/// List every player, newest first
#[axum::debug_handler]
pub async fn list_players(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let players = state.services.player_service.list().await?;
    Ok(Json(players))
}

/// Get one player with its assigned content loaded
#[axum::debug_handler]
pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let detail = state
        .services
        .player_service
        .get(&PlayerId::from_string(id))
        .await?;
    Ok(Json(detail))
}

/// Confirm the pairing code a device is displaying
#[axum::debug_handler]
pub async fn pair_player(
    State(state): State<AppState>,
    Json(req): Json<PairPlayerRequest>,
) -> AppResult<impl IntoResponse> {
    let player = state.services.pairing_service.confirm_pairing(&req).await?;
    Ok(Json(json!({
        "message": "Player paired successfully",
        "player": player,
    })))
}

#[axum::debug_handler]
pub async fn update_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlayerRequest>,
) -> AppResult<impl IntoResponse> {
    let player = state
        .services
        .player_service
        .update(&PlayerId::from_string(id), req)
        .await?;
    Ok(Json(player))
}

/// Point a player at a media item or playlist, or clear it
#[axum::debug_handler]
pub async fn assign_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignContentRequest>,
) -> AppResult<impl IntoResponse> {
    let player = state
        .services
        .player_service
        .assign(&PlayerId::from_string(id), req)
        .await?;
    Ok(Json(player))
}

#[axum::debug_handler]
pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .services
        .player_service
        .delete(&PlayerId::from_string(id))
        .await?;
    Ok(message("Player deleted successfully"))
}
