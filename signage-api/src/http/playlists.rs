//! Playlist HTTP API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use signage_core::models::{CreatePlaylistRequest, PlaylistId, UpdatePlaylistRequest};

use crate::http::{message, AppResult, AppState};

#[axum::debug_handler]
pub async fn list_playlists(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let playlists = state.services.playlist_service.list().await?;
    Ok(Json(playlists))
}

/// One playlist with each item's media attached
#[axum::debug_handler]
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let playlist = state
        .services
        .playlist_service
        .get(&PlaylistId::from_string(id))
        .await?;
    Ok(Json(playlist))
}

#[axum::debug_handler]
pub async fn create_playlist(
    State(state): State<AppState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> AppResult<impl IntoResponse> {
    let playlist = state.services.playlist_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Rename and/or replace the item list wholesale
#[axum::debug_handler]
pub async fn update_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> AppResult<impl IntoResponse> {
    let playlist = state
        .services
        .playlist_service
        .update(&PlaylistId::from_string(id), req)
        .await?;
    Ok(Json(playlist))
}

/// Delete and unassign from every player showing it
#[axum::debug_handler]
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .services
        .playlist_service
        .delete(&PlaylistId::from_string(id))
        .await?;
    Ok(message("Playlist deleted successfully"))
}
