//! Folder HTTP API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use signage_core::models::{
    CreateFolderRequest, FolderId, RenameRequest, ReorderFolderRequest, UpdateFolderRequest,
};

use crate::http::{message, AppResult, AppState};

/// Folders with preview item, item count, total size and total duration
#[axum::debug_handler]
pub async fn list_folders(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let folders = state.services.folder_service.list().await?;
    Ok(Json(folders))
}

/// One folder with its media in display order
#[axum::debug_handler]
pub async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let detail = state
        .services
        .folder_service
        .get(&FolderId::from_string(id))
        .await?;
    Ok(Json(detail))
}

/// The folder's preview item, or `null` when it is empty
#[axum::debug_handler]
pub async fn folder_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let preview = state
        .services
        .folder_service
        .preview(&FolderId::from_string(id))
        .await?;
    Ok(Json(preview))
}

#[axum::debug_handler]
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> AppResult<impl IntoResponse> {
    let folder = state.services.folder_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

#[axum::debug_handler]
pub async fn update_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFolderRequest>,
) -> AppResult<impl IntoResponse> {
    let folder = state
        .services
        .folder_service
        .update(&FolderId::from_string(id), req)
        .await?;
    Ok(Json(folder))
}

#[axum::debug_handler]
pub async fn rename_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> AppResult<impl IntoResponse> {
    let folder = state
        .services
        .folder_service
        .rename(&FolderId::from_string(id), &req.name)
        .await?;
    Ok(Json(json!({
        "message": "Folder renamed successfully",
        "folder": folder,
    })))
}

/// Replace the manual order (`{"mediaOrder": [...]}`)
#[axum::debug_handler]
pub async fn reorder_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReorderFolderRequest>,
) -> AppResult<impl IntoResponse> {
    let folder = state
        .services
        .folder_service
        .reorder(&FolderId::from_string(id), req.media_order)
        .await?;
    Ok(Json(folder))
}

/// Delete the folder together with all of its media
#[axum::debug_handler]
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .services
        .folder_service
        .delete(&FolderId::from_string(id))
        .await?;
    Ok(message("Folder and all its contents deleted successfully"))
}
