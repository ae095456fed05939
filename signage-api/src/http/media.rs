//! Media library HTTP API
//!
//! Upload is multipart: the file goes in `mediaFile`, optional text fields
//! `friendlyName`, `folder`, `duration`, `width` and `height` describe it.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use signage_core::models::{FolderId, MediaId, MoveMediaRequest, RenameRequest, UploadMediaRequest};

use crate::http::{message, AppError, AppResult, AppState};

/// Multipart field carrying the file itself
pub const FILE_FIELD: &str = "mediaFile";

#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    pub folder: Option<String>,
}

fn folder_param(value: Option<String>) -> Option<FolderId> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "null")
        .map(FolderId::from_string)
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> AppResult<Option<T>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::bad_request(format!("{field} must be a number")))
}

/// List media, optionally only one folder's (`?folder=<id>`)
#[axum::debug_handler]
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> AppResult<impl IntoResponse> {
    let media = state
        .services
        .media_service
        .list(folder_param(query.folder))
        .await?;
    Ok(Json(media))
}

#[axum::debug_handler]
pub async fn list_media_by_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let media = state
        .services
        .media_service
        .list(Some(FolderId::from_string(folder_id)))
        .await?;
    Ok(Json(media))
}

/// Used, total and remaining storage
#[axum::debug_handler]
pub async fn storage_usage(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let usage = state.services.media_service.storage_usage().await?;
    Ok(Json(usage))
}

#[axum::debug_handler]
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<Bytes> = None;
    let mut request = UploadMediaRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                request.original_name = field.file_name().unwrap_or_default().to_string();
                request.content_type = field.content_type().map(str::to_string);
                file = Some(field.bytes().await?);
            }
            "friendlyName" => request.friendly_name = Some(field.text().await?),
            "folder" | "folderId" => request.folder_id = folder_param(Some(field.text().await?)),
            "duration" => request.duration = parse_number("duration", &field.text().await?)?,
            "width" => request.width = parse_number("width", &field.text().await?)?,
            "height" => request.height = parse_number("height", &field.text().await?)?,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown upload field");
            }
        }
    }

    let data = file.ok_or_else(|| AppError::bad_request("No file uploaded"))?;
    let media = state.services.media_service.upload(data, request).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

/// Move into a folder (`{"folder": "<id>"}`) or detach (`{"folder": null}`)
#[axum::debug_handler]
pub async fn move_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveMediaRequest>,
) -> AppResult<impl IntoResponse> {
    let media = state
        .services
        .media_service
        .move_to_folder(&MediaId::from_string(id), folder_param(req.folder))
        .await?;
    Ok(Json(json!({
        "message": "Media file moved successfully",
        "media": media,
    })))
}

#[axum::debug_handler]
pub async fn rename_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> AppResult<impl IntoResponse> {
    let media = state
        .services
        .media_service
        .rename(&MediaId::from_string(id), &req.name)
        .await?;
    Ok(Json(json!({
        "message": "Media file renamed successfully",
        "media": media,
    })))
}

#[axum::debug_handler]
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .services
        .media_service
        .delete(&MediaId::from_string(id))
        .await?;
    Ok(message("Media file deleted successfully"))
}
