// Module: http
// REST API for players (heartbeat polling) and the operator console

pub mod devices;
pub mod error;
pub mod folders;
pub mod health;
pub mod logs;
pub mod media;
pub mod players;
pub mod playlists;
pub mod schedules;

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use signage_core::{bootstrap::Services, Config};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub services: Services,
}

/// Uploaded files and where they are served from
#[derive(Clone, Debug)]
pub struct StaticFiles {
    pub upload_dir: PathBuf,
    pub public_path: String,
}

impl StaticFiles {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_dir: PathBuf::from(&config.media.upload_dir),
            public_path: config.media.public_path.trim_end_matches('/').to_string(),
        }
    }
}

/// `{"message": ...}` body used by mutating endpoints
pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if config.cors.allows_any() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the HTTP router with all routes
pub fn create_router(services: Services, config: &Config) -> Router {
    let files = StaticFiles::from_config(config);
    let state = AppState { services };

    let upload = Router::new()
        .route("/api/media/upload", post(media::upload_media))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes));

    let mut router = Router::new()
        .merge(health::create_health_router())
        // Device polling
        .route("/api/devices/heartbeat", post(devices::heartbeat))
        // Players
        .route("/api/players", get(players::list_players))
        .route("/api/players/pair", put(players::pair_player))
        .route(
            "/api/players/{id}",
            get(players::get_player)
                .put(players::update_player)
                .delete(players::delete_player),
        )
        .route("/api/players/{id}/assign", put(players::assign_content))
        // Media library
        .route("/api/media", get(media::list_media))
        .route("/api/media/storage", get(media::storage_usage))
        .route("/api/media/by-folder/{folder_id}", get(media::list_media_by_folder))
        .route("/api/media/{id}", axum::routing::delete(media::delete_media))
        .route("/api/media/{id}/move", put(media::move_media))
        .route("/api/media/{id}/rename", put(media::rename_media))
        .merge(upload)
        // Folders
        .route("/api/folders", get(folders::list_folders).post(folders::create_folder))
        .route(
            "/api/folders/{id}",
            get(folders::get_folder)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route("/api/folders/{id}/preview", get(folders::folder_preview))
        .route("/api/folders/{id}/rename", put(folders::rename_folder))
        .route("/api/folders/{id}/reorder", put(folders::reorder_folder))
        // Playlists
        .route(
            "/api/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/api/playlists/{id}",
            get(playlists::get_playlist)
                .put(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        // Schedules
        .route(
            "/api/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route("/api/schedules/{id}", axum::routing::delete(schedules::delete_schedule))
        // Proof of play
        .route("/api/logs", get(logs::list_logs).post(logs::create_log))
        .with_state(state);

    // Uploaded media files
    if !files.public_path.is_empty() {
        router = router.nest_service(&files.public_path, ServeDir::new(&files.upload_dir));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(config)),
    )
}
