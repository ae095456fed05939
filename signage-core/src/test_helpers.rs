//! Fixtures shared by the service and repository tests

use chrono::Utc;

use crate::{
    models::{Media, MediaId, MediaType, Player},
    repository::Repositories,
};

fn media(name: &str, media_type: MediaType, duration: f64) -> Media {
    Media {
        id: MediaId::new(),
        friendly_name: name.to_string(),
        file_name: name.to_string(),
        file_url: format!("/uploads/{name}"),
        media_type,
        duration,
        file_size: 1024,
        width: 1920,
        height: 1080,
        folder_id: None,
        uploaded_at: Utc::now(),
    }
}

/// Unsaved image record served from `/uploads/<name>`
pub fn image_media(name: &str, duration: f64) -> Media {
    media(name, MediaType::Image, duration)
}

/// Unsaved video record served from `/uploads/<name>`
pub fn video_media(name: &str, duration: f64) -> Media {
    media(name, MediaType::Video, duration)
}

/// Register `device_id` and pair it, returning the online player
pub async fn paired_player(repos: &Repositories, device_id: &str) -> Player {
    let now = Utc::now();
    let code = format!("code-{device_id}");
    repos
        .players
        .create_unpaired(&Player::new_unpaired(device_id, &code, now))
        .await
        .unwrap()
        .unwrap();
    repos
        .players
        .confirm_pairing(&code, &format!("Screen {device_id}"), None, now)
        .await
        .unwrap()
        .unwrap()
}
