//! Device polling protocol: heartbeat request/response and the playback manifest

use serde::{Deserialize, Serialize};

use super::media::{Media, MediaType};
use super::playlist::{DisplayMode, Orientation, Playlist};

/// One entry of a playback manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    /// Seconds; always 0 for video (play full length)
    pub duration: f64,
    pub display_mode: DisplayMode,
}

/// Device-ready playback description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub orientation: Orientation,
    pub items: Vec<ManifestItem>,
}

/// Assignment target with everything it references already loaded.
///
/// Playlist items pair with `None` when their media no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedContent {
    Media(Media),
    Playlist {
        playlist: Playlist,
        media: Vec<Option<Media>>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub pairing_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    Unpaired,
    PairedWaiting,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: HeartbeatStatus,
    pub playlist: Option<Manifest>,
}

impl HeartbeatResponse {
    #[must_use]
    pub const fn unpaired() -> Self {
        Self {
            status: HeartbeatStatus::Unpaired,
            playlist: None,
        }
    }

    #[must_use]
    pub const fn paired_waiting() -> Self {
        Self {
            status: HeartbeatStatus::PairedWaiting,
            playlist: None,
        }
    }

    #[must_use]
    pub const fn playing(manifest: Manifest) -> Self {
        Self {
            status: HeartbeatStatus::Playing,
            playlist: Some(manifest),
        }
    }

    /// `playing` when a manifest resolved, else `paired_waiting`
    #[must_use]
    pub fn from_manifest(manifest: Option<Manifest>) -> Self {
        manifest.map_or_else(Self::paired_waiting, Self::playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_response_shape() {
        let json = serde_json::to_value(HeartbeatResponse::paired_waiting()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "paired_waiting", "playlist": null}));
    }

    #[test]
    fn test_manifest_item_shape() {
        let manifest = Manifest {
            orientation: Orientation::Portrait,
            items: vec![ManifestItem {
                media_type: MediaType::Video,
                url: "http://cdn/a.mp4".to_string(),
                duration: 0.0,
                display_mode: DisplayMode::Cover,
            }],
        };
        let json = serde_json::to_value(HeartbeatResponse::playing(manifest)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "playing",
                "playlist": {
                    "orientation": "Portrait",
                    "items": [{"type": "video", "url": "http://cdn/a.mp4", "duration": 0.0, "displayMode": "cover"}]
                }
            })
        );
    }
}
