use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{FolderId, MediaId};

/// Kind of media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Classify by mime type; anything that is not an image plays as video
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image") {
            Self::Image
        } else {
            Self::Video
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Unknown media type: {s}")),
        }
    }
}

/// An uploaded image or video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    pub friendly_name: String,
    /// Name of the stored file inside the upload directory
    pub file_name: String,
    /// Relative (locally hosted) or absolute URL
    pub file_url: String,
    pub media_type: MediaType,
    /// Seconds; 0 on a video means "play full length"
    pub duration: f64,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub folder_id: Option<FolderId>,
    pub uploaded_at: DateTime<Utc>,
}

/// Metadata accompanying an upload
#[derive(Debug, Clone, Default)]
pub struct UploadMediaRequest {
    pub original_name: String,
    /// Content type declared by the client, if any
    pub content_type: Option<String>,
    pub friendly_name: Option<String>,
    pub folder_id: Option<FolderId>,
    pub duration: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMediaRequest {
    /// Target folder, or null to detach
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(default)]
    pub name: String,
}

/// Storage consumption against the configured cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    pub available_bytes: u64,
    pub media_count: u64,
}

impl StorageUsage {
    #[must_use]
    pub const fn new(used_bytes: u64, capacity_bytes: u64, media_count: u64) -> Self {
        Self {
            used_bytes,
            capacity_bytes,
            available_bytes: capacity_bytes.saturating_sub(used_bytes),
            media_count,
        }
    }

    #[must_use]
    pub const fn can_fit(&self, bytes: u64) -> bool {
        bytes <= self.available_bytes
    }
}
