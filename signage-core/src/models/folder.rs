//! Folder model (named grouping of media with a manual order)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{FolderId, MediaId};
use super::media::Media;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub description: String,
    /// Manual ordering of the media this folder owns
    pub media_order: Vec<MediaId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    #[must_use]
    pub fn new(name: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            name,
            description,
            media_order: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregates over the media a folder owns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderStats {
    pub items_count: u64,
    pub total_size: i64,
    pub total_duration: f64,
}

impl FolderStats {
    #[must_use]
    pub fn from_media<'a>(media: impl IntoIterator<Item = &'a Media>) -> Self {
        media.into_iter().fold(Self::default(), |mut stats, m| {
            stats.items_count += 1;
            stats.total_size += m.file_size;
            stats.total_duration += m.duration;
            stats
        })
    }
}

/// Folder listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    #[serde(flatten)]
    pub folder: Folder,
    pub preview_item: Option<Media>,
    #[serde(flatten)]
    pub stats: FolderStats,
}

/// Folder with its media in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDetail {
    pub folder_details: Folder,
    pub media_files: Vec<Media>,
    pub total_size: i64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFolderRequest {
    pub media_order: Option<Vec<MediaId>>,
}
