//! Playlist model (ordered sequence of media with per-item overrides)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{MediaId, PlaylistId};
use super::media::Media;

/// Item duration used when a client omits one
pub const DEFAULT_ITEM_DURATION_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Custom,
}

impl Orientation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "Landscape",
            Self::Portrait => "Portrait",
            Self::Custom => "Custom",
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Landscape" => Ok(Self::Landscape),
            "Portrait" => Ok(Self::Portrait),
            "Custom" => Ok(Self::Custom),
            _ => Err(format!("orientation must be Landscape, Portrait or Custom (got '{s}')")),
        }
    }
}

/// How an item is fitted to the screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Contain,
    Cover,
    Fill,
}

const fn default_item_duration() -> f64 {
    DEFAULT_ITEM_DURATION_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub media: MediaId,
    #[serde(default = "default_item_duration")]
    pub duration: f64,
    #[serde(default)]
    pub display_mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub orientation: Orientation,
    /// Array order is play order
    pub items: Vec<PlaylistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    #[must_use]
    pub fn new(name: String, orientation: Orientation) -> Self {
        let now = Utc::now();
        Self {
            id: PlaylistId::new(),
            name,
            orientation,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A playlist item with its media looked up (None when the media is gone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedItem {
    #[serde(flatten)]
    pub item: PlaylistItem,
    #[serde(rename = "mediaDetails")]
    pub media: Option<Media>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedPlaylist {
    #[serde(flatten)]
    pub playlist: Playlist,
    #[serde(rename = "populatedItems")]
    pub items: Vec<PopulatedItem>,
}

/// Playlist listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    pub orientation: Orientation,
    pub item_count: usize,
    pub total_duration: f64,
    pub total_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub name: String,
    pub orientation: Option<String>,
}

/// Name and/or a wholesale replacement of the items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub orientation: Option<String>,
    pub items: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults() {
        let item: PlaylistItem =
            serde_json::from_value(serde_json::json!({"media": "m1"})).unwrap();
        assert_eq!(item.duration, DEFAULT_ITEM_DURATION_SECS);
        assert_eq!(item.display_mode, DisplayMode::Contain);
    }

    #[test]
    fn test_unknown_display_mode_is_rejected() {
        let parsed = serde_json::from_value::<PlaylistItem>(
            serde_json::json!({"media": "m1", "displayMode": "stretch"}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!("Portrait".parse::<Orientation>(), Ok(Orientation::Portrait));
        assert!("portrait".parse::<Orientation>().is_err());
    }
}
