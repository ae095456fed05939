//! Player model (a managed physical display)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{MediaId, PlayerId, PlaylistId};
use super::media::Media;
use super::playlist::PopulatedPlaylist;

/// Player lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// No confirmed operator pairing yet
    Unpaired,
    /// Paired, heartbeat seen within the offline timeout
    Online,
    /// Paired, heartbeat missed
    Offline,
}

impl PlayerStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaired => "unpaired",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl FromStr for PlayerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaired" => Ok(Self::Unpaired),
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(format!("Unknown player status: {s}")),
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen rotation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(format!("Rotation must be one of 0, 90, 180, 270 (got {degrees})")),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Kind of content a player can be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Media,
    Playlist,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Media => "Media",
            Self::Playlist => "Playlist",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Media" => Ok(Self::Media),
            "Playlist" => Ok(Self::Playlist),
            _ => Err(format!("contentType must be 'Media' or 'Playlist' (got '{s}')")),
        }
    }
}

/// What a player should show
///
/// Serialized as `{"contentType": "...", "contentId": "..."}`, with `{}`
/// standing for an empty assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssignedContentWire", into = "AssignedContentWire")]
pub enum AssignedContent {
    #[default]
    None,
    Media(MediaId),
    Playlist(PlaylistId),
}

impl AssignedContent {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Build from the two nullable storage columns.
    ///
    /// Both columns must be set for an assignment; anything else is empty.
    #[must_use]
    pub fn from_parts(content_type: Option<&str>, content_id: Option<String>) -> Self {
        match (content_type.map(ContentType::from_str), content_id) {
            (Some(Ok(ContentType::Media)), Some(id)) => Self::Media(MediaId(id)),
            (Some(Ok(ContentType::Playlist)), Some(id)) => Self::Playlist(PlaylistId(id)),
            _ => Self::None,
        }
    }

    /// Split into the (type, id) storage columns
    #[must_use]
    pub fn to_parts(&self) -> (Option<&'static str>, Option<&str>) {
        match self {
            Self::None => (None, None),
            Self::Media(id) => (Some(ContentType::Media.as_str()), Some(id.as_str())),
            Self::Playlist(id) => (Some(ContentType::Playlist.as_str()), Some(id.as_str())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignedContentWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
}

impl TryFrom<AssignedContentWire> for AssignedContent {
    type Error = String;

    fn try_from(wire: AssignedContentWire) -> Result<Self, Self::Error> {
        match (wire.content_type, wire.content_id) {
            (None, None) => Ok(Self::None),
            (Some(ContentType::Media), Some(id)) => Ok(Self::Media(MediaId(id))),
            (Some(ContentType::Playlist), Some(id)) => Ok(Self::Playlist(PlaylistId(id))),
            _ => Err("contentType and contentId must be given together".to_string()),
        }
    }
}

impl From<AssignedContent> for AssignedContentWire {
    fn from(content: AssignedContent) -> Self {
        match content {
            AssignedContent::None => Self::default(),
            AssignedContent::Media(id) => Self {
                content_type: Some(ContentType::Media),
                content_id: Some(id.0),
            },
            AssignedContent::Playlist(id) => Self {
                content_type: Some(ContentType::Playlist),
                content_id: Some(id.0),
            },
        }
    }
}

/// A managed display device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Stable, device-assigned identifier
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub status: PlayerStatus,
    /// Present only while unpaired and mid-pairing
    pub pairing_code: Option<String>,
    pub last_heartbeat: DateTime<Utc>,
    pub assigned_content: AssignedContent,
    pub rotation: Rotation,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// A fresh record for a device that just started pairing
    #[must_use]
    pub fn new_unpaired(device_id: &str, pairing_code: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: PlayerId::new(),
            device_id: device_id.to_string(),
            name: String::new(),
            location: String::new(),
            status: PlayerStatus::Unpaired,
            pairing_code: Some(pairing_code.to_string()),
            last_heartbeat: now,
            assigned_content: AssignedContent::None,
            rotation: Rotation::Deg0,
            created_at: now,
        }
    }
}

/// Assignment target loaded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentDetails {
    Media(Media),
    Playlist(PopulatedPlaylist),
}

/// A player with its assigned content populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub player: Player,
    /// `None` when nothing is assigned or the target is gone
    pub content_details: Option<ContentDetails>,
}

/// Operator confirmation of a pairing code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairPlayerRequest {
    #[serde(default)]
    pub pairing_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Operator edit of a paired player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    pub name: Option<String>,
    /// Degrees; validated against [`Rotation`]
    pub rotation: Option<i32>,
}

/// Operator (re)assignment; both fields absent clears the assignment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignContentRequest {
    pub content_type: Option<String>,
    pub content_id: Option<String>,
}
