//! Proof-of-play log entries (append-only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MediaId, PlayLogId, PlayerId, PlaylistId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOfPlayLog {
    pub id: PlayLogId,
    pub player_id: PlayerId,
    pub media_id: MediaId,
    pub playlist_id: PlaylistId,
    pub played_at: DateTime<Utc>,
    /// Seconds
    pub duration_played: f64,
}

/// Listing entry with display names of the referenced records, where they still exist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayLogEntry {
    #[serde(flatten)]
    pub log: ProofOfPlayLog,
    pub player_name: Option<String>,
    pub media_name: Option<String>,
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayLogRequest {
    pub player: Option<PlayerId>,
    pub media: Option<MediaId>,
    pub playlist: Option<PlaylistId>,
    pub duration_played: Option<f64>,
    pub played_at: Option<DateTime<Utc>>,
}
