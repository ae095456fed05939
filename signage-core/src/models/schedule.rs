//! Schedule model (passive record; nothing evaluates it yet)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{PlayerId, PlaylistId, ScheduleId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTargets {
    #[serde(default)]
    pub players: Vec<PlayerId>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub playlist_id: PlaylistId,
    pub assignments: ScheduleTargets,
    pub start_time: DateTime<Utc>,
    /// Absent means the schedule repeats indefinitely
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Schedule listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(default)]
    pub name: String,
    pub playlist: Option<PlaylistId>,
    #[serde(default)]
    pub assignments: ScheduleTargets,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}
