use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{MediaId, PlayLogId, PlayerId, PlaylistId, ProofOfPlayLog},
    Result,
};

/// Append-only proof-of-play feed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayLogRepository: Send + Sync {
    async fn append(&self, log: &ProofOfPlayLog) -> Result<ProofOfPlayLog>;

    /// Newest `played_at` first
    async fn list(&self, limit: i64) -> Result<Vec<ProofOfPlayLog>>;
}

const PLAY_LOG_COLUMNS: &str =
    "id, player_id, media_id, playlist_id, played_at, duration_played";

#[derive(Clone)]
pub struct PgPlayLogRepository {
    pool: PgPool,
}

impl PgPlayLogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_log(row: &PgRow) -> Result<ProofOfPlayLog> {
        Ok(ProofOfPlayLog {
            id: PlayLogId::from_string(row.try_get("id")?),
            player_id: PlayerId::from_string(row.try_get("player_id")?),
            media_id: MediaId::from_string(row.try_get("media_id")?),
            playlist_id: PlaylistId::from_string(row.try_get("playlist_id")?),
            played_at: row.try_get("played_at")?,
            duration_played: row.try_get("duration_played")?,
        })
    }
}

#[async_trait]
impl PlayLogRepository for PgPlayLogRepository {
    async fn append(&self, log: &ProofOfPlayLog) -> Result<ProofOfPlayLog> {
        let row = sqlx::query(&format!(
            "INSERT INTO proof_of_play_logs
                 (id, player_id, media_id, playlist_id, played_at, duration_played)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PLAY_LOG_COLUMNS}"
        ))
        .bind(log.id.as_str())
        .bind(log.player_id.as_str())
        .bind(log.media_id.as_str())
        .bind(log.playlist_id.as_str())
        .bind(log.played_at)
        .bind(log.duration_played)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_log(&row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<ProofOfPlayLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAY_LOG_COLUMNS} FROM proof_of_play_logs ORDER BY played_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_log).collect()
    }
}
