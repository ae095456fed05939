use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{Orientation, Playlist, PlaylistId, PlaylistItem},
    Error, Result,
};

/// Changes applied by [`PlaylistRepository::update`]; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistChanges {
    pub name: Option<String>,
    pub orientation: Option<Orientation>,
    /// Replaces the whole item list
    pub items: Option<Vec<PlaylistItem>>,
}

/// Playlist storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Newest first
    async fn list(&self) -> Result<Vec<Playlist>>;

    async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Fails with `AlreadyExists` when the name is taken
    async fn create(&self, playlist: &Playlist) -> Result<Playlist>;

    /// Fails with `AlreadyExists` when renaming onto a taken name
    async fn update(&self, id: &PlaylistId, changes: PlaylistChanges) -> Result<Option<Playlist>>;

    async fn delete(&self, id: &PlaylistId) -> Result<bool>;
}

const PLAYLIST_COLUMNS: &str = "id, name, orientation, items, created_at, updated_at";

/// PostgreSQL playlist repository; items are kept as a JSONB array
#[derive(Clone)]
pub struct PgPlaylistRepository {
    pool: PgPool,
}

impl PgPlaylistRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_playlist(row: &PgRow) -> Result<Playlist> {
        let orientation: String = row.try_get("orientation")?;
        let items: JsonValue = row.try_get("items")?;

        Ok(Playlist {
            id: PlaylistId::from_string(row.try_get("id")?),
            name: row.try_get("name")?,
            orientation: orientation.parse().map_err(Error::Internal)?,
            items: serde_json::from_value(items)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl PlaylistRepository for PgPlaylistRepository {
    async fn list(&self) -> Result<Vec<Playlist>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_playlist).collect()
    }

    async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_playlist).transpose()
    }

    async fn create(&self, playlist: &Playlist) -> Result<Playlist> {
        let items = serde_json::to_value(&playlist.items)?;
        let row = sqlx::query(&format!(
            "INSERT INTO playlists (id, name, orientation, items, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(playlist.id.as_str())
        .bind(&playlist.name)
        .bind(playlist.orientation.as_str())
        .bind(&items)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_playlist(&row)
    }

    async fn update(&self, id: &PlaylistId, changes: PlaylistChanges) -> Result<Option<Playlist>> {
        let items = changes.items.as_ref().map(serde_json::to_value).transpose()?;
        let row = sqlx::query(&format!(
            "UPDATE playlists
             SET name = COALESCE($2, name),
                 orientation = COALESCE($3, orientation),
                 items = COALESCE($4, items),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PLAYLIST_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(changes.name)
        .bind(changes.orientation.map(|o| o.as_str()))
        .bind(items)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_playlist).transpose()
    }

    async fn delete(&self, id: &PlaylistId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
