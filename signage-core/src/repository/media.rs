use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{FolderId, Media, MediaId},
    Error, Result,
};

/// Media storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Newest first, optionally restricted to one folder
    async fn list(&self, folder: Option<FolderId>) -> Result<Vec<Media>>;

    async fn get(&self, id: &MediaId) -> Result<Option<Media>>;

    /// Fetch the given ids; missing ids are skipped, result order is unspecified
    async fn get_many(&self, ids: Vec<MediaId>) -> Result<Vec<Media>>;

    async fn create(&self, media: &Media) -> Result<Media>;

    async fn rename(&self, id: &MediaId, friendly_name: &str) -> Result<Option<Media>>;

    async fn set_folder(&self, id: &MediaId, folder: Option<FolderId>) -> Result<Option<Media>>;

    /// Delete and return the removed record
    async fn delete(&self, id: &MediaId) -> Result<Option<Media>>;

    async fn delete_by_folder(&self, folder: &FolderId) -> Result<u64>;

    /// Total stored bytes and record count
    async fn totals(&self) -> Result<(u64, u64)>;
}

const MEDIA_COLUMNS: &str = "id, friendly_name, file_name, file_url, media_type, duration, \
                             file_size, width, height, folder_id, uploaded_at";

/// PostgreSQL media repository
#[derive(Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_media(row: &PgRow) -> Result<Media> {
        let media_type: String = row.try_get("media_type")?;
        let folder_id: Option<String> = row.try_get("folder_id")?;

        Ok(Media {
            id: MediaId::from_string(row.try_get("id")?),
            friendly_name: row.try_get("friendly_name")?,
            file_name: row.try_get("file_name")?,
            file_url: row.try_get("file_url")?,
            media_type: media_type.parse().map_err(Error::Internal)?,
            duration: row.try_get("duration")?,
            file_size: row.try_get("file_size")?,
            width: row.try_get("width")?,
            height: row.try_get("height")?,
            folder_id: folder_id.map(FolderId::from_string),
            uploaded_at: row.try_get("uploaded_at")?,
        })
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn list(&self, folder: Option<FolderId>) -> Result<Vec<Media>> {
        let rows = match folder {
            Some(folder) => {
                sqlx::query(&format!(
                    "SELECT {MEDIA_COLUMNS} FROM media
                     WHERE folder_id = $1 ORDER BY uploaded_at DESC"
                ))
                .bind(folder.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {MEDIA_COLUMNS} FROM media ORDER BY uploaded_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::row_to_media).collect()
    }

    async fn get(&self, id: &MediaId) -> Result<Option<Media>> {
        let row = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_media).transpose()
    }

    async fn get_many(&self, ids: Vec<MediaId>) -> Result<Vec<Media>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.into_iter().map(|id| id.0).collect();
        let rows = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_media).collect()
    }

    async fn create(&self, media: &Media) -> Result<Media> {
        let row = sqlx::query(&format!(
            "INSERT INTO media
                 (id, friendly_name, file_name, file_url, media_type, duration, file_size,
                  width, height, folder_id, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(media.id.as_str())
        .bind(&media.friendly_name)
        .bind(&media.file_name)
        .bind(&media.file_url)
        .bind(media.media_type.as_str())
        .bind(media.duration)
        .bind(media.file_size)
        .bind(media.width)
        .bind(media.height)
        .bind(media.folder_id.as_ref().map(FolderId::as_str))
        .bind(media.uploaded_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_media(&row)
    }

    async fn rename(&self, id: &MediaId, friendly_name: &str) -> Result<Option<Media>> {
        let row = sqlx::query(&format!(
            "UPDATE media SET friendly_name = $2 WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(friendly_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_media).transpose()
    }

    async fn set_folder(&self, id: &MediaId, folder: Option<FolderId>) -> Result<Option<Media>> {
        let row = sqlx::query(&format!(
            "UPDATE media SET folder_id = $2 WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(folder.map(|f| f.0))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_media).transpose()
    }

    async fn delete(&self, id: &MediaId) -> Result<Option<Media>> {
        let row = sqlx::query(&format!(
            "DELETE FROM media WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_media).transpose()
    }

    async fn delete_by_folder(&self, folder: &FolderId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM media WHERE folder_id = $1")
            .bind(folder.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn totals(&self) -> Result<(u64, u64)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(file_size), 0)::BIGINT AS used, COUNT(*) AS count FROM media",
        )
        .fetch_one(&self.pool)
        .await?;

        let used: i64 = row.try_get("used")?;
        let count: i64 = row.try_get("count")?;
        Ok((used.max(0).unsigned_abs(), count.max(0).unsigned_abs()))
    }
}
