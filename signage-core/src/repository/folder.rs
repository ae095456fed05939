use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{Folder, FolderId, MediaId},
    Result,
};

/// Folder storage, including the manual `media_order` list
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Newest first
    async fn list(&self) -> Result<Vec<Folder>>;

    async fn get(&self, id: &FolderId) -> Result<Option<Folder>>;

    /// Case-insensitive exact name match
    async fn find_by_name(&self, name: &str) -> Result<Option<Folder>>;

    /// Fails with `AlreadyExists` when the name is taken case-insensitively
    async fn create(&self, folder: &Folder) -> Result<Folder>;

    async fn update(
        &self,
        id: &FolderId,
        name: &str,
        description: Option<String>,
    ) -> Result<Option<Folder>>;

    async fn remove_from_order(&self, id: &FolderId, media: &MediaId) -> Result<bool>;

    /// Append to the end of the order, dropping any earlier occurrence
    async fn append_to_order(&self, id: &FolderId, media: &MediaId) -> Result<bool>;

    async fn set_order(&self, id: &FolderId, order: Vec<MediaId>) -> Result<Option<Folder>>;

    async fn delete(&self, id: &FolderId) -> Result<bool>;
}

const FOLDER_COLUMNS: &str = "id, name, description, media_order, created_at, updated_at";

/// PostgreSQL folder repository
#[derive(Clone)]
pub struct PgFolderRepository {
    pool: PgPool,
}

impl PgFolderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_folder(row: &PgRow) -> Result<Folder> {
        let media_order: Vec<String> = row.try_get("media_order")?;

        Ok(Folder {
            id: FolderId::from_string(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            media_order: media_order.into_iter().map(MediaId::from_string).collect(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn list(&self) -> Result<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_folder).collect()
    }

    async fn get(&self, id: &FolderId) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_folder).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE lower(name) = lower($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_folder).transpose()
    }

    async fn create(&self, folder: &Folder) -> Result<Folder> {
        let order: Vec<String> = folder.media_order.iter().map(|id| id.0.clone()).collect();
        let row = sqlx::query(&format!(
            "INSERT INTO folders (id, name, description, media_order, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(folder.id.as_str())
        .bind(&folder.name)
        .bind(&folder.description)
        .bind(&order)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_folder(&row)
    }

    async fn update(
        &self,
        id: &FolderId,
        name: &str,
        description: Option<String>,
    ) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!(
            "UPDATE folders
             SET name = $2, description = COALESCE($3, description), updated_at = NOW()
             WHERE id = $1
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_folder).transpose()
    }

    async fn remove_from_order(&self, id: &FolderId, media: &MediaId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE folders SET media_order = array_remove(media_order, $2), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(media.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_to_order(&self, id: &FolderId, media: &MediaId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE folders
             SET media_order = array_append(array_remove(media_order, $2), $2), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(media.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_order(&self, id: &FolderId, order: Vec<MediaId>) -> Result<Option<Folder>> {
        let order: Vec<String> = order.into_iter().map(|id| id.0).collect();
        let row = sqlx::query(&format!(
            "UPDATE folders SET media_order = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(&order)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_folder).transpose()
    }

    async fn delete(&self, id: &FolderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
