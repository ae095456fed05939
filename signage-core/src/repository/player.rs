use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{AssignedContent, Player, PlayerId, Rotation},
    Error, Result,
};

/// Player storage.
///
/// Every state-changing method is a single conditional write: it only
/// applies while the record is still in the expected state and returns
/// `None` when it did not match.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Player>>;

    async fn get(&self, id: &PlayerId) -> Result<Option<Player>>;

    async fn get_by_device(&self, device_id: &str) -> Result<Option<Player>>;

    /// Insert an unpaired player unless one already exists for the device
    async fn create_unpaired(&self, player: &Player) -> Result<Option<Player>>;

    /// Store a new pairing code, only while the player is still unpaired
    async fn refresh_pairing(
        &self,
        device_id: &str,
        pairing_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>>;

    /// Set online, refresh the heartbeat and drop any pending pairing code
    async fn mark_online(&self, device_id: &str, now: DateTime<Utc>) -> Result<Option<Player>>;

    /// Match an unpaired player by code, name it, set it online and clear the code
    async fn confirm_pairing(
        &self,
        pairing_code: &str,
        name: &str,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>>;

    /// Demote every online player whose last heartbeat is older than `cutoff`
    async fn mark_offline_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn update(
        &self,
        id: &PlayerId,
        name: Option<String>,
        rotation: Option<Rotation>,
    ) -> Result<Option<Player>>;

    async fn set_assignment(
        &self,
        id: &PlayerId,
        content: &AssignedContent,
    ) -> Result<Option<Player>>;

    /// Empty the assignment of every player pointing at `target`
    async fn clear_assignments_to(&self, target: &AssignedContent) -> Result<u64>;

    async fn delete(&self, id: &PlayerId) -> Result<bool>;
}

const PLAYER_COLUMNS: &str = "id, device_id, name, location, status, pairing_code, last_heartbeat, \
                              content_type, content_id, rotation, created_at";

/// PostgreSQL player repository
#[derive(Clone)]
pub struct PgPlayerRepository {
    pool: PgPool,
}

impl PgPlayerRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_player(row: &PgRow) -> Result<Player> {
        let status: String = row.try_get("status")?;
        let rotation: i32 = row.try_get("rotation")?;
        let content_type: Option<String> = row.try_get("content_type")?;

        Ok(Player {
            id: PlayerId::from_string(row.try_get("id")?),
            device_id: row.try_get("device_id")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            status: status.parse().map_err(Error::Internal)?,
            pairing_code: row.try_get("pairing_code")?,
            last_heartbeat: row.try_get("last_heartbeat")?,
            assigned_content: AssignedContent::from_parts(
                content_type.as_deref(),
                row.try_get("content_id")?,
            ),
            rotation: Rotation::try_from(rotation).map_err(Error::Internal)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn optional(row: Option<PgRow>) -> Result<Option<Player>> {
        row.as_ref().map(Self::row_to_player).transpose()
    }
}

#[async_trait]
impl PlayerRepository for PgPlayerRepository {
    async fn list(&self) -> Result<Vec<Player>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_player).collect()
    }

    async fn get(&self, id: &PlayerId) -> Result<Option<Player>> {
        let row = sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Self::optional(row)
    }

    async fn get_by_device(&self, device_id: &str) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE device_id = $1"
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn create_unpaired(&self, player: &Player) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "INSERT INTO players
                 (id, device_id, name, location, status, pairing_code, last_heartbeat,
                  rotation, created_at)
             VALUES ($1, $2, $3, $4, 'unpaired', $5, $6, $7, $8)
             ON CONFLICT (device_id) DO NOTHING
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(player.id.as_str())
        .bind(&player.device_id)
        .bind(&player.name)
        .bind(&player.location)
        .bind(&player.pairing_code)
        .bind(player.last_heartbeat)
        .bind(i32::from(player.rotation))
        .bind(player.created_at)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn refresh_pairing(
        &self,
        device_id: &str,
        pairing_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "UPDATE players SET pairing_code = $2, last_heartbeat = $3
             WHERE device_id = $1 AND status = 'unpaired'
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(device_id)
        .bind(pairing_code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn mark_online(&self, device_id: &str, now: DateTime<Utc>) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "UPDATE players SET status = 'online', last_heartbeat = $2, pairing_code = NULL
             WHERE device_id = $1 AND status IN ('unpaired', 'online', 'offline')
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(device_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn confirm_pairing(
        &self,
        pairing_code: &str,
        name: &str,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "UPDATE players
             SET name = $2, location = COALESCE($3, location), status = 'online',
                 pairing_code = NULL, last_heartbeat = $4
             WHERE pairing_code = $1 AND status = 'unpaired'
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(pairing_code)
        .bind(name)
        .bind(location)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn mark_offline_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE players SET status = 'offline'
             WHERE status = 'online' AND last_heartbeat < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update(
        &self,
        id: &PlayerId,
        name: Option<String>,
        rotation: Option<Rotation>,
    ) -> Result<Option<Player>> {
        let row = sqlx::query(&format!(
            "UPDATE players SET name = COALESCE($2, name), rotation = COALESCE($3, rotation)
             WHERE id = $1
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(name)
        .bind(rotation.map(i32::from))
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn set_assignment(
        &self,
        id: &PlayerId,
        content: &AssignedContent,
    ) -> Result<Option<Player>> {
        let (content_type, content_id) = content.to_parts();
        let row = sqlx::query(&format!(
            "UPDATE players SET content_type = $2, content_id = $3
             WHERE id = $1
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(content_type)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Self::optional(row)
    }

    async fn clear_assignments_to(&self, target: &AssignedContent) -> Result<u64> {
        let (Some(content_type), Some(content_id)) = target.to_parts() else {
            return Ok(0);
        };

        let result = sqlx::query(
            "UPDATE players SET content_type = NULL, content_id = NULL
             WHERE content_type = $1 AND content_id = $2",
        )
        .bind(content_type)
        .bind(content_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &PlayerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
