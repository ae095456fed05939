use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{PlayerId, PlaylistId, Schedule, ScheduleId, ScheduleTargets},
    Result,
};

/// Schedule storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Ordered by start time
    async fn list(&self) -> Result<Vec<Schedule>>;

    async fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>>;

    async fn create(&self, schedule: &Schedule) -> Result<Schedule>;

    async fn delete(&self, id: &ScheduleId) -> Result<bool>;
}

const SCHEDULE_COLUMNS: &str =
    "id, name, playlist_id, player_ids, group_ids, start_time, end_time, created_at";

#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_schedule(row: &PgRow) -> Result<Schedule> {
        let player_ids: Vec<String> = row.try_get("player_ids")?;

        Ok(Schedule {
            id: ScheduleId::from_string(row.try_get("id")?),
            name: row.try_get("name")?,
            playlist_id: PlaylistId::from_string(row.try_get("playlist_id")?),
            assignments: ScheduleTargets {
                players: player_ids.into_iter().map(PlayerId::from_string).collect(),
                groups: row.try_get("group_ids")?,
            },
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn list(&self) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY start_time ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_schedule).collect()
    }

    async fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>> {
        let row = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_schedule).transpose()
    }

    async fn create(&self, schedule: &Schedule) -> Result<Schedule> {
        let player_ids: Vec<String> = schedule
            .assignments
            .players
            .iter()
            .map(|id| id.0.clone())
            .collect();

        let row = sqlx::query(&format!(
            "INSERT INTO schedules
                 (id, name, playlist_id, player_ids, group_ids, start_time, end_time, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(schedule.id.as_str())
        .bind(&schedule.name)
        .bind(schedule.playlist_id.as_str())
        .bind(&player_ids)
        .bind(&schedule.assignments.groups)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_schedule(&row)
    }

    async fn delete(&self, id: &ScheduleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
