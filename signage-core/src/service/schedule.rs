//! Schedules are stored and listed only; nothing evaluates them at play time.

use std::collections::HashMap;

use chrono::Utc;

use crate::{
    models::{CreateScheduleRequest, PlaylistId, Schedule, ScheduleId, ScheduleSummary},
    repository::Repositories,
    Error, Result,
};

#[derive(Clone)]
pub struct ScheduleService {
    repos: Repositories,
}

impl std::fmt::Debug for ScheduleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleService").finish()
    }
}

impl ScheduleService {
    #[must_use]
    pub const fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Schedules by start time, each with its playlist's name if it still exists
    pub async fn list(&self) -> Result<Vec<ScheduleSummary>> {
        let schedules = self.repos.schedules.list().await?;
        let names: HashMap<PlaylistId, String> = self
            .repos
            .playlists
            .list()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        Ok(schedules
            .into_iter()
            .map(|schedule| ScheduleSummary {
                playlist_name: names.get(&schedule.playlist_id).cloned(),
                schedule,
            })
            .collect())
    }

    pub async fn create(&self, request: CreateScheduleRequest) -> Result<Schedule> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name is required".to_string()));
        }
        let playlist_id = request
            .playlist
            .ok_or_else(|| Error::InvalidInput("playlist is required".to_string()))?;
        let start_time = request
            .start_time
            .ok_or_else(|| Error::InvalidInput("startTime is required".to_string()))?;
        if request.end_time.is_some_and(|end| end < start_time) {
            return Err(Error::InvalidInput(
                "endTime must not be before startTime".to_string(),
            ));
        }
        if self.repos.playlists.get(&playlist_id).await?.is_none() {
            return Err(Error::NotFound("Playlist not found".to_string()));
        }

        let schedule = self
            .repos
            .schedules
            .create(&Schedule {
                id: ScheduleId::new(),
                name: name.to_string(),
                playlist_id,
                assignments: request.assignments,
                start_time,
                end_time: request.end_time,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            schedule_id = %schedule.id,
            playlist_id = %schedule.playlist_id,
            "Schedule created"
        );
        Ok(schedule)
    }

    pub async fn delete(&self, id: &ScheduleId) -> Result<()> {
        if !self.repos.schedules.delete(id).await? {
            return Err(Error::NotFound("Schedule not found".to_string()));
        }
        tracing::info!(schedule_id = %id, "Schedule deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Orientation, Playlist, ScheduleTargets};
    use chrono::Duration;

    async fn playlist(repos: &Repositories, name: &str) -> Playlist {
        repos
            .playlists
            .create(&Playlist::new(name.to_string(), Orientation::Landscape))
            .await
            .unwrap()
    }

    fn request(playlist: &PlaylistId) -> CreateScheduleRequest {
        CreateScheduleRequest {
            name: "Mornings".into(),
            playlist: Some(playlist.clone()),
            assignments: ScheduleTargets {
                players: vec!["p1".into()],
                groups: vec!["lobby".into()],
            },
            start_time: Some(Utc::now()),
            end_time: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_with_playlist_name() {
        let repos = Repositories::memory();
        let svc = ScheduleService::new(repos.clone());
        let lobby = playlist(&repos, "Lobby").await;

        let created = svc.create(request(&lobby.id)).await.unwrap();
        assert_eq!(created.assignments.groups, vec!["lobby".to_string()]);

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].playlist_name.as_deref(), Some("Lobby"));

        // Deleting the playlist leaves the schedule in place without a name
        repos.playlists.delete(&lobby.id).await.unwrap();
        let listed = svc.list().await.unwrap();
        assert_eq!(listed[0].schedule.id, created.id);
        assert!(listed[0].playlist_name.is_none());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let repos = Repositories::memory();
        let svc = ScheduleService::new(repos.clone());
        let lobby = playlist(&repos, "Lobby").await;

        let no_playlist = CreateScheduleRequest { playlist: None, ..request(&lobby.id) };
        assert!(matches!(svc.create(no_playlist).await.unwrap_err(), Error::InvalidInput(_)));

        let no_start = CreateScheduleRequest { start_time: None, ..request(&lobby.id) };
        assert!(matches!(svc.create(no_start).await.unwrap_err(), Error::InvalidInput(_)));

        let base = request(&lobby.id);
        let inverted = CreateScheduleRequest {
            end_time: base.start_time.map(|s| s - Duration::hours(1)),
            ..base
        };
        assert!(matches!(svc.create(inverted).await.unwrap_err(), Error::InvalidInput(_)));

        let missing = request(&PlaylistId::from("missing"));
        assert!(matches!(svc.create(missing).await.unwrap_err(), Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repos = Repositories::memory();
        let svc = ScheduleService::new(repos.clone());
        let lobby = playlist(&repos, "Lobby").await;
        let created = svc.create(request(&lobby.id)).await.unwrap();

        svc.delete(&created.id).await.unwrap();
        assert!(svc.list().await.unwrap().is_empty());
        assert!(matches!(svc.delete(&created.id).await.unwrap_err(), Error::NotFound(_)));
    }
}
