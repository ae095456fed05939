//! Proof-of-play: append-only record of what a player actually showed

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::{
    models::{CreatePlayLogRequest, PlayLogEntry, PlayLogId, ProofOfPlayLog},
    repository::Repositories,
    Error, Result,
};

/// Most entries returned by one listing
pub const MAX_LISTED_LOGS: i64 = 500;

#[derive(Clone)]
pub struct PlayLogService {
    repos: Repositories,
}

impl std::fmt::Debug for PlayLogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayLogService").finish()
    }
}

impl PlayLogService {
    #[must_use]
    pub const fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn record(&self, request: CreatePlayLogRequest) -> Result<ProofOfPlayLog> {
        let (Some(player_id), Some(media_id), Some(playlist_id)) =
            (request.player, request.media, request.playlist)
        else {
            return Err(Error::InvalidInput(
                "player, media and playlist are required".to_string(),
            ));
        };
        let duration_played = request.duration_played.unwrap_or(0.0);
        if !duration_played.is_finite() || duration_played < 0.0 {
            return Err(Error::InvalidInput(
                "durationPlayed must be a non-negative number".to_string(),
            ));
        }

        self.repos
            .play_logs
            .append(&ProofOfPlayLog {
                id: PlayLogId::new(),
                player_id,
                media_id,
                playlist_id,
                played_at: request.played_at.unwrap_or_else(Utc::now),
                duration_played,
            })
            .await
    }

    /// Newest entries first, with names of the records that still exist
    pub async fn list(&self) -> Result<Vec<PlayLogEntry>> {
        let logs = self.repos.play_logs.list(MAX_LISTED_LOGS).await?;

        let players: HashMap<_, _> = self
            .repos
            .players
            .list()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let playlists: HashMap<_, _> = self
            .repos
            .playlists
            .list()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let media_ids: HashSet<_> = logs.iter().map(|l| l.media_id.clone()).collect();
        let media: HashMap<_, _> = self
            .repos
            .media
            .get_many(media_ids.into_iter().collect())
            .await?
            .into_iter()
            .map(|m| (m.id, m.friendly_name))
            .collect();

        Ok(logs
            .into_iter()
            .map(|log| PlayLogEntry {
                player_name: players.get(&log.player_id).cloned(),
                media_name: media.get(&log.media_id).cloned(),
                playlist_name: playlists.get(&log.playlist_id).cloned(),
                log,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaId, PlayerId, PlaylistId};
    use crate::test_helpers::{image_media, paired_player};
    use chrono::Duration;

    fn request(player: &PlayerId, media: &MediaId) -> CreatePlayLogRequest {
        CreatePlayLogRequest {
            player: Some(player.clone()),
            media: Some(media.clone()),
            playlist: Some(PlaylistId::from("deleted-playlist")),
            duration_played: Some(12.5),
            played_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_requires_references() {
        let svc = PlayLogService::new(Repositories::memory());

        let err = svc.record(CreatePlayLogRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let negative = CreatePlayLogRequest {
            duration_played: Some(-1.0),
            ..request(&PlayerId::from("p"), &MediaId::from("m"))
        };
        assert!(matches!(svc.record(negative).await.unwrap_err(), Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_names() {
        let repos = Repositories::memory();
        let svc = PlayLogService::new(repos.clone());
        let player = paired_player(&repos, "D1").await;
        let media = repos.media.create(&image_media("a.png", 5.0)).await.unwrap();

        let older = svc
            .record(CreatePlayLogRequest {
                played_at: Some(Utc::now() - Duration::minutes(5)),
                ..request(&player.id, &media.id)
            })
            .await
            .unwrap();
        let newer = svc.record(request(&player.id, &media.id)).await.unwrap();

        let entries = svc.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].log.id, newer.id);
        assert_eq!(entries[1].log.id, older.id);
        assert_eq!(entries[0].player_name.as_deref(), Some(player.name.as_str()));
        assert_eq!(entries[0].media_name.as_deref(), Some("a.png"));
        assert!(entries[0].playlist_name.is_none());
    }
}
