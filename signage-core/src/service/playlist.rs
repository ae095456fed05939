//! Playlist management service
//!
//! Item order is play order; updates replace the item list wholesale.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::{
    models::{
        AssignedContent, CreatePlaylistRequest, Media, MediaId, Orientation, Playlist,
        PlaylistId, PlaylistItem, PlaylistSummary, PopulatedItem, PopulatedPlaylist,
        UpdatePlaylistRequest,
    },
    repository::{PlaylistChanges, Repositories},
    Error, Result,
};

/// Look up every item's media; missing media stays `None`
pub(crate) async fn populate(
    repos: &Repositories,
    playlist: Playlist,
) -> Result<PopulatedPlaylist> {
    let ids = playlist.items.iter().map(|item| item.media.clone()).collect();
    let media = index_by_id(repos.media.get_many(ids).await?);

    let items = playlist
        .items
        .iter()
        .map(|item| PopulatedItem {
            item: item.clone(),
            media: media.get(&item.media).cloned(),
        })
        .collect();

    Ok(PopulatedPlaylist { playlist, items })
}

fn index_by_id(media: Vec<Media>) -> HashMap<MediaId, Media> {
    media.into_iter().map(|m| (m.id.clone(), m)).collect()
}

fn parse_orientation(value: &str) -> Result<Orientation> {
    value.trim().parse().map_err(Error::InvalidInput)
}

/// Validate a wholesale item replacement
fn parse_items(value: JsonValue) -> Result<Vec<PlaylistItem>> {
    if !value.is_array() {
        return Err(Error::InvalidInput("items must be an array".to_string()));
    }
    let items: Vec<PlaylistItem> = serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(format!("Invalid playlist item: {e}")))?;

    if let Some(bad) = items.iter().find(|item| item.duration < 0.0) {
        return Err(Error::InvalidInput(format!(
            "Item duration must be a non-negative number (media {})",
            bad.media
        )));
    }
    Ok(items)
}

#[derive(Clone)]
pub struct PlaylistService {
    repos: Repositories,
}

impl std::fmt::Debug for PlaylistService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistService").finish()
    }
}

impl PlaylistService {
    #[must_use]
    pub const fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// All playlists with item count, total duration and total size
    pub async fn list(&self) -> Result<Vec<PlaylistSummary>> {
        let playlists = self.repos.playlists.list().await?;
        let ids = playlists
            .iter()
            .flat_map(|p| p.items.iter().map(|item| item.media.clone()))
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        let media = index_by_id(self.repos.media.get_many(ids).await?);

        Ok(playlists
            .into_iter()
            .map(|playlist| {
                let total_duration = playlist.items.iter().map(|item| item.duration).sum();
                let total_size = playlist
                    .items
                    .iter()
                    .filter_map(|item| media.get(&item.media))
                    .map(|m| m.file_size)
                    .sum();
                PlaylistSummary {
                    item_count: playlist.items.len(),
                    total_duration,
                    total_size,
                    id: playlist.id,
                    name: playlist.name,
                    orientation: playlist.orientation,
                    created_at: playlist.created_at,
                    updated_at: playlist.updated_at,
                }
            })
            .collect())
    }

    pub async fn get(&self, id: &PlaylistId) -> Result<PopulatedPlaylist> {
        let playlist = self
            .repos
            .playlists
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Playlist not found".to_string()))?;
        populate(&self.repos, playlist).await
    }

    pub async fn create(&self, request: CreatePlaylistRequest) -> Result<Playlist> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name is required".to_string()));
        }
        let orientation = request
            .orientation
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("orientation is required".to_string()))
            .and_then(parse_orientation)?;

        let playlist = self
            .repos
            .playlists
            .create(&Playlist::new(name.to_string(), orientation))
            .await?;

        tracing::info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
        Ok(playlist)
    }

    /// Rename and/or replace the whole item list
    pub async fn update(
        &self,
        id: &PlaylistId,
        request: UpdatePlaylistRequest,
    ) -> Result<Playlist> {
        let name = match request.name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::InvalidInput("name must not be empty".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let changes = PlaylistChanges {
            name,
            orientation: request.orientation.as_deref().map(parse_orientation).transpose()?,
            items: request.items.map(parse_items).transpose()?,
        };

        self.repos
            .playlists
            .update(id, changes)
            .await?
            .ok_or_else(|| Error::NotFound("Playlist not found".to_string()))
    }

    /// Delete the playlist, then clear every player assignment pointing at it.
    ///
    /// Schedules that reference it are left in place.
    pub async fn delete(&self, id: &PlaylistId) -> Result<()> {
        if !self.repos.playlists.delete(id).await? {
            return Err(Error::NotFound("Playlist not found".to_string()));
        }

        let cleared = self
            .repos
            .players
            .clear_assignments_to(&AssignedContent::Playlist(id.clone()))
            .await?;

        tracing::info!(playlist_id = %id, cleared_players = cleared, "Playlist deleted");
        Ok(())
    }
}
