//! Operator-side player management: listing, editing and content assignment

use crate::{
    models::{
        AssignContentRequest, AssignedContent, ContentDetails, ContentType, MediaId, Player,
        PlayerDetail, PlayerId, PlaylistId, Rotation, UpdatePlayerRequest,
    },
    repository::Repositories,
    service::playlist::populate,
    Error, Result,
};

#[derive(Clone)]
pub struct PlayerService {
    repos: Repositories,
}

impl std::fmt::Debug for PlayerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerService").finish()
    }
}

impl PlayerService {
    #[must_use]
    pub const fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self) -> Result<Vec<Player>> {
        self.repos.players.list().await
    }

    /// Get one player with its assigned media or playlist loaded
    pub async fn get(&self, id: &PlayerId) -> Result<PlayerDetail> {
        let player = self.find(id).await?;

        let content_details = match &player.assigned_content {
            AssignedContent::None => None,
            AssignedContent::Media(media_id) => {
                self.repos.media.get(media_id).await?.map(ContentDetails::Media)
            }
            AssignedContent::Playlist(playlist_id) => {
                match self.repos.playlists.get(playlist_id).await? {
                    Some(playlist) => Some(ContentDetails::Playlist(
                        populate(&self.repos, playlist).await?,
                    )),
                    None => None,
                }
            }
        };

        Ok(PlayerDetail {
            player,
            content_details,
        })
    }

    /// Change the display name and/or rotation
    pub async fn update(&self, id: &PlayerId, request: UpdatePlayerRequest) -> Result<Player> {
        let name = match request.name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::InvalidInput("name must not be empty".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let rotation = request
            .rotation
            .map(Rotation::try_from)
            .transpose()
            .map_err(Error::InvalidInput)?;

        self.repos
            .players
            .update(id, name, rotation)
            .await?
            .ok_or_else(|| Error::NotFound("Player not found".to_string()))
    }

    /// Set or clear what a player shows.
    ///
    /// Both fields absent (or empty) clears the assignment. A target that
    /// does not exist is rejected.
    pub async fn assign(&self, id: &PlayerId, request: AssignContentRequest) -> Result<Player> {
        let content_type = request.content_type.filter(|t| !t.trim().is_empty());
        let content_id = request.content_id.filter(|c| !c.trim().is_empty());

        let content = match (content_type, content_id) {
            (None, None) => AssignedContent::None,
            (Some(kind), Some(content_id)) => {
                match kind.trim().parse::<ContentType>().map_err(Error::InvalidInput)? {
                    ContentType::Media => {
                        let media_id = MediaId::from_string(content_id);
                        if self.repos.media.get(&media_id).await?.is_none() {
                            return Err(Error::NotFound("Media not found".to_string()));
                        }
                        AssignedContent::Media(media_id)
                    }
                    ContentType::Playlist => {
                        let playlist_id = PlaylistId::from_string(content_id);
                        if self.repos.playlists.get(&playlist_id).await?.is_none() {
                            return Err(Error::NotFound("Playlist not found".to_string()));
                        }
                        AssignedContent::Playlist(playlist_id)
                    }
                }
            }
            _ => {
                return Err(Error::InvalidInput(
                    "contentType and contentId must be given together".to_string(),
                ));
            }
        };

        let player = self
            .repos
            .players
            .set_assignment(id, &content)
            .await?
            .ok_or_else(|| Error::NotFound("Player not found".to_string()))?;

        tracing::info!(
            player_id = %player.id,
            content = ?player.assigned_content,
            "Player content assigned"
        );
        Ok(player)
    }

    pub async fn delete(&self, id: &PlayerId) -> Result<()> {
        if !self.repos.players.delete(id).await? {
            return Err(Error::NotFound("Player not found".to_string()));
        }
        tracing::info!(player_id = %id, "Player deleted");
        Ok(())
    }

    async fn find(&self, id: &PlayerId) -> Result<Player> {
        self.repos
            .players
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Player not found".to_string()))
    }
}
