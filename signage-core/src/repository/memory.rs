//! In-memory store implementing every repository port.
//!
//! Each method takes the lock once for its whole match-and-set, so the
//! conditional writes are atomic per record just like the SQL adapter.
//! Used for development (`database.url: memory://`) and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{
    FolderRepository, MediaRepository, PlayLogRepository, PlayerRepository, PlaylistChanges,
    PlaylistRepository, ScheduleRepository,
};
use crate::{
    models::{
        AssignedContent, Folder, FolderId, Media, MediaId, Player, PlayerId, PlayerStatus,
        Playlist, PlaylistId, ProofOfPlayLog, Rotation, Schedule, ScheduleId,
    },
    Error, Result,
};

#[derive(Default)]
struct State {
    players: HashMap<PlayerId, Player>,
    media: HashMap<MediaId, Media>,
    folders: HashMap<FolderId, Folder>,
    playlists: HashMap<PlaylistId, Playlist>,
    schedules: HashMap<ScheduleId, Schedule>,
    play_logs: Vec<ProofOfPlayLog>,
}

impl State {
    fn player_by_device_mut(&mut self, device_id: &str) -> Option<&mut Player> {
        self.players.values_mut().find(|p| p.device_id == device_id)
    }

    fn folder_name_taken(&self, name: &str, except: Option<&FolderId>) -> bool {
        let lowered = name.to_lowercase();
        self.folders
            .values()
            .any(|f| Some(&f.id) != except && f.name.to_lowercase() == lowered)
    }

    fn playlist_name_taken(&self, name: &str, except: Option<&PlaylistId>) -> bool {
        self.playlists
            .values()
            .any(|p| Some(&p.id) != except && p.name == name)
    }
}

/// Shared in-process store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryStore")
            .field("players", &state.players.len())
            .field("media", &state.media.len())
            .field("folders", &state.folders.len())
            .field("playlists", &state.playlists.len())
            .finish_non_exhaustive()
    }
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self.state.read().players.values().cloned().collect();
        newest_first(&mut players, |p| (p.created_at, p.id.clone()));
        Ok(players)
    }

    async fn get(&self, id: &PlayerId) -> Result<Option<Player>> {
        Ok(self.state.read().players.get(id).cloned())
    }

    async fn get_by_device(&self, device_id: &str) -> Result<Option<Player>> {
        let state = self.state.read();
        Ok(state.players.values().find(|p| p.device_id == device_id).cloned())
    }

    async fn create_unpaired(&self, player: &Player) -> Result<Option<Player>> {
        let mut state = self.state.write();
        if state.players.values().any(|p| p.device_id == player.device_id) {
            return Ok(None);
        }
        if player.pairing_code.is_some()
            && state
                .players
                .values()
                .any(|p| p.pairing_code == player.pairing_code)
        {
            return Err(Error::AlreadyExists("Pairing code already in use".to_string()));
        }

        let mut created = player.clone();
        created.status = PlayerStatus::Unpaired;
        state.players.insert(created.id.clone(), created.clone());
        Ok(Some(created))
    }

    async fn refresh_pairing(
        &self,
        device_id: &str,
        pairing_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>> {
        let mut state = self.state.write();
        let code_taken = state.players.values().any(|p| {
            p.device_id != device_id && p.pairing_code.as_deref() == Some(pairing_code)
        });

        let Some(player) = state.player_by_device_mut(device_id) else {
            return Ok(None);
        };
        if player.status != PlayerStatus::Unpaired {
            return Ok(None);
        }
        if code_taken {
            return Err(Error::AlreadyExists("Pairing code already in use".to_string()));
        }

        player.pairing_code = Some(pairing_code.to_string());
        player.last_heartbeat = now;
        Ok(Some(player.clone()))
    }

    async fn mark_online(&self, device_id: &str, now: DateTime<Utc>) -> Result<Option<Player>> {
        let mut state = self.state.write();
        Ok(state
            .player_by_device_mut(device_id)
            .map(|player| {
                player.status = PlayerStatus::Online;
                player.pairing_code = None;
                player.last_heartbeat = now;
                player.clone()
            }))
    }

    async fn confirm_pairing(
        &self,
        pairing_code: &str,
        name: &str,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Player>> {
        let mut state = self.state.write();
        Ok(state
            .players
            .values_mut()
            .find(|p| {
                p.status == PlayerStatus::Unpaired
                    && p.pairing_code.as_deref() == Some(pairing_code)
            })
            .map(|player| {
                player.name = name.to_string();
                if let Some(location) = location {
                    player.location = location;
                }
                player.status = PlayerStatus::Online;
                player.pairing_code = None;
                player.last_heartbeat = now;
                player.clone()
            }))
    }

    async fn mark_offline_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write();
        let mut demoted = 0;
        for player in state.players.values_mut() {
            if player.status == PlayerStatus::Online && player.last_heartbeat < cutoff {
                player.status = PlayerStatus::Offline;
                demoted += 1;
            }
        }
        Ok(demoted)
    }

    async fn update(
        &self,
        id: &PlayerId,
        name: Option<String>,
        rotation: Option<Rotation>,
    ) -> Result<Option<Player>> {
        let mut state = self.state.write();
        Ok(state.players.get_mut(id).map(|player| {
            if let Some(name) = name {
                player.name = name;
            }
            if let Some(rotation) = rotation {
                player.rotation = rotation;
            }
            player.clone()
        }))
    }

    async fn set_assignment(
        &self,
        id: &PlayerId,
        content: &AssignedContent,
    ) -> Result<Option<Player>> {
        let mut state = self.state.write();
        Ok(state.players.get_mut(id).map(|player| {
            player.assigned_content = content.clone();
            player.clone()
        }))
    }

    async fn clear_assignments_to(&self, target: &AssignedContent) -> Result<u64> {
        if target.is_none() {
            return Ok(0);
        }

        let mut state = self.state.write();
        let mut cleared = 0;
        for player in state.players.values_mut() {
            if &player.assigned_content == target {
                player.assigned_content = AssignedContent::None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn delete(&self, id: &PlayerId) -> Result<bool> {
        Ok(self.state.write().players.remove(id).is_some())
    }
}

#[async_trait]
impl MediaRepository for MemoryStore {
    async fn list(&self, folder: Option<FolderId>) -> Result<Vec<Media>> {
        let mut media: Vec<Media> = self
            .state
            .read()
            .media
            .values()
            .filter(|m| folder.is_none() || m.folder_id == folder)
            .cloned()
            .collect();
        newest_first(&mut media, |m| (m.uploaded_at, m.id.clone()));
        Ok(media)
    }

    async fn get(&self, id: &MediaId) -> Result<Option<Media>> {
        Ok(self.state.read().media.get(id).cloned())
    }

    async fn get_many(&self, ids: Vec<MediaId>) -> Result<Vec<Media>> {
        let state = self.state.read();
        Ok(ids.iter().filter_map(|id| state.media.get(id).cloned()).collect())
    }

    async fn create(&self, media: &Media) -> Result<Media> {
        let mut state = self.state.write();
        if state.media.contains_key(&media.id) {
            return Err(Error::AlreadyExists("Resource already exists".to_string()));
        }
        state.media.insert(media.id.clone(), media.clone());
        Ok(media.clone())
    }

    async fn rename(&self, id: &MediaId, friendly_name: &str) -> Result<Option<Media>> {
        let mut state = self.state.write();
        Ok(state.media.get_mut(id).map(|media| {
            media.friendly_name = friendly_name.to_string();
            media.clone()
        }))
    }

    async fn set_folder(&self, id: &MediaId, folder: Option<FolderId>) -> Result<Option<Media>> {
        let mut state = self.state.write();
        Ok(state.media.get_mut(id).map(|media| {
            media.folder_id = folder;
            media.clone()
        }))
    }

    async fn delete(&self, id: &MediaId) -> Result<Option<Media>> {
        Ok(self.state.write().media.remove(id))
    }

    async fn delete_by_folder(&self, folder: &FolderId) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.media.len();
        state.media.retain(|_, m| m.folder_id.as_ref() != Some(folder));
        Ok((before - state.media.len()) as u64)
    }

    async fn totals(&self) -> Result<(u64, u64)> {
        let state = self.state.read();
        let used: u64 = state
            .media
            .values()
            .map(|m| m.file_size.max(0).unsigned_abs())
            .sum();
        Ok((used, state.media.len() as u64))
    }
}

#[async_trait]
impl FolderRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self.state.read().folders.values().cloned().collect();
        newest_first(&mut folders, |f| (f.created_at, f.id.clone()));
        Ok(folders)
    }

    async fn get(&self, id: &FolderId) -> Result<Option<Folder>> {
        Ok(self.state.read().folders.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Folder>> {
        let lowered = name.to_lowercase();
        let state = self.state.read();
        Ok(state
            .folders
            .values()
            .find(|f| f.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn create(&self, folder: &Folder) -> Result<Folder> {
        let mut state = self.state.write();
        if state.folder_name_taken(&folder.name, None) {
            return Err(Error::AlreadyExists(
                "A folder with that name already exists".to_string(),
            ));
        }
        state.folders.insert(folder.id.clone(), folder.clone());
        Ok(folder.clone())
    }

    async fn update(
        &self,
        id: &FolderId,
        name: &str,
        description: Option<String>,
    ) -> Result<Option<Folder>> {
        let mut state = self.state.write();
        if !state.folders.contains_key(id) {
            return Ok(None);
        }
        if state.folder_name_taken(name, Some(id)) {
            return Err(Error::AlreadyExists(
                "A folder with that name already exists".to_string(),
            ));
        }

        Ok(state.folders.get_mut(id).map(|folder| {
            folder.name = name.to_string();
            if let Some(description) = description {
                folder.description = description;
            }
            folder.updated_at = Utc::now();
            folder.clone()
        }))
    }

    async fn remove_from_order(&self, id: &FolderId, media: &MediaId) -> Result<bool> {
        let mut state = self.state.write();
        Ok(state.folders.get_mut(id).is_some_and(|folder| {
            folder.media_order.retain(|m| m != media);
            folder.updated_at = Utc::now();
            true
        }))
    }

    async fn append_to_order(&self, id: &FolderId, media: &MediaId) -> Result<bool> {
        let mut state = self.state.write();
        Ok(state.folders.get_mut(id).is_some_and(|folder| {
            folder.media_order.retain(|m| m != media);
            folder.media_order.push(media.clone());
            folder.updated_at = Utc::now();
            true
        }))
    }

    async fn set_order(&self, id: &FolderId, order: Vec<MediaId>) -> Result<Option<Folder>> {
        let mut state = self.state.write();
        Ok(state.folders.get_mut(id).map(|folder| {
            folder.media_order = order;
            folder.updated_at = Utc::now();
            folder.clone()
        }))
    }

    async fn delete(&self, id: &FolderId) -> Result<bool> {
        Ok(self.state.write().folders.remove(id).is_some())
    }
}

#[async_trait]
impl PlaylistRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Playlist>> {
        let mut playlists: Vec<Playlist> = self.state.read().playlists.values().cloned().collect();
        newest_first(&mut playlists, |p| (p.created_at, p.id.clone()));
        Ok(playlists)
    }

    async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(self.state.read().playlists.get(id).cloned())
    }

    async fn create(&self, playlist: &Playlist) -> Result<Playlist> {
        let mut state = self.state.write();
        if state.playlist_name_taken(&playlist.name, None) {
            return Err(Error::AlreadyExists(
                "A playlist with that name already exists".to_string(),
            ));
        }
        state.playlists.insert(playlist.id.clone(), playlist.clone());
        Ok(playlist.clone())
    }

    async fn update(&self, id: &PlaylistId, changes: PlaylistChanges) -> Result<Option<Playlist>> {
        let mut state = self.state.write();
        if !state.playlists.contains_key(id) {
            return Ok(None);
        }
        if let Some(name) = &changes.name {
            if state.playlist_name_taken(name, Some(id)) {
                return Err(Error::AlreadyExists(
                    "A playlist with that name already exists".to_string(),
                ));
            }
        }

        Ok(state.playlists.get_mut(id).map(|playlist| {
            if let Some(name) = changes.name {
                playlist.name = name;
            }
            if let Some(orientation) = changes.orientation {
                playlist.orientation = orientation;
            }
            if let Some(items) = changes.items {
                playlist.items = items;
            }
            playlist.updated_at = Utc::now();
            playlist.clone()
        }))
    }

    async fn delete(&self, id: &PlaylistId) -> Result<bool> {
        Ok(self.state.write().playlists.remove(id).is_some())
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Schedule>> {
        let mut schedules: Vec<Schedule> = self.state.read().schedules.values().cloned().collect();
        schedules.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(schedules)
    }

    async fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>> {
        Ok(self.state.read().schedules.get(id).cloned())
    }

    async fn create(&self, schedule: &Schedule) -> Result<Schedule> {
        self.state
            .write()
            .schedules
            .insert(schedule.id.clone(), schedule.clone());
        Ok(schedule.clone())
    }

    async fn delete(&self, id: &ScheduleId) -> Result<bool> {
        Ok(self.state.write().schedules.remove(id).is_some())
    }
}

#[async_trait]
impl PlayLogRepository for MemoryStore {
    async fn append(&self, log: &ProofOfPlayLog) -> Result<ProofOfPlayLog> {
        self.state.write().play_logs.push(log.clone());
        Ok(log.clone())
    }

    async fn list(&self, limit: i64) -> Result<Vec<ProofOfPlayLog>> {
        let mut logs = self.state.read().play_logs.clone();
        newest_first(&mut logs, |l| (l.played_at, l.id.clone()));
        logs.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(logs)
    }
}
