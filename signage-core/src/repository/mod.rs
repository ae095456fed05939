pub mod folder;
pub mod media;
pub mod memory;
pub mod play_log;
pub mod player;
pub mod playlist;
pub mod schedule;

use std::sync::Arc;

use sqlx::PgPool;

pub use folder::{FolderRepository, PgFolderRepository};
pub use media::{MediaRepository, PgMediaRepository};
pub use memory::MemoryStore;
pub use play_log::{PgPlayLogRepository, PlayLogRepository};
pub use player::{PgPlayerRepository, PlayerRepository};
pub use playlist::{PgPlaylistRepository, PlaylistChanges, PlaylistRepository};
pub use schedule::{PgScheduleRepository, ScheduleRepository};

#[cfg(test)]
pub use folder::MockFolderRepository;
#[cfg(test)]
pub use media::MockMediaRepository;
#[cfg(test)]
pub use player::MockPlayerRepository;
#[cfg(test)]
pub use playlist::MockPlaylistRepository;

/// Every repository the services need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub players: Arc<dyn PlayerRepository>,
    pub media: Arc<dyn MediaRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub play_logs: Arc<dyn PlayLogRepository>,
}

impl Repositories {
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            players: Arc::new(PgPlayerRepository::new(pool.clone())),
            media: Arc::new(PgMediaRepository::new(pool.clone())),
            folders: Arc::new(PgFolderRepository::new(pool.clone())),
            playlists: Arc::new(PgPlaylistRepository::new(pool.clone())),
            schedules: Arc::new(PgScheduleRepository::new(pool.clone())),
            play_logs: Arc::new(PgPlayLogRepository::new(pool)),
        }
    }

    /// All ports backed by one shared [`MemoryStore`]
    #[must_use]
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            players: store.clone(),
            media: store.clone(),
            folders: store.clone(),
            playlists: store.clone(),
            schedules: store.clone(),
            play_logs: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
