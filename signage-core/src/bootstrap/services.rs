//! Service initialization and dependency injection

use std::sync::Arc;

use tracing::info;

use crate::{
    repository::Repositories,
    service::{
        FolderService, LivenessReaper, MediaService, PairingService, PlayLogService,
        PlayerService, PlaylistService, ScheduleService,
    },
    storage::LocalFileStore,
    Config,
};

/// Container for all initialized services
#[derive(Clone, Debug)]
pub struct Services {
    /// Device heartbeats and operator pairing
    pub pairing_service: PairingService,
    /// Player listing, editing and content assignment
    pub player_service: PlayerService,
    /// Media upload and library management
    pub media_service: MediaService,
    /// Folders and their manual ordering
    pub folder_service: FolderService,
    pub playlist_service: PlaylistService,
    pub schedule_service: ScheduleService,
    /// Proof-of-play logging
    pub play_log_service: PlayLogService,
    /// Online to offline demotion; spawned by the binary
    pub liveness_reaper: LivenessReaper,
}

/// Initialize all core services over the chosen store.
///
/// Creates the upload directory if it does not exist.
pub async fn init_services(config: &Config, repos: Repositories) -> anyhow::Result<Services> {
    info!("Initializing services...");

    let files = Arc::new(LocalFileStore::new(&config.media.upload_dir));
    files.initialize().await?;

    let services = Services {
        pairing_service: PairingService::new(repos.clone(), config.media.base_url.clone()),
        player_service: PlayerService::new(repos.clone()),
        media_service: MediaService::new(
            repos.clone(),
            files.clone(),
            &config.media.public_path,
            config.media.storage_capacity_bytes,
        ),
        folder_service: FolderService::new(repos.clone(), files),
        playlist_service: PlaylistService::new(repos.clone()),
        schedule_service: ScheduleService::new(repos.clone()),
        play_log_service: PlayLogService::new(repos.clone()),
        liveness_reaper: LivenessReaper::new(repos.players, config.liveness.offline_timeout()),
    };

    info!("All services initialized");
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_services_creates_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let mut config = Config::default();
        config.media.upload_dir = upload_dir.to_string_lossy().into_owned();

        let services = init_services(&config, Repositories::memory()).await.unwrap();

        assert!(upload_dir.is_dir());
        assert_eq!(services.liveness_reaper.timeout(), config.liveness.offline_timeout());
        assert_eq!(services.media_service.storage_usage().await.unwrap().media_count, 0);
    }
}
