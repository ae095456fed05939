pub mod folder;
pub mod liveness;
pub mod media;
pub mod pairing;
pub mod play_log;
pub mod player;
pub mod playlist;
pub mod resolver;
pub mod schedule;

pub use folder::FolderService;
pub use liveness::LivenessReaper;
pub use media::MediaService;
pub use pairing::PairingService;
pub use play_log::PlayLogService;
pub use player::PlayerService;
pub use playlist::PlaylistService;
pub use schedule::ScheduleService;
