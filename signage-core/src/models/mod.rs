pub mod folder;
pub mod id;
pub mod manifest;
pub mod media;
pub mod play_log;
pub mod player;
pub mod playlist;
pub mod schedule;

pub use folder::{
    CreateFolderRequest, Folder, FolderDetail, FolderStats, FolderSummary, ReorderFolderRequest,
    UpdateFolderRequest,
};
pub use id::{generate_id, FolderId, MediaId, PlayLogId, PlayerId, PlaylistId, ScheduleId};
pub use manifest::{
    HeartbeatRequest, HeartbeatResponse, HeartbeatStatus, Manifest, ManifestItem, ResolvedContent,
};
pub use media::{
    Media, MediaType, MoveMediaRequest, RenameRequest, StorageUsage, UploadMediaRequest,
};
pub use play_log::{CreatePlayLogRequest, PlayLogEntry, ProofOfPlayLog};
pub use player::{
    AssignContentRequest, AssignedContent, ContentDetails, ContentType, PairPlayerRequest, Player,
    PlayerDetail, PlayerStatus, Rotation, UpdatePlayerRequest,
};
pub use playlist::{
    CreatePlaylistRequest, DisplayMode, Orientation, Playlist, PlaylistItem, PlaylistSummary,
    PopulatedItem, PopulatedPlaylist, UpdatePlaylistRequest, DEFAULT_ITEM_DURATION_SECS,
};
pub use schedule::{CreateScheduleRequest, Schedule, ScheduleSummary, ScheduleTargets};
