//! Content resolution: assignment → playback manifest
//!
//! `resolve` and `resolve_url` are pure; `load_assigned_content` is the only
//! part that reads storage, and it never fails on a dangling reference.

use url::Url;

use crate::{
    models::{
        AssignedContent, DisplayMode, Manifest, ManifestItem, Media, MediaType, Orientation,
        ResolvedContent,
    },
    repository::Repositories,
    Result,
};

/// Prefix a locally hosted path with `base_url`; absolute URLs pass through
#[must_use]
pub fn resolve_url(file_url: &str, base_url: &str) -> String {
    if Url::parse(file_url).is_ok() || base_url.is_empty() {
        return file_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        file_url.trim_start_matches('/')
    )
}

fn item_duration(media: &Media, duration: f64) -> f64 {
    match media.media_type {
        MediaType::Video => 0.0,
        MediaType::Image => duration,
    }
}

fn manifest_item(
    media: &Media,
    duration: f64,
    display_mode: DisplayMode,
    base_url: &str,
) -> ManifestItem {
    ManifestItem {
        media_type: media.media_type,
        url: resolve_url(&media.file_url, base_url),
        duration: item_duration(media, duration),
        display_mode,
    }
}

/// Build the manifest for already-loaded content.
///
/// `None` means there is nothing to play (no assignment, or its target is gone).
#[must_use]
pub fn resolve(content: Option<&ResolvedContent>, base_url: &str) -> Option<Manifest> {
    match content? {
        ResolvedContent::Media(media) => Some(Manifest {
            orientation: Orientation::Landscape,
            items: vec![manifest_item(media, media.duration, DisplayMode::Contain, base_url)],
        }),
        ResolvedContent::Playlist { playlist, media } => Some(Manifest {
            orientation: playlist.orientation,
            items: playlist
                .items
                .iter()
                .zip(media)
                .filter_map(|(item, media)| {
                    media
                        .as_ref()
                        .map(|m| manifest_item(m, item.duration, item.display_mode, base_url))
                })
                .collect(),
        }),
    }
}

/// Load the records an assignment points at.
///
/// Returns `None` for an empty assignment or one whose target no longer exists.
pub async fn load_assigned_content(
    repos: &Repositories,
    content: &AssignedContent,
) -> Result<Option<ResolvedContent>> {
    match content {
        AssignedContent::None => Ok(None),
        AssignedContent::Media(id) => Ok(repos.media.get(id).await?.map(ResolvedContent::Media)),
        AssignedContent::Playlist(id) => {
            let Some(playlist) = repos.playlists.get(id).await? else {
                return Ok(None);
            };
            let ids = playlist.items.iter().map(|item| item.media.clone()).collect();
            let found = repos.media.get_many(ids).await?;
            let media = playlist
                .items
                .iter()
                .map(|item| found.iter().find(|m| m.id == item.media).cloned())
                .collect();
            Ok(Some(ResolvedContent::Playlist { playlist, media }))
        }
    }
}
