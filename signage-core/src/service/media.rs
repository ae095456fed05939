//! Media library: upload under a storage cap, move, rename, delete
//!
//! Record and file are independent: a failed file removal is logged and
//! never blocks the record deletion.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use crate::{
    models::{FolderId, Media, MediaId, MediaType, StorageUsage, UploadMediaRequest},
    repository::Repositories,
    storage::FileStore,
    Error, Result,
};

/// Accepted upload extensions (case-insensitive)
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "mp4", "mov", "avi"];

/// Validated, lowercased extension of an uploaded file name
fn upload_extension(original_name: &str) -> Result<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| Error::InvalidInput("Only image and video files are allowed".to_string()))
}

/// Classify by the declared content type, else by the file name
fn detect_media_type(content_type: Option<&str>, original_name: &str) -> MediaType {
    let declared = content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream");
    match declared {
        Some(mime) => MediaType::from_mime(mime),
        None => MediaType::from_mime(
            mime_guess::from_path(original_name)
                .first_or_octet_stream()
                .essence_str(),
        ),
    }
}

/// Unique stored name keeping the original extension
fn stored_file_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        nanoid::nanoid!(6, &nanoid::alphabet::SAFE),
        extension
    )
}

pub(crate) async fn remove_file_best_effort(files: &dyn FileStore, media: &Media) {
    if let Err(e) = files.remove(&media.file_name).await {
        tracing::warn!(
            media_id = %media.id,
            file = %media.file_name,
            error = %e,
            "Failed to delete media file, leaving it orphaned"
        );
    }
}

#[derive(Clone)]
pub struct MediaService {
    repos: Repositories,
    files: Arc<dyn FileStore>,
    public_path: String,
    capacity_bytes: u64,
}

impl std::fmt::Debug for MediaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaService")
            .field("public_path", &self.public_path)
            .field("capacity_bytes", &self.capacity_bytes)
            .finish_non_exhaustive()
    }
}

impl MediaService {
    #[must_use]
    pub fn new(
        repos: Repositories,
        files: Arc<dyn FileStore>,
        public_path: &str,
        capacity_bytes: u64,
    ) -> Self {
        Self {
            repos,
            files,
            public_path: public_path.trim_end_matches('/').to_string(),
            capacity_bytes,
        }
    }

    pub async fn list(&self, folder: Option<FolderId>) -> Result<Vec<Media>> {
        self.repos.media.list(folder).await
    }

    pub async fn storage_usage(&self) -> Result<StorageUsage> {
        let (used, count) = self.repos.media.totals().await?;
        Ok(StorageUsage::new(used, self.capacity_bytes, count))
    }

    /// Store an uploaded file and create its record.
    ///
    /// The cap is checked before anything is written; if the record cannot be
    /// created the stored file is removed again.
    pub async fn upload(&self, data: Bytes, request: UploadMediaRequest) -> Result<Media> {
        let extension = upload_extension(&request.original_name)?;
        if data.is_empty() {
            return Err(Error::InvalidInput("No file uploaded".to_string()));
        }

        if let Some(folder_id) = &request.folder_id {
            if self.repos.folders.get(folder_id).await?.is_none() {
                return Err(Error::NotFound("Folder not found".to_string()));
            }
        }

        let size = data.len() as u64;
        let usage = self.storage_usage().await?;
        if !usage.can_fit(size) {
            tracing::warn!(
                size,
                used = usage.used_bytes,
                capacity = usage.capacity_bytes,
                "Upload rejected, storage cap reached"
            );
            return Err(Error::CapacityExceeded(format!(
                "Upload of {size} bytes exceeds the remaining {} bytes of storage",
                usage.available_bytes
            )));
        }

        let file_name = stored_file_name(&extension);
        let written = self.files.put(&file_name, data).await?;

        let friendly_name = request
            .friendly_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&request.original_name)
            .to_string();
        let media = Media {
            id: MediaId::new(),
            friendly_name,
            file_url: format!("{}/{}", self.public_path, file_name),
            media_type: detect_media_type(request.content_type.as_deref(), &request.original_name),
            duration: request.duration.unwrap_or(0.0).max(0.0),
            file_size: i64::try_from(written).unwrap_or(i64::MAX),
            width: request.width.unwrap_or(0).max(0),
            height: request.height.unwrap_or(0).max(0),
            folder_id: request.folder_id,
            uploaded_at: Utc::now(),
            file_name,
        };

        match self.repos.media.create(&media).await {
            Ok(created) => {
                tracing::info!(
                    media_id = %created.id,
                    file = %created.file_name,
                    bytes = created.file_size,
                    "Media uploaded"
                );
                Ok(created)
            }
            Err(e) => {
                remove_file_best_effort(self.files.as_ref(), &media).await;
                Err(e)
            }
        }
    }

    /// Re-home a media item, keeping both folders' order lists in step.
    ///
    /// Three single-record writes in sequence: the media's folder first, then
    /// removal from the old order, then append to the new one. A failure in
    /// between leaves at worst a stale order entry, which readers ignore.
    pub async fn move_to_folder(&self, id: &MediaId, folder: Option<FolderId>) -> Result<Media> {
        let media = self.find(id).await?;

        if let Some(folder_id) = &folder {
            if self.repos.folders.get(folder_id).await?.is_none() {
                return Err(Error::NotFound("Folder not found".to_string()));
            }
        }

        let moved = self
            .repos
            .media
            .set_folder(id, folder.clone())
            .await?
            .ok_or_else(|| Error::NotFound("Media not found".to_string()))?;

        if let Some(old) = media.folder_id.as_ref().filter(|old| Some(*old) != folder.as_ref()) {
            self.repos.folders.remove_from_order(old, id).await?;
        }
        if let Some(new) = &folder {
            self.repos.folders.append_to_order(new, id).await?;
        }

        tracing::info!(media_id = %id, from = ?media.folder_id, to = ?folder, "Media moved");
        Ok(moved)
    }

    pub async fn rename(&self, id: &MediaId, name: &str) -> Result<Media> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("New name is required".to_string()));
        }
        self.repos
            .media
            .rename(id, name)
            .await?
            .ok_or_else(|| Error::NotFound("Media not found".to_string()))
    }

    /// Delete the file (best effort), drop the id from its folder's order,
    /// then delete the record.
    pub async fn delete(&self, id: &MediaId) -> Result<()> {
        let media = self.find(id).await?;

        remove_file_best_effort(self.files.as_ref(), &media).await;
        if let Some(folder_id) = &media.folder_id {
            self.repos.folders.remove_from_order(folder_id, id).await?;
        }
        self.repos.media.delete(id).await?;

        tracing::info!(media_id = %id, "Media deleted");
        Ok(())
    }

    async fn find(&self, id: &MediaId) -> Result<Media> {
        self.repos
            .media
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Media not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Folder;
    use crate::storage::{LocalFileStore, MockFileStore};

    fn upload_req(name: &str) -> UploadMediaRequest {
        UploadMediaRequest {
            original_name: name.to_string(),
            ..Default::default()
        }
    }

    fn local_service(repos: &Repositories, dir: &Path, capacity: u64) -> MediaService {
        MediaService::new(repos.clone(), Arc::new(LocalFileStore::new(dir)), "/uploads/", capacity)
    }

    #[test]
    fn test_upload_extension_filter() {
        assert_eq!(upload_extension("Photo.JPG").unwrap(), "jpg");
        assert_eq!(upload_extension("clip.mov").unwrap(), "mov");
        assert!(upload_extension("notes.txt").is_err());
        assert!(upload_extension("no_extension").is_err());
    }

    #[test]
    fn test_detect_media_type() {
        assert_eq!(detect_media_type(Some("image/png"), "x.mp4"), MediaType::Image);
        assert_eq!(detect_media_type(None, "x.gif"), MediaType::Image);
        assert_eq!(detect_media_type(Some("application/octet-stream"), "x.jpeg"), MediaType::Image);
        assert_eq!(detect_media_type(None, "x.avi"), MediaType::Video);
    }

    #[tokio::test]
    async fn test_upload_records_received_size() {
        let dir = tempfile::tempdir().unwrap();
        let repos = Repositories::memory();
        let svc = local_service(&repos, dir.path(), 1024);

        let media = svc
            .upload(Bytes::from_static(b"0123456789"), upload_req("Lobby Loop.png"))
            .await
            .unwrap();

        assert_eq!(media.file_size, 10);
        assert_eq!(media.friendly_name, "Lobby Loop.png");
        assert_eq!(media.media_type, MediaType::Image);
        assert!(media.file_name.ends_with(".png"));
        assert_eq!(media.file_url, format!("/uploads/{}", media.file_name));
        assert!(dir.path().join(&media.file_name).exists());

        let usage = svc.storage_usage().await.unwrap();
        assert_eq!(usage, StorageUsage::new(10, 1024, 1));
    }

    #[tokio::test]
    async fn test_upload_over_cap_is_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let repos = Repositories::memory();
        let svc = local_service(&repos, dir.path(), 16);

        svc.upload(Bytes::from(vec![0u8; 10]), upload_req("a.png")).await.unwrap();
        let err = svc
            .upload(Bytes::from(vec![0u8; 7]), upload_req("b.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CapacityExceeded(_)));
        assert_eq!(repos.media.list(None).await.unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_insert_removes_file() {
        let mut media_repo = crate::repository::MockMediaRepository::new();
        media_repo.expect_totals().returning(|| Ok((0, 0)));
        media_repo
            .expect_create()
            .returning(|_| Err(Error::Internal("insert failed".to_string())));

        let mut files = MockFileStore::new();
        files.expect_put().times(1).returning(|_, data| Ok(data.len() as u64));
        files.expect_remove().times(1).returning(|_| Ok(()));

        let mut repos = Repositories::memory();
        repos.media = Arc::new(media_repo);
        let svc = MediaService::new(repos, Arc::new(files), "/uploads", 1024);

        let err = svc
            .upload(Bytes::from_static(b"abc"), upload_req("a.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_backend());
    }

    #[tokio::test]
    async fn test_upload_into_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let repos = Repositories::memory();
        let svc = local_service(&repos, dir.path(), 1024);

        let request = UploadMediaRequest {
            folder_id: Some(FolderId::from("missing")),
            ..upload_req("a.png")
        };
        let err = svc.upload(Bytes::from_static(b"abc"), request).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_move_updates_both_orders() {
        let dir = tempfile::tempdir().unwrap();
        let repos = Repositories::memory();
        let svc = local_service(&repos, dir.path(), 1024);
        let from = repos.folders.create(&Folder::new("From".into(), String::new())).await.unwrap();
        let to = repos.folders.create(&Folder::new("To".into(), String::new())).await.unwrap();

        let media = svc
            .upload(
                Bytes::from_static(b"abc"),
                UploadMediaRequest { folder_id: Some(from.id.clone()), ..upload_req("a.png") },
            )
            .await
            .unwrap();
        repos.folders.set_order(&from.id, vec![media.id.clone()]).await.unwrap();

        let moved = svc.move_to_folder(&media.id, Some(to.id.clone())).await.unwrap();
        assert_eq!(moved.folder_id, Some(to.id.clone()));
        let from = repos.folders.get(&from.id).await.unwrap().unwrap();
        let to_folder = repos.folders.get(&to.id).await.unwrap().unwrap();
        assert!(from.media_order.is_empty());
        assert_eq!(to_folder.media_order, vec![media.id.clone()]);

        // Detaching removes it from the old order and appends nowhere
        let detached = svc.move_to_folder(&media.id, None).await.unwrap();
        assert!(detached.folder_id.is_none());
        let to_folder = repos.folders.get(&to.id).await.unwrap().unwrap();
        assert!(to_folder.media_order.is_empty());
    }

    #[tokio::test]
    async fn test_delete_survives_file_removal_failure() {
        let repos = Repositories::memory();
        let folder = repos.folders.create(&Folder::new("F".into(), String::new())).await.unwrap();
        let mut media = crate::test_helpers::image_media("a.png", 5.0);
        media.folder_id = Some(folder.id.clone());
        let media = repos.media.create(&media).await.unwrap();
        repos.folders.set_order(&folder.id, vec![media.id.clone()]).await.unwrap();

        let mut files = MockFileStore::new();
        files
            .expect_remove()
            .times(1)
            .returning(|_| Err(Error::Io(std::io::Error::other("read-only filesystem"))));
        let svc = MediaService::new(repos.clone(), Arc::new(files), "/uploads", 1024);

        svc.delete(&media.id).await.unwrap();
        assert!(repos.media.get(&media.id).await.unwrap().is_none());
        let folder = repos.folders.get(&folder.id).await.unwrap().unwrap();
        assert!(folder.media_order.is_empty());

        assert!(matches!(svc.delete(&media.id).await.unwrap_err(), Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_requires_name() {
        let repos = Repositories::memory();
        let media = repos
            .media
            .create(&crate::test_helpers::image_media("a.png", 5.0))
            .await
            .unwrap();
        let svc = MediaService::new(repos, Arc::new(MockFileStore::new()), "/uploads", 1024);

        assert!(matches!(svc.rename(&media.id, "  ").await.unwrap_err(), Error::InvalidInput(_)));
        assert_eq!(svc.rename(&media.id, "Welcome").await.unwrap().friendly_name, "Welcome");
    }
}
