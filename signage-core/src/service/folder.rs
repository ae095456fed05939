//! Folder management and manual media ordering

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    models::{
        CreateFolderRequest, Folder, FolderDetail, FolderId, FolderStats, FolderSummary, Media,
        MediaId, UpdateFolderRequest,
    },
    repository::Repositories,
    service::media::remove_file_best_effort,
    storage::FileStore,
    Error, Result,
};

/// Merge a folder's stored order with its media.
///
/// Ordered ids come first in stored order; ids that no longer resolve are
/// skipped. Media missing from the order follow, newest upload first.
#[must_use]
pub fn order_media(order: &[MediaId], media: Vec<Media>) -> Vec<Media> {
    let mut unordered = media;
    let mut ordered = Vec::with_capacity(unordered.len());

    for id in order {
        if let Some(pos) = unordered.iter().position(|m| &m.id == id) {
            ordered.push(unordered.swap_remove(pos));
        }
    }

    unordered.sort_by(|a, b| {
        b.uploaded_at
            .cmp(&a.uploaded_at)
            .then_with(|| b.id.as_str().cmp(a.id.as_str()))
    });
    ordered.extend(unordered);
    ordered
}

/// First ordered id that still resolves, else the newest upload
#[must_use]
pub fn pick_preview<'a>(order: &[MediaId], media: &'a [Media]) -> Option<&'a Media> {
    order
        .iter()
        .find_map(|id| media.iter().find(|m| &m.id == id))
        .or_else(|| {
            media.iter().max_by(|a, b| {
                a.uploaded_at
                    .cmp(&b.uploaded_at)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            })
        })
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Folder name is required".to_string()));
    }
    Ok(name)
}

#[derive(Clone)]
pub struct FolderService {
    repos: Repositories,
    files: Arc<dyn FileStore>,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService").finish_non_exhaustive()
    }
}

impl FolderService {
    #[must_use]
    pub fn new(repos: Repositories, files: Arc<dyn FileStore>) -> Self {
        Self { repos, files }
    }

    /// Every folder, newest first, with its preview item and aggregates
    pub async fn list(&self) -> Result<Vec<FolderSummary>> {
        let folders = self.repos.folders.list().await?;
        let mut summaries = Vec::with_capacity(folders.len());

        for folder in folders {
            let media = self.repos.media.list(Some(folder.id.clone())).await?;
            summaries.push(FolderSummary {
                preview_item: pick_preview(&folder.media_order, &media).cloned(),
                stats: FolderStats::from_media(&media),
                folder,
            });
        }
        Ok(summaries)
    }

    /// One folder with its media in display order
    pub async fn get(&self, id: &FolderId) -> Result<FolderDetail> {
        let folder = self.find(id).await?;
        let media = self.repos.media.list(Some(folder.id.clone())).await?;
        let stats = FolderStats::from_media(&media);

        Ok(FolderDetail {
            media_files: order_media(&folder.media_order, media),
            folder_details: folder,
            total_size: stats.total_size,
            total_duration: stats.total_duration,
        })
    }

    pub async fn preview(&self, id: &FolderId) -> Result<Option<Media>> {
        let folder = self.find(id).await?;
        let media = self.repos.media.list(Some(folder.id.clone())).await?;
        Ok(pick_preview(&folder.media_order, &media).cloned())
    }

    pub async fn create(&self, request: CreateFolderRequest) -> Result<Folder> {
        let name = required_name(&request.name)?;
        self.ensure_name_free(name, None).await?;

        let description = request.description.unwrap_or_default().trim().to_string();
        let folder = self
            .repos
            .folders
            .create(&Folder::new(name.to_string(), description))
            .await?;

        tracing::info!(folder_id = %folder.id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    /// Change only the name; the description is kept
    pub async fn rename(&self, id: &FolderId, name: &str) -> Result<Folder> {
        let name = required_name(name)?;
        self.ensure_name_free(name, Some(id)).await?;
        self.repos
            .folders
            .update(id, name, None)
            .await?
            .ok_or_else(|| Error::NotFound("Folder not found".to_string()))
    }

    pub async fn update(&self, id: &FolderId, request: UpdateFolderRequest) -> Result<Folder> {
        let name = required_name(&request.name)?;
        self.ensure_name_free(name, Some(id)).await?;
        let description = request.description.map(|d| d.trim().to_string());
        self.repos
            .folders
            .update(id, name, description)
            .await?
            .ok_or_else(|| Error::NotFound("Folder not found".to_string()))
    }

    /// Replace the folder's order with `order`, dropping repeated ids.
    ///
    /// Every id must be media the folder owns.
    pub async fn reorder(&self, id: &FolderId, order: Option<Vec<MediaId>>) -> Result<Folder> {
        let order = order
            .ok_or_else(|| Error::InvalidInput("mediaOrder must be an array".to_string()))?;
        let folder = self.find(id).await?;

        let mut seen = HashSet::with_capacity(order.len());
        let order: Vec<MediaId> = order.into_iter().filter(|m| seen.insert(m.clone())).collect();

        let owned: HashSet<MediaId> = self
            .repos
            .media
            .get_many(order.clone())
            .await?
            .into_iter()
            .filter(|m| m.folder_id.as_ref() == Some(&folder.id))
            .map(|m| m.id)
            .collect();
        if owned.len() != order.len() {
            return Err(Error::InvalidInput(
                "Some media do not belong to this folder".to_string(),
            ));
        }

        self.repos
            .folders
            .set_order(id, order)
            .await?
            .ok_or_else(|| Error::NotFound("Folder not found".to_string()))
    }

    /// Delete every media the folder owns (files best effort), then the folder.
    ///
    /// Sequence of single-record writes; if it stops part way the folder
    /// remains and the call can simply be repeated.
    pub async fn delete(&self, id: &FolderId) -> Result<()> {
        let folder = self.find(id).await?;

        let media = self.repos.media.list(Some(folder.id.clone())).await?;
        for item in &media {
            remove_file_best_effort(self.files.as_ref(), item).await;
        }
        let removed = self.repos.media.delete_by_folder(&folder.id).await?;

        if !self.repos.folders.delete(&folder.id).await? {
            return Err(Error::NotFound("Folder not found".to_string()));
        }

        tracing::info!(folder_id = %folder.id, media_removed = removed, "Folder deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, own: Option<&FolderId>) -> Result<()> {
        match self.repos.folders.find_by_name(name).await? {
            Some(existing) if Some(&existing.id) != own => Err(Error::AlreadyExists(
                "A folder with that name already exists".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn find(&self, id: &FolderId) -> Result<Folder> {
        self.repos
            .folders
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Folder not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockFileStore;
    use crate::test_helpers::{image_media, video_media};
    use chrono::{Duration, Utc};

    fn service(repos: &Repositories) -> FolderService {
        let mut files = MockFileStore::new();
        files.expect_remove().returning(|_| Ok(()));
        FolderService::new(repos.clone(), Arc::new(files))
    }

    fn create_req(name: &str) -> CreateFolderRequest {
        CreateFolderRequest {
            name: name.to_string(),
            description: None,
        }
    }

    async fn add_media(
        repos: &Repositories,
        folder: &FolderId,
        name: &str,
        age_secs: i64,
    ) -> Media {
        let mut media = image_media(name, 5.0);
        media.folder_id = Some(folder.clone());
        media.uploaded_at = Utc::now() - Duration::seconds(age_secs);
        repos.media.create(&media).await.unwrap()
    }

    #[test]
    fn test_order_media_merges_unordered_newest_first() {
        let now = Utc::now();
        let mut a = image_media("a.png", 1.0);
        let mut b = image_media("b.png", 1.0);
        let mut c = image_media("c.png", 1.0);
        let mut d = video_media("d.mp4", 0.0);
        a.uploaded_at = now - Duration::seconds(40);
        b.uploaded_at = now - Duration::seconds(30);
        c.uploaded_at = now - Duration::seconds(20);
        d.uploaded_at = now - Duration::seconds(10);

        let order = vec![b.id.clone(), MediaId::from("gone"), a.id.clone()];
        let merged = order_media(&order, vec![a.clone(), b.clone(), c.clone(), d.clone()]);
        let ids: Vec<_> = merged.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec![b.id, a.id, d.id, c.id]);
    }

    #[test]
    fn test_pick_preview_falls_back_to_newest() {
        let now = Utc::now();
        let mut old = image_media("old.png", 1.0);
        let mut new = image_media("new.png", 1.0);
        old.uploaded_at = now - Duration::seconds(60);
        new.uploaded_at = now;
        let media = vec![old.clone(), new.clone()];

        assert_eq!(pick_preview(&[old.id.clone()], &media), Some(&old));
        assert_eq!(pick_preview(&[MediaId::from("gone")], &media), Some(&new));
        assert_eq!(pick_preview(&[], &[]), None);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_case_insensitively() {
        let repos = Repositories::memory();
        let svc = service(&repos);

        svc.create(create_req("Promos")).await.unwrap();
        let err = svc.create(create_req("  PROMOS ")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(matches!(svc.create(create_req("")).await.unwrap_err(), Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_rename_may_keep_own_name() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        let folder = svc.create(create_req("Promos")).await.unwrap();
        svc.create(create_req("Menus")).await.unwrap();

        assert_eq!(svc.rename(&folder.id, "promos").await.unwrap().name, "promos");
        let err = svc.rename(&folder.id, "menus").await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        let updated = svc
            .update(
                &folder.id,
                UpdateFolderRequest { name: "Promos".into(), description: Some("Spring".into()) },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "Spring");
    }

    #[tokio::test]
    async fn test_reorder_then_get_returns_exact_order() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        let folder = svc.create(create_req("Promos")).await.unwrap();
        let a = add_media(&repos, &folder.id, "a.png", 30).await;
        let b = add_media(&repos, &folder.id, "b.png", 20).await;
        let c = add_media(&repos, &folder.id, "c.png", 10).await;

        let order = vec![a.id.clone(), c.id.clone(), a.id.clone(), b.id.clone()];
        let folder_after = svc.reorder(&folder.id, Some(order)).await.unwrap();
        assert_eq!(folder_after.media_order, vec![a.id.clone(), c.id.clone(), b.id.clone()]);

        let detail = svc.get(&folder.id).await.unwrap();
        let ids: Vec<_> = detail.media_files.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec![a.id, c.id, b.id]);
        assert_eq!(detail.total_size, 3 * detail.media_files[0].file_size);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_media() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        let folder = svc.create(create_req("Promos")).await.unwrap();
        let other = svc.create(create_req("Menus")).await.unwrap();
        let mine = add_media(&repos, &folder.id, "a.png", 10).await;
        let foreign = add_media(&repos, &other.id, "b.png", 10).await;

        let err = svc
            .reorder(&folder.id, Some(vec![mine.id.clone(), foreign.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = svc
            .reorder(&folder.id, Some(vec![MediaId::from("missing")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        assert!(matches!(svc.reorder(&folder.id, None).await.unwrap_err(), Error::InvalidInput(_)));

        // A failed reorder leaves the stored order untouched
        assert!(repos.folders.get(&folder.id).await.unwrap().unwrap().media_order.is_empty());
    }

    #[tokio::test]
    async fn test_list_preview_and_stats() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        let folder = svc.create(create_req("Promos")).await.unwrap();
        let old = add_media(&repos, &folder.id, "old.png", 60).await;
        let new = add_media(&repos, &folder.id, "new.png", 5).await;
        svc.create(create_req("Empty")).await.unwrap();

        let summaries = svc.list().await.unwrap();
        let promos = summaries.iter().find(|s| s.folder.id == folder.id).unwrap();
        assert_eq!(promos.preview_item.as_ref(), Some(&new));
        assert_eq!(promos.stats.items_count, 2);
        assert_eq!(promos.stats.total_duration, 10.0);

        svc.reorder(&folder.id, Some(vec![old.id.clone()])).await.unwrap();
        assert_eq!(svc.preview(&folder.id).await.unwrap(), Some(old));

        let empty = summaries.iter().find(|s| s.folder.name == "Empty").unwrap();
        assert!(empty.preview_item.is_none());
        assert_eq!(empty.stats, FolderStats::default());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_media_and_files() {
        let repos = Repositories::memory();
        let mut files = MockFileStore::new();
        files.expect_remove().times(2).returning(|_| Ok(()));
        let svc = FolderService::new(repos.clone(), Arc::new(files));

        let folder = svc.create(create_req("Promos")).await.unwrap();
        add_media(&repos, &folder.id, "a.png", 10).await;
        add_media(&repos, &folder.id, "b.png", 10).await;
        let loose = repos.media.create(&image_media("loose.png", 5.0)).await.unwrap();

        svc.delete(&folder.id).await.unwrap();

        assert!(repos.folders.get(&folder.id).await.unwrap().is_none());
        let remaining = repos.media.list(None).await.unwrap();
        assert_eq!(remaining, vec![loose]);
        assert!(matches!(svc.delete(&folder.id).await.unwrap_err(), Error::NotFound(_)));
    }
}
