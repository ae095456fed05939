use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::FileStore;
use crate::{Error, Result};

/// Files kept in one directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!(path = %self.root.display(), "Upload directory ready");
        Ok(())
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains('\0');
        if !valid {
            return Err(Error::InvalidInput(format!("Invalid file name: {name}")));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<u64> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root).await?;

        // Write to a temp file first so a half-written upload is never visible
        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await
        {
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        drop(file);
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(file = %name, bytes = data.len(), "Stored media file");
        Ok(data.len() as u64)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        let written = store.put("a.png", Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"abc");
        assert!(!dir.path().join("a.part").exists());

        store.remove("a.png").await.unwrap();
        assert!(!dir.path().join("a.png").exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert!(store.remove("missing.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path().join("uploads"));

        let err = store
            .put("../escape.png", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!dir.path().join("escape.png").exists());
    }
}
