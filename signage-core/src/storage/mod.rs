//! Physical media file storage

mod local;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

pub use local::LocalFileStore;

/// Flat namespace of stored media files
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `data` under `name`, returning the number of bytes stored
    async fn put(&self, name: &str, data: Bytes) -> Result<u64>;

    /// Remove a stored file; a file that is already gone is not an error
    async fn remove(&self, name: &str) -> Result<()>;
}
