use std::time::SystemTime;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::id::BlobId;
use super::range::{ByteRange, ResolvedRange};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A reader restricted to one resolved byte range of a blob.
///
/// Dropping it releases the underlying handle.
pub struct OpenedRange {
    pub reader: BoxReader,
    pub range: ResolvedRange,
}

/// A blob found while enumerating the store.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub id: BlobId,
    pub extension: &'static str,
    pub modified: SystemTime,
}

/// Blob storage addressed by opaque identifiers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh identifier and return it.
    ///
    /// The write is atomic: the blob becomes visible fully written or not at all.
    async fn put(&self, data: &[u8], extension: &str) -> Result<BlobId, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, id: &BlobId, extension: &str) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, id: &BlobId, extension: &str) -> Result<u64, StorageError>;

    /// Open a blob for reading the bytes of `range` only.
    async fn open_range(
        &self,
        id: &BlobId,
        extension: &str,
        range: ByteRange,
    ) -> Result<OpenedRange, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, id: &BlobId, extension: &str) -> Result<bool, StorageError>;

    /// Enumerate stored blobs.
    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError>;
}
