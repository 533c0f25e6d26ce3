use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use super::error::StorageError;
use super::id::{BlobId, normalize_extension};
use super::range::ByteRange;
use super::traits::{BlobEntry, BlobStore, OpenedRange};

const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs live flat under the root as `{root}/{uuid}{ext}`. Writes go to
/// `{root}/.tmp/` first and are renamed into place.
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the root if needed.
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await.map_err(StorageError::Write)?;
        fs::create_dir_all(root.join(TEMP_DIR))
            .await
            .map_err(StorageError::Write)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the filesystem path for a blob.
    fn blob_path(&self, id: &BlobId, extension: &str) -> Result<PathBuf, StorageError> {
        let ext = normalize_extension(extension)?;
        Ok(self.root.join(format!("{id}{ext}")))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn open(&self, id: &BlobId, path: &Path) -> Result<fs::File, StorageError> {
        match fs::File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(StorageError::Read(e)),
        }
    }
}

async fn write_temp(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8], extension: &str) -> Result<BlobId, StorageError> {
        let id = BlobId::generate();
        let blob_path = self.blob_path(&id, extension)?;

        // The temp dir may have been removed by an operator since startup.
        fs::create_dir_all(self.root.join(TEMP_DIR))
            .await
            .map_err(StorageError::Write)?;

        let temp_path = self.temp_path();
        if let Err(e) = write_temp(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Write(e));
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Write(e));
        }

        debug!(blob_id = %id, bytes = data.len(), "Stored blob");
        Ok(id)
    }

    async fn exists(&self, id: &BlobId, extension: &str) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(id, extension)?;
        fs::try_exists(&blob_path).await.map_err(StorageError::Read)
    }

    async fn size(&self, id: &BlobId, extension: &str) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(id, extension)?;
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(StorageError::Read(e)),
        }
    }

    async fn open_range(
        &self,
        id: &BlobId,
        extension: &str,
        range: ByteRange,
    ) -> Result<OpenedRange, StorageError> {
        let blob_path = self.blob_path(id, extension)?;
        let mut file = self.open(id, &blob_path).await?;

        // Size from the open handle, so a concurrent replace can't skew it.
        let size = file.metadata().await.map_err(StorageError::Read)?.len();
        let resolved = range.resolve(size)?;

        if resolved.start > 0 {
            file.seek(SeekFrom::Start(resolved.start))
                .await
                .map_err(StorageError::Read)?;
        }

        Ok(OpenedRange {
            reader: Box::new(file.take(resolved.len())),
            range: resolved,
        })
    }

    async fn delete(&self, id: &BlobId, extension: &str) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(id, extension)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Write(e)),
        }
    }

    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await.map_err(StorageError::Read)?;

        while let Some(entry) = dir.next_entry().await.map_err(StorageError::Read)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            // Skips the temp dir and anything not written by this store.
            let Some((stem, ext)) = name.rsplit_once('.') else {
                continue;
            };
            let (Ok(id), Ok(extension)) = (BlobId::parse(stem), normalize_extension(ext)) else {
                continue;
            };
            let meta = entry.metadata().await.map_err(StorageError::Read)?;
            if !meta.is_file() {
                continue;
            }
            entries.push(BlobEntry {
                id,
                extension,
                modified: meta.modified().map_err(StorageError::Read)?,
            });
        }

        Ok(entries)
    }
}
