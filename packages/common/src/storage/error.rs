use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The requested byte range lies outside the blob.
    #[error("range not satisfiable for a blob of {size} bytes")]
    InvalidRange { size: u64 },

    /// The extension is not one of the accepted blob extensions.
    #[error("unsupported blob extension: {0:?}")]
    InvalidExtension(String),

    /// The identifier is not a valid blob identifier.
    #[error("invalid blob identifier: {0}")]
    InvalidId(String),

    /// Writing a blob failed (disk full, permissions, I/O).
    #[error("storage write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Reading or inspecting a blob failed.
    #[error("storage read failed: {0}")]
    Read(#[source] std::io::Error),
}
