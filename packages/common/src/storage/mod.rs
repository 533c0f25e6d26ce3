mod error;
mod id;
mod range;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use id::{ACCEPTED_EXTENSIONS, BlobId, normalize_extension};
pub use range::{ByteRange, ResolvedRange};
pub use traits::{BlobEntry, BlobStore, BoxReader, OpenedRange};
