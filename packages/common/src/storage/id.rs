use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// Extensions a blob may be stored under, including the leading dot.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".pdf"];

/// Opaque identifier of a stored blob.
///
/// Always a freshly generated UUIDv4, never derived from user input. Values
/// read back from the database are re-parsed before being turned into paths.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(Uuid);

impl BlobId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a stored identifier string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| StorageError::InvalidId(s.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Serialize for BlobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Normalize a suggested extension (`"pdf"`, `".PDF"`) to its canonical
/// dotted form, rejecting anything outside [`ACCEPTED_EXTENSIONS`].
pub fn normalize_extension(ext: &str) -> Result<&'static str, StorageError> {
    let trimmed = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    ACCEPTED_EXTENSIONS
        .iter()
        .copied()
        .find(|accepted| accepted[1..] == trimmed)
        .ok_or_else(|| StorageError::InvalidExtension(ext.to_string()))
}
