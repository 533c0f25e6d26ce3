use super::error::StorageError;

/// A requested byte range, inclusive on both ends.
///
/// `end = None` means "to the end of the blob".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    /// The whole blob.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    /// Resolve against the actual blob size.
    ///
    /// An open or overlong end is clamped to `size - 1`. Fails when `start`
    /// lies past the last byte (which includes every range on an empty blob)
    /// or when `end < start`.
    pub fn resolve(&self, size: u64) -> Result<ResolvedRange, StorageError> {
        if size == 0 || self.start > size - 1 {
            return Err(StorageError::InvalidRange { size });
        }
        let end = self.end.unwrap_or(size - 1).min(size - 1);
        if end < self.start {
            return Err(StorageError::InvalidRange { size });
        }
        Ok(ResolvedRange {
            start: self.start,
            end,
            total: size,
        })
    }
}

/// A range clamped to a concrete blob size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    /// Inclusive.
    pub end: u64,
    pub total: u64,
}

impl ResolvedRange {
    /// Number of bytes covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether the range covers the entire blob.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total
    }

    /// `Content-Range` header value for a 206 response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}
