use serde::Serialize;

/// Outcome of one orphan sweep.
#[derive(Debug, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Blobs found in storage.
    #[schema(example = 120)]
    pub scanned: u64,
    /// Unreferenced blobs deleted.
    #[schema(example = 2)]
    pub removed_blobs: u64,
    /// Unlinked metadata rows deleted.
    #[schema(example = 1)]
    pub removed_records: u64,
}
