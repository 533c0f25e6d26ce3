//! Orphan sweep.
//!
//! Removes blobs nothing references and metadata rows no magazine links to.
//! Anything younger than the grace period is left alone so in-flight uploads
//! (blob written, transaction not yet committed) are never touched.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use common::storage::BlobStore;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{file_upload, magazine};
use crate::error::AppError;
use crate::models::storage::SweepReport;

pub async fn sweep_orphans(
    store: &dyn BlobStore,
    db: &DatabaseConnection,
    grace: Duration,
) -> Result<SweepReport, AppError> {
    let mut report = SweepReport::default();
    let record_threshold = Utc::now() - chrono::Duration::seconds(grace.as_secs() as i64);
    let blob_threshold = SystemTime::now()
        .checked_sub(grace)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let linked: HashSet<Uuid> = magazine::Entity::find()
        .select_only()
        .column(magazine::Column::FileUploadId)
        .into_tuple::<Option<Uuid>>()
        .all(db)
        .await?
        .into_iter()
        .flatten()
        .collect();

    let files = file_upload::Entity::find().all(db).await?;

    let (stale, kept): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|f| !linked.contains(&f.id) && f.created_at < record_threshold);

    if !stale.is_empty() {
        let result = file_upload::Entity::delete_many()
            .filter(file_upload::Column::Id.is_in(stale.iter().map(|f| f.id)))
            .exec(db)
            .await?;
        report.removed_records = result.rows_affected;
    }

    // Rows that survive keep their blob, linked or not.
    let referenced: HashSet<String> = kept.into_iter().map(|f| f.storage_id).collect();

    for entry in store.list().await? {
        report.scanned += 1;

        if referenced.contains(&entry.id.to_string()) || entry.modified > blob_threshold {
            continue;
        }

        match store.delete(&entry.id, entry.extension).await {
            Ok(true) => report.removed_blobs += 1,
            Ok(false) => {}
            Err(e) => warn!(blob_id = %entry.id, error = %e, "Failed to delete orphaned blob"),
        }
    }

    info!(
        scanned = report.scanned,
        removed_blobs = report.removed_blobs,
        removed_records = report.removed_records,
        "Orphan sweep finished"
    );

    Ok(report)
}
