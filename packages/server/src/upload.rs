//! Upload pipeline.
//!
//! One multipart file part becomes one blob, one `file_upload` row and one
//! link from a magazine. The blob is always written before any metadata, so a
//! failure can leave at most an orphaned blob, never metadata pointing at
//! nothing. Orphans from failed transactions are removed on the spot.

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::pdf::{PDF_EXTENSION, PDF_MIME, has_pdf_magic};
use common::storage::{BlobId, BlobStore, normalize_extension};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, TransactionTrait,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entity::{file_upload, magazine, magazine_category};
use crate::error::AppError;
use crate::registry::{self, NewFile};
use crate::state::AppState;
use crate::utils::filename::validate_display_filename;

/// A `file` multipart part, buffered up to the size ceiling.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// The part was larger than the ceiling; `bytes` is incomplete.
    pub oversized: bool,
}

/// An upload that passed every file-level check.
#[derive(Debug)]
pub struct ValidatedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Business fields of a magazine being created alongside its file.
#[derive(Debug, Clone)]
pub struct MagazineDraft {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category_ids: Vec<i32>,
}

/// Which magazine the new file gets linked to.
#[derive(Debug)]
pub enum LinkTarget {
    Create(MagazineDraft),
    Attach(Uuid),
}

/// Result of a committed upload.
#[derive(Debug)]
pub struct StoredUpload {
    pub magazine: magazine::Model,
    pub file: file_upload::Model,
}

/// Map a multipart read failure to a client error.
pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("file too large".into())
    } else {
        AppError::Validation(format!("Multipart error: {}", err.body_text()))
    }
}

/// Buffer a `file` part, stopping as soon as it exceeds `max_bytes`.
///
/// Parts declaring a type other than PDF are not read at all; they fail
/// validation regardless of their content.
pub async fn read_file_part(mut field: Field<'_>, max_bytes: u64) -> Result<FilePart, AppError> {
    let file_name = field.file_name().map(str::to_owned);
    let content_type = field.content_type().map(str::to_owned);

    let mut bytes = Vec::new();
    let mut oversized = false;

    if content_type.as_deref() == Some(PDF_MIME) {
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                oversized = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }
    }

    Ok(FilePart {
        file_name,
        content_type,
        bytes,
        oversized,
    })
}

/// Apply the file checks in order; the first failure wins.
///
/// 1. part present, 2. declared type is PDF, 3. within the size ceiling,
/// 4. content starts with `%PDF-`, 5. display name is safe and ends in `.pdf`.
pub fn validate_pdf(part: Option<FilePart>) -> Result<ValidatedPdf, AppError> {
    let part = part.ok_or_else(|| AppError::Validation("file required".into()))?;

    if part.content_type.as_deref() != Some(PDF_MIME) {
        return Err(AppError::Validation("unsupported type".into()));
    }

    if part.oversized {
        return Err(AppError::Validation("file too large".into()));
    }

    if !has_pdf_magic(&part.bytes) {
        return Err(AppError::Validation("unsupported type".into()));
    }

    let file_name = part
        .file_name
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let file_name = validate_display_filename(&file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    // The display name later travels back in Content-Disposition.
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if normalize_extension(extension).is_err() {
        return Err(AppError::Validation("unsupported type".into()));
    }

    Ok(ValidatedPdf {
        file_name,
        bytes: part.bytes,
    })
}

/// Write the blob, then link it in one bounded transaction.
///
/// On transaction failure or timeout the freshly written blob is deleted and
/// the transaction error is returned.
pub async fn store_pdf(
    state: &AppState,
    pdf: &ValidatedPdf,
    target: LinkTarget,
    uploaded_by: i32,
) -> Result<StoredUpload, AppError> {
    let blob_id = state.blob_store.put(&pdf.bytes, PDF_EXTENSION).await?;

    let new_file = NewFile {
        file_name: pdf.file_name.clone(),
        file_type: PDF_MIME.to_string(),
        storage_id: blob_id.to_string(),
        size: i64::try_from(pdf.bytes.len()).unwrap_or(i64::MAX),
    };

    let budget = state.config.storage.transaction_timeout();
    let failure =
        match tokio::time::timeout(budget, link_file(&state.db, new_file, target, uploaded_by))
            .await
        {
            Ok(Ok(stored)) => {
                info!(
                    magazine_id = %stored.magazine.id,
                    file_id = %stored.file.id,
                    bytes = stored.file.size,
                    "Stored magazine PDF"
                );
                return Ok(stored);
            }
            Ok(Err(e)) => e,
            Err(_) => AppError::Internal(format!("upload transaction exceeded {budget:?}")),
        };

    discard_blob(&*state.blob_store, &blob_id).await;
    Err(failure)
}

async fn link_file(
    db: &DatabaseConnection,
    new_file: NewFile,
    target: LinkTarget,
    uploaded_by: i32,
) -> Result<StoredUpload, AppError> {
    let txn = db.begin().await?;

    let file = registry::create_file(&txn, new_file).await?;

    let magazine = match target {
        LinkTarget::Create(draft) => {
            let created = magazine::ActiveModel {
                id: Set(Uuid::now_v7()),
                title: Set(draft.title),
                author: Set(draft.author),
                description: Set(draft.description),
                cover_image_url: Set(draft.cover_image_url),
                status: Set(draft.status),
                published_at: Set(draft.published_at),
                read_count: Set(0),
                file_upload_id: Set(Some(file.id)),
                uploaded_by: Set(uploaded_by),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;

            for category_id in draft.category_ids {
                magazine_category::Entity::insert(magazine_category::ActiveModel {
                    magazine_id: Set(created.id),
                    category_id: Set(category_id),
                })
                .exec_without_returning(&txn)
                .await?;
            }
            created
        }
        LinkTarget::Attach(magazine_id) => {
            let existing = magazine::Entity::find_by_id(magazine_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("not found".into()))?;

            // Concurrent attaches are not deduplicated: last commit wins and
            // the loser's row is left for the sweep.
            let mut active = existing.into_active_model();
            active.file_upload_id = Set(Some(file.id));
            active.update(&txn).await?
        }
    };

    txn.commit().await?;

    Ok(StoredUpload { magazine, file })
}

async fn discard_blob(store: &dyn BlobStore, blob_id: &BlobId) {
    match store.delete(blob_id, PDF_EXTENSION).await {
        Ok(_) => warn!(blob_id = %blob_id, "Removed blob orphaned by a failed upload"),
        Err(e) => error!(
            blob_id = %blob_id,
            error = %e,
            "Failed to remove orphaned blob; leaving it for the sweep"
        ),
    }
}
