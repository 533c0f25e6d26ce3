use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::pdf::{PDF_EXTENSION, PDF_MIME};
use common::storage::{BlobId, ByteRange, StorageError};
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use tokio_util::io::ReaderStream;
use tracing::{error, instrument, warn};

use crate::entity::{file_upload, magazine};
use crate::error::{AppError, ErrorBody};
use crate::handlers::magazine::find_magazine;
use crate::registry;
use crate::state::AppState;
use crate::utils::filename::inline_content_disposition;
use crate::utils::range::{MalformedRange, parse_range_header};

/// Headers a cross-origin viewer needs to read to drive range requests.
const EXPOSED_HEADERS: &str = "Accept-Ranges, Content-Range, Content-Length, Content-Type";

#[utoipa::path(
    get,
    path = "/magazines/{id}/pdf",
    tag = "Magazines",
    operation_id = "getMagazinePdf",
    summary = "Stream a magazine's PDF",
    description = "Serves the attached PDF with HTTP byte-range support. Without a `Range` header \
        the whole file is returned with 200. A single `bytes=<start>-<end?>` range yields 206; \
        suffix, multi-range or out-of-bounds ranges yield 416 with `Content-Range: bytes */<size>`.",
    params(
        ("id" = String, Path, description = "Magazine ID (UUID)"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. `bytes=0-1023`"),
    ),
    responses(
        (status = 200, description = "Whole file", content_type = "application/pdf"),
        (status = 206, description = "Requested byte range", content_type = "application/pdf"),
        (status = 404, description = "Magazine, file or blob not found (NOT_FOUND, STORAGE_INCONSISTENCY)", body = ErrorBody),
        (status = 416, description = "Range not satisfiable"),
    ),
)]
#[instrument(skip(state, headers), fields(magazine_id = %id))]
pub async fn serve_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let magazine = find_magazine(&state.db, &id).await?;
    let file = attached_file(&state.db, &magazine).await?;

    let blob_id = BlobId::parse(&file.storage_id).map_err(|e| {
        AppError::Internal(format!("file {} has a corrupt storage id: {e}", file.id))
    })?;

    if !state.blob_store.exists(&blob_id, PDF_EXTENSION).await? {
        return Err(missing_blob(&file));
    }

    let requested = match headers.get(header::RANGE) {
        None => None,
        Some(value) => match value
            .to_str()
            .map_err(|_| MalformedRange)
            .and_then(parse_range_header)
        {
            Ok(range) => range,
            Err(MalformedRange) => {
                let size = state
                    .blob_store
                    .size(&blob_id, PDF_EXTENSION)
                    .await
                    .map_err(|e| blob_error(e, &file))?;
                return Err(AppError::RangeNotSatisfiable { size });
            }
        },
    };
    let partial = requested.is_some();

    let opened = state
        .blob_store
        .open_range(
            &blob_id,
            PDF_EXTENSION,
            requested.unwrap_or_else(ByteRange::full),
        )
        .await
        .map_err(|e| blob_error(e, &file))?;
    let range = opened.range;

    let mut builder = Response::builder()
        .status(if partial {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        })
        .header(header::CONTENT_TYPE, served_content_type(&file))
        .header(header::CONTENT_LENGTH, range.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            inline_content_disposition(&file.file_name),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CACHE_CONTROL,
            format!("private, max-age={}", state.config.storage.cache_max_age_secs),
        )
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, EXPOSED_HEADERS);
    if partial {
        builder = builder.header(header::CONTENT_RANGE, range.content_range());
    }

    let response = builder
        .body(Body::from_stream(ReaderStream::new(opened.reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    record_read(&state.db, magazine).await;

    Ok(response)
}

#[utoipa::path(
    options,
    path = "/magazines/{id}/pdf",
    tag = "Magazines",
    operation_id = "preflightMagazinePdf",
    summary = "CORS preflight for the PDF endpoint",
    params(("id" = String, Path, description = "Magazine ID (UUID)")),
    responses((status = 200, description = "Preflight accepted")),
)]
pub async fn pdf_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Range"),
        ],
    )
}

async fn attached_file(
    db: &DatabaseConnection,
    magazine: &magazine::Model,
) -> Result<file_upload::Model, AppError> {
    let file = match magazine.file_upload_id {
        Some(file_id) => registry::get_file(db, file_id).await?,
        None => None,
    };
    file.ok_or_else(|| AppError::NotFound("no file for this entity".into()))
}

/// Everything this endpoint serves is a PDF, whatever the stored name says.
fn served_content_type(file: &file_upload::Model) -> &'static str {
    let guessed = mime_guess::from_path(&file.file_name).first_raw();
    if guessed != Some(PDF_MIME) || file.file_type != PDF_MIME {
        warn!(
            file_id = %file.id,
            file_name = %file.file_name,
            file_type = %file.file_type,
            "Stored file is not labelled as a PDF; serving it as one"
        );
    }
    PDF_MIME
}

fn missing_blob(file: &file_upload::Model) -> AppError {
    error!(
        file_id = %file.id,
        storage_id = %file.storage_id,
        "File metadata references a blob that is missing from storage"
    );
    AppError::StorageInconsistency
}

/// The blob can vanish between the existence check and the open.
fn blob_error(err: StorageError, file: &file_upload::Model) -> AppError {
    match err {
        StorageError::NotFound(_) => missing_blob(file),
        other => other.into(),
    }
}

/// Bump the view counter. Concurrent readers may overwrite each other's
/// increment; the response never depends on this succeeding.
async fn record_read(db: &DatabaseConnection, magazine: magazine::Model) {
    let magazine_id = magazine.id;
    let next = magazine.read_count.saturating_add(1);

    let mut active = magazine.into_active_model();
    active.read_count = Set(next);
    if let Err(e) = active.update(db).await {
        warn!(magazine_id = %magazine_id, error = %e, "Failed to record magazine read");
    }
}
