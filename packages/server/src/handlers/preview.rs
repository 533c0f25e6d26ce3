use axum::Json;
use axum::extract::{Multipart, State};
use common::pdf::PDF_MIME;
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::preview::PreviewResponse;
use crate::state::AppState;
use crate::upload::{self, FilePart, multipart_error};

#[utoipa::path(
    post,
    path = "/upload/preview",
    tag = "Admin",
    operation_id = "previewUpload",
    summary = "Probe a PDF without storing it",
    description = "Runs the upload checks and the page count on a `file` part. Nothing is \
        written to storage or the database.",
    request_body(content_type = "multipart/form-data", description = "PDF file"),
    responses(
        (status = 200, description = "Probe result", body = PreviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
        (status = 422, description = "PDF could not be parsed (PDF_PARSE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn preview_upload(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, AppError> {
    let max_bytes = state.config.storage.max_upload_bytes;
    let mut file: Option<FilePart> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            file = Some(upload::read_file_part(field, max_bytes).await?);
        }
    }

    let pdf = upload::validate_pdf(file)?;
    let page_count = common::pdf::page_count(&pdf.bytes)?;
    debug!(page_count, bytes = pdf.bytes.len(), "Probed PDF upload");

    Ok(Json(PreviewResponse {
        page_count,
        detected_type: PDF_MIME.to_string(),
        filename: pdf.file_name,
    }))
}
