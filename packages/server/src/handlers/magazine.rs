use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::instrument;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entity::{category, file_upload, magazine, magazine_category};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::category::CategoryResponse;
use crate::models::magazine::{MagazineForm, MagazineListResponse, MagazineResponse};
use crate::state::AppState;
use crate::upload::{self, FilePart, LinkTarget, multipart_error};

/// Room for multipart framing and the text fields around the file part.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Body limit for routes accepting a PDF upload.
pub fn upload_body_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    let limit = storage.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/magazines",
    tag = "Admin",
    operation_id = "createMagazine",
    summary = "Create a magazine with its PDF",
    description = "Multipart form: `title`, `author`, `description?`, `cover_image_url`, \
        `status?` (`DRAFT` | `PUBLISHED`), `published_at?` (RFC 3339), `category_ids` \
        (repeatable) and the `file` part (`application/pdf`). The PDF is stored, then the \
        metadata row, magazine and category links are written in one transaction.",
    request_body(content_type = "multipart/form-data", description = "Magazine fields and PDF file"),
    responses(
        (status = 200, description = "Magazine created", body = MagazineResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
        (status = 422, description = "PDF could not be parsed (PDF_PARSE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, admin, multipart),
    fields(admin_id = admin.user_id, admin_name = %admin.username)
)]
pub async fn create_magazine(
    admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MagazineResponse>, AppError> {
    let max_bytes = state.config.storage.max_upload_bytes;
    let mut form = MagazineForm::default();
    let mut file: Option<FilePart> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => file = Some(upload::read_file_part(field, max_bytes).await?),
            Some(name) => {
                let value = field.text().await.map_err(multipart_error)?;
                form.set(name, value);
            }
            None => {}
        }
    }

    let pdf = upload::validate_pdf(file)?;
    let draft = form.into_draft()?;
    ensure_categories_exist(&state.db, &draft.category_ids).await?;

    let page_count = common::pdf::page_count(&pdf.bytes)?;

    let stored =
        upload::store_pdf(&state, &pdf, LinkTarget::Create(draft), admin.user_id).await?;

    let response = load_magazine_response(&state.db, stored.magazine)
        .await?
        .with_page_count(page_count);

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/magazines/{id}/file",
    tag = "Admin",
    operation_id = "attachMagazineFile",
    summary = "Attach or replace a magazine's PDF",
    description = "Multipart form with a single `file` part. The previous file, if any, stays \
        in storage unlinked until the next orphan sweep.",
    params(("id" = String, Path, description = "Magazine ID (UUID)")),
    request_body(content_type = "multipart/form-data", description = "PDF file"),
    responses(
        (status = 200, description = "File attached", body = MagazineResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Magazine not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "PDF could not be parsed (PDF_PARSE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, admin, multipart),
    fields(admin_id = admin.user_id, admin_name = %admin.username, magazine_id = %id)
)]
pub async fn attach_file(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<MagazineResponse>, AppError> {
    let magazine = find_magazine(&state.db, &id).await?;

    let max_bytes = state.config.storage.max_upload_bytes;
    let mut file: Option<FilePart> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            file = Some(upload::read_file_part(field, max_bytes).await?);
        }
    }

    let pdf = upload::validate_pdf(file)?;
    let page_count = common::pdf::page_count(&pdf.bytes)?;

    let stored =
        upload::store_pdf(&state, &pdf, LinkTarget::Attach(magazine.id), admin.user_id).await?;

    let response = load_magazine_response(&state.db, stored.magazine)
        .await?
        .with_page_count(page_count);

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/magazines",
    tag = "Admin",
    operation_id = "listAllMagazines",
    summary = "List all magazines",
    description = "Returns every magazine regardless of status, newest first.",
    responses(
        (status = 200, description = "Magazine list", body = MagazineListResponse),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_magazines(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<MagazineListResponse>, AppError> {
    let magazines = magazine::Entity::find()
        .order_by_desc(magazine::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let data = hydrate_magazines(&state.db, magazines).await?;
    let total = data.len() as u64;
    Ok(Json(MagazineListResponse { data, total }))
}

#[utoipa::path(
    get,
    path = "/magazines",
    tag = "Magazines",
    operation_id = "listPublishedMagazines",
    summary = "List published magazines",
    description = "Returns magazines with status `PUBLISHED`, newest first.",
    responses((status = 200, description = "Magazine list", body = MagazineListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_published_magazines(
    State(state): State<AppState>,
) -> Result<Json<MagazineListResponse>, AppError> {
    let magazines = magazine::Entity::find()
        .filter(magazine::Column::Status.eq(magazine::STATUS_PUBLISHED))
        .order_by_desc(magazine::Column::PublishedAt)
        .order_by_desc(magazine::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let data = hydrate_magazines(&state.db, magazines).await?;
    let total = data.len() as u64;
    Ok(Json(MagazineListResponse { data, total }))
}

#[utoipa::path(
    get,
    path = "/magazines/{id}",
    tag = "Magazines",
    operation_id = "getMagazine",
    summary = "Get a magazine",
    params(("id" = String, Path, description = "Magazine ID (UUID)")),
    responses(
        (status = 200, description = "Magazine", body = MagazineResponse),
        (status = 404, description = "Magazine not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(magazine_id = %id))]
pub async fn get_magazine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MagazineResponse>, AppError> {
    let magazine = find_magazine(&state.db, &id).await?;
    Ok(Json(load_magazine_response(&state.db, magazine).await?))
}

/// Look up a magazine by its textual id. A malformed id is just "not found".
pub async fn find_magazine<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<magazine::Model, AppError> {
    let id = Uuid::parse_str(id).map_err(|_| AppError::NotFound("not found".into()))?;
    magazine::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("not found".into()))
}

async fn ensure_categories_exist<C: ConnectionTrait>(
    db: &C,
    category_ids: &[i32],
) -> Result<(), AppError> {
    let found = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids.iter().copied()))
        .all(db)
        .await?;

    if let Some(missing) = category_ids
        .iter()
        .find(|id| !found.iter().any(|c| c.id == **id))
    {
        return Err(AppError::Validation(format!(
            "Category {missing} does not exist"
        )));
    }
    Ok(())
}

async fn load_magazine_response<C: ConnectionTrait>(
    db: &C,
    magazine: magazine::Model,
) -> Result<MagazineResponse, AppError> {
    hydrate_magazines(db, vec![magazine])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("magazine hydration returned nothing".into()))
}

/// Attach files and categories to a batch of magazines, preserving order.
async fn hydrate_magazines<C: ConnectionTrait>(
    db: &C,
    magazines: Vec<magazine::Model>,
) -> Result<Vec<MagazineResponse>, AppError> {
    if magazines.is_empty() {
        return Ok(Vec::new());
    }

    let file_ids: Vec<Uuid> = magazines.iter().filter_map(|m| m.file_upload_id).collect();
    let mut files: HashMap<Uuid, file_upload::Model> = if file_ids.is_empty() {
        HashMap::new()
    } else {
        file_upload::Entity::find()
            .filter(file_upload::Column::Id.is_in(file_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect()
    };

    let links = magazine_category::Entity::find()
        .filter(magazine_category::Column::MagazineId.is_in(magazines.iter().map(|m| m.id)))
        .all(db)
        .await?;

    let mut category_ids: Vec<i32> = links.iter().map(|l| l.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let mut by_magazine: HashMap<Uuid, Vec<CategoryResponse>> = HashMap::new();
    for link in links {
        if let Some(category) = categories.get(&link.category_id) {
            by_magazine
                .entry(link.magazine_id)
                .or_default()
                .push(CategoryResponse::from(category.clone()));
        }
    }

    Ok(magazines
        .into_iter()
        .map(|m| {
            // Several magazines never share a file, so taking it out is fine.
            let file = m.file_upload_id.and_then(|id| files.remove(&id));
            let mut cats = by_magazine.remove(&m.id).unwrap_or_default();
            cats.sort_by_key(|c| c.id);
            MagazineResponse::new(m, file, cats)
        })
        .collect())
}
