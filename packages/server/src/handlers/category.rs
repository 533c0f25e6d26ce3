use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};

use crate::entity::category;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::models::category::{CategoryResponse, CreateCategoryRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    responses((status = 200, description = "Categories ordered by name", body = Vec<CategoryResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Admin",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, admin, payload),
    fields(admin_id = admin.user_id, admin_name = %admin.username)
)]
pub async fn create_category(
    admin: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.validate()?;

    let existing = category::Entity::find()
        .filter(category::Column::Name.eq(&name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Category '{name}' already exists"
        )));
    }

    let created = category::ActiveModel {
        name: Set(name),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(category_id = created.id, "Created category");

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}
