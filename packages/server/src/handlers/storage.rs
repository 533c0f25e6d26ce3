use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::storage::SweepReport;
use crate::state::AppState;
use crate::sweep::sweep_orphans;

#[utoipa::path(
    post,
    path = "/storage/sweep",
    tag = "Admin",
    operation_id = "sweepOrphans",
    summary = "Remove orphaned blobs and metadata",
    description = "Deletes stored PDFs no metadata row references and metadata rows no \
        magazine links to. Anything younger than `storage.orphan_grace_secs` is kept.",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 401, description = "Not an authenticated admin (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, admin),
    fields(admin_id = admin.user_id, admin_name = %admin.username)
)]
pub async fn sweep_storage(
    admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<SweepReport>, AppError> {
    let report = sweep_orphans(
        &*state.blob_store,
        &state.db,
        state.config.storage.orphan_grace(),
    )
    .await?;
    Ok(Json(report))
}
