//! File metadata registry.
//!
//! Records are created once, inside the upload transaction, and never
//! updated. Nothing here touches the blob store.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::entity::file_upload;

/// Fields of a metadata record about to be created.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub file_type: String,
    pub storage_id: String,
    pub size: i64,
}

/// Insert one metadata record.
pub async fn create_file<C: ConnectionTrait>(
    db: &C,
    new_file: NewFile,
) -> Result<file_upload::Model, DbErr> {
    file_upload::ActiveModel {
        id: Set(Uuid::now_v7()),
        file_name: Set(new_file.file_name),
        file_type: Set(new_file.file_type),
        storage_id: Set(new_file.storage_id),
        size: Set(new_file.size),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn get_file<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<file_upload::Model>, DbErr> {
    file_upload::Entity::find_by_id(id).one(db).await
}
