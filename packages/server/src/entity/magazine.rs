use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_DRAFT: &str = "DRAFT";
pub const STATUS_PUBLISHED: &str = "PUBLISHED";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "magazine")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    pub author: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub cover_image_url: Option<String>,

    /// `DRAFT` or `PUBLISHED`.
    pub status: String,

    pub published_at: Option<DateTimeUtc>,

    /// Best-effort view counter; lost updates are tolerated.
    pub read_count: i64,

    /// At most one file per magazine; `None` until a PDF is attached.
    pub file_upload_id: Option<Uuid>,

    /// User id of the admin who created the record.
    pub uploaded_by: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
