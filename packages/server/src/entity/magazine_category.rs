use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "magazine_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub magazine_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i32,
}

impl ActiveModelBehavior for ActiveModel {}
