use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::category;
use crate::error::AppError;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    /// Display name, unique across categories.
    #[schema(example = "Science")]
    pub name: String,
}

impl CreateCategoryRequest {
    /// Returns the trimmed name.
    pub fn validate(&self) -> Result<String, AppError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 128 {
            return Err(AppError::Validation(
                "Category name must be 1-128 characters".into(),
            ));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Science")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
