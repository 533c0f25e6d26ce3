use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{file_upload, magazine};
use crate::error::AppError;
use crate::models::category::CategoryResponse;
use crate::upload::MagazineDraft;

/// Public URL of a magazine's PDF. Clients only ever see this, never a path.
pub fn pdf_url(magazine_id: Uuid) -> String {
    format!("/api/magazines/{magazine_id}/pdf")
}

/// File attached to a magazine.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    /// File metadata ID (UUIDv7).
    pub id: Uuid,
    /// Original upload filename.
    #[schema(example = "report.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub file_type: String,
    /// Range-capable endpoint serving the file.
    #[schema(example = "/api/magazines/01936f0e-1234-7abc-8000-000000000001/pdf")]
    pub file_url: String,
    /// Size in bytes.
    #[schema(example = 1048576)]
    pub size: i64,
}

impl FileUploadResponse {
    pub fn new(file: file_upload::Model, magazine_id: Uuid) -> Self {
        Self {
            id: file.id,
            file_name: file.file_name,
            file_type: file.file_type,
            file_url: pdf_url(magazine_id),
            size: file.size,
        }
    }
}

/// Magazine with its file and categories.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagazineResponse {
    pub id: Uuid,
    #[schema(example = "Spring Issue")]
    pub title: String,
    #[schema(example = "Editorial Board")]
    pub author: String,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    /// `DRAFT` or `PUBLISHED`.
    #[schema(example = "PUBLISHED")]
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub read_count: i64,
    pub file_upload: Option<FileUploadResponse>,
    pub categories: Vec<CategoryResponse>,
    /// Page count measured at upload. Only present on upload responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 48)]
    pub page_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl MagazineResponse {
    pub fn new(
        model: magazine::Model,
        file: Option<file_upload::Model>,
        categories: Vec<CategoryResponse>,
    ) -> Self {
        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            description: model.description,
            cover_image_url: model.cover_image_url,
            status: model.status,
            published_at: model.published_at,
            read_count: model.read_count,
            file_upload: file.map(|f| FileUploadResponse::new(f, model.id)),
            categories,
            page_count: None,
            created_at: model.created_at,
        }
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MagazineListResponse {
    pub data: Vec<MagazineResponse>,
    pub total: u64,
}

/// Text fields of the multipart create form, as received.
#[derive(Debug, Default)]
pub struct MagazineForm {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<String>,
    pub category_ids: Vec<String>,
}

impl MagazineForm {
    /// Record one text field. Unknown fields are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = Some(value),
            "author" => self.author = Some(value),
            "description" => self.description = Some(value),
            "cover_image_url" => self.cover_image_url = Some(value),
            "status" => self.status = Some(value),
            "published_at" => self.published_at = Some(value),
            "category_ids" => self.category_ids.push(value),
            _ => {}
        }
    }

    /// Validate the business fields.
    ///
    /// Category existence is checked separately against the database.
    pub fn into_draft(self) -> Result<MagazineDraft, AppError> {
        let title = self.title.unwrap_or_default().trim().to_string();
        validate_title(&title)?;

        let author = self.author.unwrap_or_default().trim().to_string();
        if author.is_empty() {
            return Err(AppError::Validation("Author is required".into()));
        }
        if author.chars().count() > 256 {
            return Err(AppError::Validation("Author must be at most 256 characters".into()));
        }

        let cover_image_url = non_blank(self.cover_image_url)
            .ok_or_else(|| AppError::Validation("Cover image is required".into()))?;

        let status = match non_blank(self.status).as_deref() {
            None => magazine::STATUS_DRAFT.to_string(),
            Some(s) if s == magazine::STATUS_DRAFT || s == magazine::STATUS_PUBLISHED => {
                s.to_string()
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "Status must be DRAFT or PUBLISHED".into(),
                ));
            }
        };

        let published_at = non_blank(self.published_at)
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        AppError::Validation("published_at must be an RFC 3339 timestamp".into())
                    })
            })
            .transpose()?;

        let mut category_ids = self
            .category_ids
            .iter()
            .map(|raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::Validation(format!("Invalid category id: {raw}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        category_ids.sort_unstable();
        category_ids.dedup();
        if category_ids.is_empty() {
            return Err(AppError::Validation(
                "At least one category is required".into(),
            ));
        }

        Ok(MagazineDraft {
            title,
            author,
            description: non_blank(self.description),
            cover_image_url: Some(cover_image_url),
            status,
            published_at,
            category_ids,
        })
    }
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
