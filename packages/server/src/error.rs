use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::pdf::PdfError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable error description, safe to show in the admin UI.
    #[schema(example = "file too large")]
    pub error: String,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNAUTHORIZED`,
    /// `NOT_FOUND`, `STORAGE_INCONSISTENCY`, `RANGE_NOT_SATISFIABLE`, `PDF_PARSE_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthorized,
    NotFound(String),
    /// Metadata references a blob that is missing from storage.
    StorageInconsistency,
    RangeNotSatisfiable {
        size: u64,
    },
    PdfParse(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    code: "VALIDATION_ERROR",
                },
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "admin authentication required".into(),
                    code: "UNAUTHORIZED",
                },
            ),
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorBody {
                        error: msg,
                        code: "NOT_FOUND",
                    },
                )
            }
            AppError::StorageInconsistency => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "file unavailable".into(),
                    code: "STORAGE_INCONSISTENCY",
                },
            ),
            AppError::PdfParse(detail) => {
                tracing::warn!("Rejected unreadable PDF: {}", detail);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody {
                        error: "unreadable PDF".into(),
                        code: "PDF_PARSE_ERROR",
                    },
                )
            }
            AppError::RangeNotSatisfiable { size } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                ErrorBody {
                    error: format!("range not satisfiable for {size} bytes"),
                    code: "RANGE_NOT_SATISFIABLE",
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal error".into(),
                        code: "INTERNAL_ERROR",
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 416 carries no body, only the size of the representation.
        if let AppError::RangeNotSatisfiable { size } = self {
            return (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [
                    (header::CONTENT_RANGE, format!("bytes */{size}")),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
                ],
            )
                .into_response();
        }

        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidRange { size } => AppError::RangeNotSatisfiable { size },
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::MissingHeader => AppError::Validation("unsupported type".into()),
            other => AppError::PdfParse(other.to_string()),
        }
    }
}
