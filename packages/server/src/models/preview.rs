use serde::Serialize;

/// Result of probing an upload without storing it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[schema(example = 48)]
    pub page_count: u32,
    #[schema(example = "application/pdf")]
    pub detected_type: String,
    #[schema(example = "report.pdf")]
    pub filename: String,
}
