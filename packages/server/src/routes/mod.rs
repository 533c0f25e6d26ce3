use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::{AppConfig, CorsConfig};
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::magazine::list_published_magazines))
        .routes(routes!(handlers::magazine::get_magazine))
        // The PDF endpoint answers CORS itself: any origin may embed it.
        .routes(routes!(
            handlers::pdf::serve_pdf,
            handlers::pdf::pdf_preflight
        ))
        .routes(routes!(handlers::category::list_categories))
        .nest("/admin", admin_routes(config))
}

fn admin_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let uploads = OpenApiRouter::new()
        .routes(routes!(
            handlers::magazine::create_magazine,
            handlers::magazine::list_magazines
        ))
        .routes(routes!(handlers::magazine::attach_file))
        .routes(routes!(handlers::preview::preview_upload))
        .layer(handlers::magazine::upload_body_limit(&config.storage));

    OpenApiRouter::new()
        .merge(uploads)
        .routes(routes!(handlers::category::create_category))
        .routes(routes!(handlers::storage::sweep_storage))
        .layer(admin_cors(&config.server.cors))
}

/// Credentialed CORS for the admin UI, restricted to configured origins.
fn admin_cors(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age))
}
