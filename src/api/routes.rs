//! API router setup with Swagger UI and middleware.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    self, export, health, list_categories, list_languages, submit, translate,
    CaptionTranslation, CategoriesResponse, ErrorResponse, HealthResponse, LanguageInfo,
    LanguagesResponse, SubmissionRequest, SubmissionResponse, TranslateRequest,
    TranslateResponse,
};
use super::state::ApiState;
use crate::config::ApiConfig;
use crate::dataset::Category;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Describe This API",
        version = "1.0.0",
        description = "Collect captioned images for an open multilingual image-caption dataset",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::health,
        handlers::list_languages,
        handlers::list_categories,
        handlers::translate,
        handlers::submit,
        handlers::export,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            LanguageInfo,
            LanguagesResponse,
            CategoriesResponse,
            Category,
            TranslateRequest,
            TranslateResponse,
            CaptionTranslation,
            SubmissionRequest,
            SubmissionResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Translation", description = "Caption translation endpoints"),
        (name = "Dataset", description = "Submission and export endpoints"),
    )
)]
struct ApiDoc;

/// Build the CORS layer from the configured origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Same-origin only
        CorsLayer::new()
    } else if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Create the API router with all routes and middleware.
pub fn create_router(state: ApiState, config: &ApiConfig) -> Router {
    let body_limit = state.max_body_bytes();

    let mut router = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/languages", get(list_languages))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/translate", post(translate))
        .route("/api/v1/submissions", post(submit))
        .route("/api/v1/export", get(export))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    if config.swagger_ui {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_all_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/health",
            "/api/v1/languages",
            "/api/v1/categories",
            "/api/v1/translate",
            "/api/v1/submissions",
            "/api/v1/export",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
