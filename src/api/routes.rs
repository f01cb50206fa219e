//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use crate::backend::{Detection, OcrBlock, OcrResult};
use crate::error::ErrorResponse;
use crate::pantry::{Analysis, ShelfLife};
use crate::recipes::Recipe;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pantry Lens API",
        version = "0.1.0",
        description = "Ingredient detection, shelf-life estimates, recipe ideas and OCR for food images.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        handlers::health_check,
        handlers::ocr,
        handlers::detect,
        handlers::analyze,
        handlers::recipes,
    ),
    components(schemas(
        ImageRequest,
        RecipesRequest,
        DetectResponse,
        RecipesResponse,
        HealthResponse,
        ErrorResponse,
        Detection,
        OcrResult,
        OcrBlock,
        Analysis,
        ShelfLife,
        Recipe,
    )),
    tags(
        (name = "Pantry", description = "Ingredient analysis and recipe endpoints"),
        (name = "Detection", description = "Object detection endpoints"),
        (name = "OCR", description = "Text extraction endpoints"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let body_limit = state.settings.server.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ocr", post(handlers::ocr))
        .route("/detect", post(handlers::detect))
        .route("/analyze", post(handlers::analyze))
        .route("/recipes", post(handlers::recipes))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        // Add shared state
        .with_state(state)
        .layer(CorsLayer::permissive())
        // Add tracing layer with a per-request id
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}
