//! HTTP request handlers

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::api::models::{
    DetectResponse, HealthResponse, ImageRequest, RecipesRequest, RecipesResponse,
};
use crate::api::payload::{
    decode_image, image_dimensions, is_multipart, lenient_json, multipart_image,
};
use crate::backend::OcrResult;
use crate::error::{AppError, ErrorResponse};
use crate::pantry::{self, ingredients, Analysis};
use crate::AppState;

const MISSING_IMAGE: &str = "Missing 'image' (base64 string) in request body";
const MISSING_UPLOAD: &str = "No image provided. Send as multipart 'image' or JSON 'image' base64";

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Extract text from an image
#[utoipa::path(
    post,
    path = "/ocr",
    tag = "OCR",
    request_body = ImageRequest,
    responses(
        (status = 200, description = "Recognized text", body = OcrResult),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 502, description = "OCR engine reported an error", body = ErrorResponse),
        (status = 503, description = "OCR engine not configured", body = ErrorResponse),
    )
)]
pub async fn ocr(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<OcrResult>, AppError> {
    let recognizer = state.ocr.as_ref().map_err(AppError::from)?;

    let request: ImageRequest = lenient_json(&body);
    let payload = request
        .image()
        .ok_or_else(|| AppError::InvalidRequest(MISSING_IMAGE.to_string()))?;
    let image = decode_image(payload)?;

    info!(bytes = image.len(), "Received OCR request");

    let result = recognizer.recognize(&image).await?;

    info!(blocks = result.blocks.len(), chars = result.text.len(), "OCR completed");

    Ok(Json(result))
}

/// Run object detection on an uploaded or base64 image
#[utoipa::path(
    post,
    path = "/detect",
    tag = "Detection",
    request_body(
        content = ImageRequest,
        description = "JSON base64 image, or multipart/form-data with an `image` or `file` part"
    ),
    responses(
        (status = 200, description = "Detections", body = DetectResponse),
        (status = 400, description = "No image or invalid base64", body = ErrorResponse),
        (status = 500, description = "Detection failed", body = ErrorResponse),
    )
)]
pub async fn detect(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<DetectResponse>, AppError> {
    let multipart_upload = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, is_multipart);

    let uploaded = if multipart_upload {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
        multipart_image(multipart).await?
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
        let parsed: ImageRequest = lenient_json(&body);
        parsed.image().map(decode_image).transpose()?
    };

    let image = uploaded.ok_or_else(|| AppError::InvalidRequest(MISSING_UPLOAD.to_string()))?;
    let (width, height) = image_dimensions(&image)?;

    info!(
        width,
        height,
        multipart = multipart_upload,
        model = %state.detector.model(),
        "Received detection request"
    );

    let detections = state.detector.detect(&image).await?;

    info!(detections = detections.len(), "Detection completed");

    Ok(Json(DetectResponse {
        detections,
        width,
        height,
    }))
}

/// Detect ingredients, estimate shelf life and suggest recipes
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "Pantry",
    request_body = ImageRequest,
    responses(
        (status = 200, description = "Ingredient analysis", body = Analysis),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse),
    )
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Analysis>, AppError> {
    let request: ImageRequest = lenient_json(&body);
    let payload = request
        .image()
        .ok_or_else(|| AppError::InvalidRequest(MISSING_IMAGE.to_string()))?;
    let image = decode_image(payload)?;
    image_dimensions(&image)?;

    info!(bytes = image.len(), "Received analyze request");

    let analysis =
        pantry::analyze_image(state.detector.as_ref(), state.recipes.as_ref(), &image).await?;

    info!(
        ingredients = analysis.ingredients.len(),
        recipes = analysis.recipes.len(),
        "Analysis completed"
    );

    Ok(Json(analysis))
}

/// Suggest recipes for a supplied ingredient list
#[utoipa::path(
    post,
    path = "/recipes",
    tag = "Pantry",
    request_body = RecipesRequest,
    responses(
        (status = 200, description = "Recipe ideas", body = RecipesResponse),
        (status = 400, description = "No valid ingredients", body = ErrorResponse),
    )
)]
pub async fn recipes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RecipesResponse>, AppError> {
    let request: RecipesRequest = lenient_json(&body);
    let raw = request.ingredients.ok_or_else(|| {
        AppError::InvalidRequest("Provide 'ingredients' as an array of strings".to_string())
    })?;

    let ingredients = ingredients::normalize(&raw);
    if ingredients.is_empty() {
        return Err(AppError::InvalidRequest(
            "No valid ingredients provided".to_string(),
        ));
    }

    info!(ingredients = ?ingredients, "Received recipes request");

    let recipes = pantry::suggest_for_ingredients(state.recipes.as_ref(), &ingredients).await;

    Ok(Json(RecipesResponse { recipes }))
}
