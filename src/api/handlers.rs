//! API request handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::state::ApiState;
use crate::caption::{resolve_caption, PlaceholderCaptioner};
use crate::dataset::{Category, Contributor, DatasetError, SubmissionRecord};
use crate::translation::{Language, TranslationError};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" if server is responding
    pub status: String,
    /// API version
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false for errors
    pub ok: bool,
    /// Error message
    pub error: String,
}

/// A supported caption language.
#[derive(Debug, Serialize, ToSchema)]
pub struct LanguageInfo {
    /// Display name accepted by the translate endpoint
    pub name: String,
    /// NLLB-200 language code
    pub code: String,
}

/// Supported languages and form defaults.
#[derive(Debug, Serialize, ToSchema)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
    pub default_source: String,
    pub default_target: String,
}

/// Image categories.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// Caption translation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TranslateRequest {
    /// Caption text
    pub text: String,
    /// Source language display name (unknown names translate as English)
    pub source_lang: String,
    /// Target language display name (unknown names translate to Hindi)
    pub target_lang: String,
}

/// Caption translation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TranslateResponse {
    pub ok: bool,
    pub translated_caption: String,
}

/// Language pair for translating a submission's caption.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CaptionTranslation {
    pub source_lang: String,
    pub target_lang: String,
}

/// A complete submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmissionRequest {
    pub name: String,
    pub email: String,
    pub location: String,
    /// Consent to use the data for open-source AI research
    pub consent: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Caption in the contributor's language
    #[serde(default)]
    pub caption: Option<String>,
    /// Use the placeholder caption generator when no caption is given
    #[serde(default)]
    pub generate_caption: bool,
    /// Translate the caption before storing it
    #[serde(default)]
    pub translate: Option<CaptionTranslation>,
    /// Image bytes, base64 encoded (standard alphabet)
    pub image_base64: String,
}

/// Where a submission was stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub ok: bool,
    pub image_ref: String,
    /// Stored image file name
    pub image_file: String,
    /// 0-based data row index
    pub row_index: usize,
    pub timestamp: String,
    pub caption: String,
    pub translated_caption: String,
}

fn error(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: message.to_string(),
        }),
    )
}

fn translation_error(err: TranslationError) -> ApiError {
    let status = match err {
        TranslationError::EmptyText => StatusCode::BAD_REQUEST,
        TranslationError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TranslationError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error(status, err)
}

fn dataset_error(err: DatasetError) -> ApiError {
    let status = match err {
        DatasetError::Validation(_) => StatusCode::BAD_REQUEST,
        DatasetError::StorageWrite { .. } | DatasetError::StoreCorrupt { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error(status, err)
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Worker task failed: {}", err),
    )
}

/// Load the translator if needed and translate on a blocking thread.
async fn run_translation(
    state: &ApiState,
    text: String,
    source_lang: String,
    target_lang: String,
) -> Result<String, ApiError> {
    let shared = state.translator;
    let config = state.translation.clone();
    tokio::task::spawn_blocking(move || {
        shared
            .get_or_load_nllb(&config)?
            .translate(&text, &source_lang, &target_lang)
    })
    .await
    .map_err(join_error)?
    .map_err(translation_error)
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List caption languages.
#[utoipa::path(
    get,
    path = "/api/v1/languages",
    responses(
        (status = 200, description = "Supported languages", body = LanguagesResponse)
    ),
    tag = "Translation"
)]
pub async fn list_languages(State(state): State<ApiState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: Language::ALL
            .iter()
            .map(|l| LanguageInfo {
                name: l.display_name().to_string(),
                code: l.nllb_code().to_string(),
            })
            .collect(),
        default_source: state.translation.source_language.clone(),
        default_target: state.translation.target_language.clone(),
    })
}

/// List image categories.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Image categories", body = CategoriesResponse)
    ),
    tag = "Dataset"
)]
pub async fn list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: Category::ALL.to_vec(),
    })
}

/// Translate a caption.
///
/// The model is loaded on the first request.
#[utoipa::path(
    post,
    path = "/api/v1/translate",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translated caption", body = TranslateResponse),
        (status = 400, description = "Empty text", body = ErrorResponse),
        (status = 500, description = "Inference failed", body = ErrorResponse),
        (status = 503, description = "Model not available", body = ErrorResponse)
    ),
    tag = "Translation"
)]
pub async fn translate(
    State(state): State<ApiState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let translated_caption =
        run_translation(&state, request.text, request.source_lang, request.target_lang).await?;

    Ok(Json(TranslateResponse {
        ok: true,
        translated_caption,
    }))
}

/// Record a submission.
///
/// Stores the image and appends one row to the dataset. When `translate` is
/// set the caption is translated first; a translation failure rejects the
/// whole submission.
#[utoipa::path(
    post,
    path = "/api/v1/submissions",
    request_body = SubmissionRequest,
    responses(
        (status = 200, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
        (status = 503, description = "Translation model not available", body = ErrorResponse)
    ),
    tag = "Dataset"
)]
pub async fn submit(
    State(state): State<ApiState>,
    Json(request): Json<SubmissionRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let image = STANDARD
        .decode(request.image_base64.trim())
        .map_err(|e| error(StatusCode::BAD_REQUEST, format!("Invalid image_base64: {}", e)))?;

    let caption = resolve_caption(
        request.caption.as_deref(),
        request.generate_caption,
        &PlaceholderCaptioner,
        &image,
    );

    let mut record = SubmissionRecord {
        contributor: Contributor {
            name: request.name,
            email: request.email,
            location: request.location,
        },
        consent: request.consent,
        title: request.title,
        description: request.description,
        category: request.category,
        latitude: request.latitude,
        longitude: request.longitude,
        caption,
        translated_caption: String::new(),
    };

    // Reject bad submissions before the model is loaded
    state.store.validate(&record, &image).map_err(dataset_error)?;

    if let Some(pair) = request.translate {
        if !record.caption.is_empty() {
            record.translated_caption = run_translation(
                &state,
                record.caption.clone(),
                pair.source_lang,
                pair.target_lang,
            )
            .await?;
        }
    }

    let store = state.store.clone();
    let (record, stored) = tokio::task::spawn_blocking(move || {
        let stored = store.append_record(&record, &image);
        (record, stored)
    })
    .await
    .map_err(join_error)?;
    let stored = stored.map_err(dataset_error)?;

    Ok(Json(SubmissionResponse {
        ok: true,
        image_ref: stored.image_ref.to_string(),
        image_file: stored
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        row_index: stored.row_index,
        timestamp: stored.timestamp,
        caption: record.caption,
        translated_caption: record.translated_caption,
    }))
}

/// Download the dataset CSV, byte for byte.
#[utoipa::path(
    get,
    path = "/api/v1/export",
    responses(
        (status = 200, description = "Dataset CSV", content_type = "text/csv", body = String),
        (status = 500, description = "Store unreadable", body = ErrorResponse)
    ),
    tag = "Dataset"
)]
pub async fn export(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let store = state.store.clone();
    let bytes = tokio::task::spawn_blocking(move || store.export())
        .await
        .map_err(join_error)?
        .map_err(dataset_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"captions.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
