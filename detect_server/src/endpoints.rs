//! Endpoints of HTTP server.
//!
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use common::protocol::{ClassifyResponse, ClassifyUrlReq, ErrorResponse};

use crate::{
    error::{ClassifyError, FetchError, SourceError},
    fetch::{Fetcher, MAX_IMAGE_BYTES},
    meter::METER,
    nn::{InferModel, REMEDIATION_MESSAGE},
    pipeline::classify,
    source::ImageSource,
};

/// Largest accepted request body, leaving room for the multipart framing.
const MAX_UPLOAD_BYTES: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Model shared by all requests, or the marker that loading it failed at startup.
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn InferModel>),
    Unavailable,
}

/// State available to all endpoints.
pub struct AppState {
    model: ModelHandle,
    fetcher: Fetcher,
}

impl AppState {
    pub fn new(model: ModelHandle, fetcher: Fetcher) -> Self {
        Self { model, fetcher }
    }

    fn ready_model(&self) -> Result<Arc<dyn InferModel>, ApiError> {
        match &self.model {
            ModelHandle::Ready(model) => Ok(Arc::clone(model)),
            ModelHandle::Unavailable => Err(ApiError::ModelUnavailable),
        }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(healthcheck))
        .route("/classify", post(classify_upload))
        .route("/classify_url", post(classify_url))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(Arc::new(state)))
}

/// Failure answer of an endpoint.
#[derive(Debug)]
pub enum ApiError {
    ModelUnavailable,
    BadRequest(String),
    Classify(ClassifyError),
    Internal(String),
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        ApiError::Classify(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::ModelUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, REMEDIATION_MESSAGE.to_owned())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Classify(ClassifyError::Source(err)) => {
                log::warn!("Could not load image: {}", &err);
                let status = match &err {
                    SourceError::Fetch(FetchError::Request(_) | FetchError::Status(_)) => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.user_message())
            }
            ApiError::Classify(ClassifyError::Inference(err)) => {
                log::error!("Inference failed: {}", &err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(msg) => {
                log::error!("Internal error: {}", &msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Minimal page to upload a file or take a picture.
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<body>
    <h3>Human detection</h3>
    <form action="/classify" method="post" enctype="multipart/form-data">
        <input type="file" name="image" accept=".jpg,.jpeg,.png,.bmp,.webp">
        <button type="submit">Classify</button>
    </form>
    <form action="/classify" method="post" enctype="multipart/form-data">
        <input type="file" name="camera" accept="image/*" capture="user">
        <button type="submit">Classify camera picture</button>
    </form>
    <p>Remote images: <code>POST /classify_url</code> with <code>{"url": "..."}</code></p>
</body>
</html>
"#,
    )
}

/// Health check endpoint.
pub async fn healthcheck(
    Extension(state): Extension<Arc<AppState>>,
) -> (StatusCode, &'static str) {
    match state.model {
        ModelHandle::Ready(_) => (StatusCode::OK, "healthy"),
        ModelHandle::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "model unavailable"),
    }
}

/// Classify an uploaded file (`image` field) or a camera picture (`camera` field).
pub async fn classify_upload(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ClassifyResponse>, ApiError> {
    state.ready_model()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        let source = match name.as_str() {
            "image" => {
                let filename = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                ImageSource::Upload { bytes, filename }
            }
            "camera" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                ImageSource::Camera(bytes)
            }
            _ => {
                log::debug!("Skipping multipart field {:?}", &name);
                continue;
            }
        };

        return run_classification(&state, source).await;
    }

    Err(ApiError::BadRequest(
        "expected a multipart field `image` or `camera`".to_owned(),
    ))
}

/// Classify the image behind a URL.
pub async fn classify_url(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<ClassifyUrlReq>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    run_classification(&state, ImageSource::Url(req.url)).await
}

async fn run_classification(
    state: &AppState,
    source: ImageSource,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let result = load_and_classify(state, source).await;
    match &result {
        Ok(resp) => METER.tick_verdict(resp.label),
        Err(_) => METER.tick_failed(),
    }

    result.map(Json)
}

async fn load_and_classify(
    state: &AppState,
    source: ImageSource,
) -> Result<ClassifyResponse, ApiError> {
    let model = state.ready_model()?;

    let origin = source.origin();
    let image = source
        .load(&state.fetcher)
        .await
        .map_err(ClassifyError::from)?;

    // Preprocessing and inference are CPU bound
    let verdict = tokio::task::spawn_blocking(move || classify(model.as_ref(), &image))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(ClassifyError::from)?;
    log::info!("Classified {} image: {}", origin, &verdict);

    Ok(verdict.into())
}
