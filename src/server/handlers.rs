use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header::HOST, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{StylizerError, UploadError},
    pipeline::Upload,
    server::{error::ApiError, AppState},
};

/// Body of `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Body of a successful `POST /uploads`
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub generated_image: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "API is running".to_string(),
    })
}

/// Accept a multipart upload and answer with the generated image URL
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // A body that is not multipart carries no file part
    let multipart = multipart.map_err(|rejection| {
        debug!("Rejected upload body: {}", rejection.body_text());
        ApiError::from(StylizerError::from(UploadError::MissingFile))
    })?;

    let upload = read_upload(multipart).await?;
    let base_url = state.base_url(host_header(&headers));

    let artifact = state.engine.process_upload(upload, &base_url).await?;

    Ok(Json(UploadResponse {
        generated_image: artifact.url,
    }))
}

/// Collect the `file`, `style` and `customPrompt` parts of the form
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;
                upload.filename = Some(filename);
                upload.bytes = bytes.to_vec();
            }
            "style" => {
                upload.style = Some(field.text().await.map_err(ApiError::from_multipart)?);
            }
            "customPrompt" => {
                upload.custom_prompt = Some(field.text().await.map_err(ApiError::from_multipart)?);
            }
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(upload)
}

fn host_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
}
