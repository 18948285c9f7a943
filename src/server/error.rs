use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{StylizerError, UploadError};

/// Error response body `{"error": <message>}` with its status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a multipart parse failure, keeping 413 for oversized bodies
    pub fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Upload exceeds the maximum allowed size");
        }

        StylizerError::from(UploadError::Malformed {
            reason: err.body_text(),
        })
        .into()
    }
}

impl From<StylizerError> for ApiError {
    fn from(err: StylizerError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self::new(status, err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status, self.message);
        } else {
            warn!("{} {}", self.status, self.message);
        }

        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, StyleError};

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::from(StylizerError::from(UploadError::MissingFile));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.message(), "No image uploaded");

        let unknown = ApiError::from(StylizerError::from(StyleError::Unknown {
            name: "cubism".to_string(),
        }));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let decode = ApiError::from(StylizerError::from(UploadError::DecodeFailed {
            reason: "unexpected EOF".to_string(),
        }));
        assert_eq!(decode.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(decode.message().starts_with("Failed to open/process the image"));

        let backend = ApiError::from(StylizerError::from(GenerationError::EmptyResponse));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(backend.message().starts_with("Image generation failed"));
    }
}
