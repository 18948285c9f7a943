use thiserror::Error;

/// Main error type for the Stylizer library
#[derive(Error, Debug)]
pub enum StylizerError {
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Style error: {0}")]
    Style(#[from] StyleError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Problems with the uploaded file or the multipart body carrying it
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No image uploaded")]
    MissingFile,

    #[error("Invalid file: {filename}")]
    DisallowedType { filename: String },

    #[error("Failed to open/process the image: {reason}")]
    DecodeFailed { reason: String },

    #[error("Malformed upload: {reason}")]
    Malformed { reason: String },
}

/// Style resolution errors
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Unknown style '{name}' and no customPrompt provided")]
    Unknown { name: String },
}

/// Failures raised by, or while talking to, the generation backend
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Backend request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("Backend response invalid: {reason}")]
    InvalidResponse { reason: String },

    #[error("Backend returned no images")]
    EmptyResponse,
}

/// Upload and artifact persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to encode {format} image: {reason}")]
    EncodeFailed { format: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StylizerError
pub type Result<T> = std::result::Result<T, StylizerError>;

impl StylizerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether the caller caused this error (missing file, bad type, unknown style)
    ///
    /// Decode failures are not included; an upload that passed the extension
    /// check but cannot be opened is reported as a processing error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Upload(
                UploadError::MissingFile
                    | UploadError::DisallowedType { .. }
                    | UploadError::Malformed { .. }
            ) | Self::Style(StyleError::Unknown { .. })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Upload(UploadError::DisallowedType { .. }) => {
                "Invalid file: only png, jpg and jpeg images are accepted".to_string()
            }
            Self::Upload(err) => err.to_string(),
            Self::Style(err) => err.to_string(),
            Self::Generation(err) => format!("Image generation failed: {}", err),
            Self::Storage(err) => format!("Image generation failed: {}", err),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(StylizerError::from(UploadError::MissingFile).is_client_error());
        assert!(StylizerError::from(UploadError::DisallowedType {
            filename: "notes.txt".to_string()
        })
        .is_client_error());
        assert!(StylizerError::from(StyleError::Unknown {
            name: "cubism".to_string()
        })
        .is_client_error());
    }

    #[test]
    fn test_server_errors() {
        assert!(!StylizerError::from(UploadError::DecodeFailed {
            reason: "truncated".to_string()
        })
        .is_client_error());
        assert!(!StylizerError::from(GenerationError::EmptyResponse).is_client_error());
        assert!(!StylizerError::generic("boom").is_client_error());
    }

    #[test]
    fn test_unknown_style_message_names_style() {
        let err = StylizerError::from(StyleError::Unknown {
            name: "cubism".to_string(),
        });
        assert!(err.user_message().contains("'cubism'"));
    }

    #[test]
    fn test_generation_message_prefix() {
        let err = StylizerError::from(GenerationError::BackendStatus {
            status: 503,
            body: "busy".to_string(),
        });
        let message = err.user_message();
        assert!(message.starts_with("Image generation failed"));
        assert!(message.contains("503"));
    }
}
