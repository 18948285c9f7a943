use std::path::PathBuf;

use serde::Serialize;

/// Style used when the request carries no `style` field
pub const DEFAULT_STYLE: &str = "anime";

/// A parsed upload request, before any validation
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Client filename of the `file` part, `None` when the part is absent
    pub filename: Option<String>,

    /// Raw bytes of the `file` part
    pub bytes: Vec<u8>,

    /// Requested style name (`None` means the default style)
    pub style: Option<String>,

    /// Free-form prompt for styles the registry does not know
    pub custom_prompt: Option<String>,
}

impl Upload {
    pub fn new<S: Into<String>>(filename: S, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            bytes,
            style: None,
            custom_prompt: None,
        }
    }

    pub fn with_style<S: Into<String>>(mut self, style: S) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_custom_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    /// Requested style name, falling back to [`DEFAULT_STYLE`]
    pub fn style_name(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE)
    }
}

/// A generated image persisted for a request
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedArtifact {
    /// Lowercased style name the image was generated with
    pub style: String,

    /// Stored file name, `generated_<style>_<filename>`
    pub file_name: String,

    /// Location on disk
    pub path: PathBuf,

    /// Public URL of the stored file
    pub url: String,
}
