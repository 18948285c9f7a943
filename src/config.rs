use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the Stylizer service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Where uploads and generated artifacts are written
    pub storage: StorageConfig,

    /// Generation backend settings
    pub generation: GenerationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.storage.validate()?;
        self.generation.validate()?;
        Ok(())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Externally visible base URL used in responses (derived from the
    /// request's Host header when unset)
    pub public_url: Option<String>,

    /// Maximum accepted request body, in bytes
    pub max_upload_bytes: usize,

    /// Allowed CORS origins; `"*"` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            public_url: None,
            max_upload_bytes: 10 * 1024 * 1024,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.port".to_string(),
                value: self.port.to_string()
            }.into());
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.max_upload_bytes".to_string(),
                value: self.max_upload_bytes.to_string()
            }.into());
        }

        if let Some(url) = &self.public_url {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidValue {
                    key: "server.public_url".to_string(),
                    value: url.clone()
                }.into());
            }
        }

        Ok(())
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for raw uploads, served under `/static/uploads`
    pub upload_dir: PathBuf,

    /// Directory for generated images, served under `/static/generated`
    pub generated_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("static/uploads"),
            generated_dir: PathBuf::from("static/generated"),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey { key: "storage.upload_dir".to_string() }.into());
        }

        if self.generated_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey { key: "storage.generated_dir".to_string() }.into());
        }

        Ok(())
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the Stable Diffusion web API
    pub backend_url: String,

    /// Checkpoint to request from the backend (backend default when unset)
    pub model: Option<String>,

    /// Sampling steps per generation
    pub steps: u32,

    /// Square working resolution uploads are resized to
    pub working_size: u32,

    /// Generations allowed to run at once against the backend
    pub max_concurrent: usize,

    /// Backend request timeout in seconds (unbounded when unset)
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:7860".to_string(),
            model: None,
            steps: 60,
            working_size: 1024,
            max_concurrent: 1,
            timeout_secs: None,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if !is_http_url(&self.backend_url) {
            return Err(ConfigError::InvalidValue {
                key: "generation.backend_url".to_string(),
                value: self.backend_url.clone()
            }.into());
        }

        if self.steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "generation.steps".to_string(),
                value: self.steps.to_string()
            }.into());
        }

        // Latent-space models work on multiples of 8
        if self.working_size == 0 || self.working_size % 8 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "generation.working_size".to_string(),
                value: self.working_size.to_string()
            }.into());
        }

        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "generation.max_concurrent".to_string(),
                value: self.max_concurrent.to_string()
            }.into());
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "generation.timeout_secs".to_string(),
                value: "0".to_string()
            }.into());
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}
