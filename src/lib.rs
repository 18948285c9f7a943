//! # Stylizer
//!
//! Turn portrait photos into stylized renditions (anime, manga, pop art and
//! more) through an img2img diffusion backend.
//!
//! This library provides the style registry, image normalization and
//! masking, the generation seam and the HTTP service that ties them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stylizer::{
//!     config::Config,
//!     generation::{LimitedGenerator, StableDiffusionApi},
//!     pipeline::Upload,
//!     storage::ArtifactStore,
//!     TransformEngine,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let backend = StableDiffusionApi::new(&config.generation.backend_url, None, None)?;
//! let generator = Arc::new(LimitedGenerator::new(Arc::new(backend), 1));
//! let store = ArtifactStore::from_config(&config.storage)?;
//!
//! let engine = TransformEngine::new(generator, store, &config.generation);
//! let upload = Upload::new("portrait.png", std::fs::read("portrait.png")?).with_style("manga");
//! let artifact = engine.process_upload(upload, "http://localhost:5000").await?;
//! println!("{}", artifact.url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`styles`] - Style presets and custom prompt resolution
//! - [`imaging`] - Normalization, face mask and post-processing
//! - [`generation`] - The img2img backend seam and its HTTP implementation
//! - [`pipeline`] - The per-request transform engine
//! - [`storage`] - Upload and artifact files on disk
//! - [`server`] - The axum HTTP surface
//! - [`config`] - Configuration management

pub mod config;
pub mod error;
pub mod generation;
pub mod imaging;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod styles;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, StylizerError},
    generation::ImageGenerator,
    pipeline::TransformEngine,
    styles::{Style, StyleRegistry},
};
