//! # Generation Backends
//!
//! The img2img model is an external collaborator. This module defines the
//! seam the pipeline talks to ([`ImageGenerator`]), an HTTP backend for
//! AUTOMATIC1111-compatible servers, and a limiter that makes the
//! concurrent-access policy explicit.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stylizer::generation::{ImageGenerator, LimitedGenerator, StableDiffusionApi};
//!
//! # fn main() -> stylizer::Result<()> {
//! let backend = StableDiffusionApi::new("http://127.0.0.1:7860", None, None)?;
//! // One generation at a time against the shared model
//! let generator: Arc<dyn ImageGenerator> = Arc::new(LimitedGenerator::new(Arc::new(backend), 1));
//! # let _ = generator;
//! # Ok(())
//! # }
//! ```

pub mod limiter;
pub mod sd_api;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::Result;

pub use limiter::LimitedGenerator;
pub use sd_api::StableDiffusionApi;

/// Everything the backend needs for a single img2img call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    /// Normalized RGB source at the working resolution
    pub image: RgbImage,
    /// Same-size mask; white marks the region to repaint
    pub mask: Option<GrayImage>,
    pub strength: f32,
    pub guidance_scale: f32,
    pub steps: u32,
}

/// A black-box image-to-image capability
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Short backend identifier for logs
    fn name(&self) -> &str;

    /// Run one generation and return the first output image
    async fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage>;
}
