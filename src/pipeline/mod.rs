//! # Transform Pipeline
//!
//! Takes one uploaded photo from raw bytes to a stored, styled artifact.
//! Image work runs on the blocking pool; the backend call is awaited.

pub mod engine;
pub mod types;

pub use engine::TransformEngine;
pub use types::{GeneratedArtifact, Upload, DEFAULT_STYLE};
