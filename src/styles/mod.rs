//! # Style System
//!
//! Maps a requested style name onto the generation parameters sent to the
//! img2img backend and the post-process applied to its output.
//!
//! ## Built-in Styles
//!
//! - **anime**: Ghibli-like portrait, mask-guided around the face region
//! - **manga**: Black and white line art, converted to grayscale afterwards
//! - **real**: Gentle photo-realistic pass that keeps most of the source
//! - **popart**: Halftones, bold outlines, bright colors
//! - **watercolor**: Soft edges and pastel blending
//! - **oilpaint**: Classical oil painting with strong chiaroscuro
//!
//! Any other name is accepted only together with a custom prompt, which is
//! then sent with fixed default parameters.
//!
//! ## Usage
//!
//! ```rust
//! use stylizer::styles::{Style, StylePreset, StyleRegistry};
//!
//! let registry = StyleRegistry::new();
//! let style = registry.resolve("Manga", None).unwrap();
//! assert_eq!(style, Style::Preset(StylePreset::Manga));
//!
//! let custom = registry.resolve("noir", Some("film noir portrait")).unwrap();
//! assert_eq!(custom.config().strength, 0.6);
//! ```

pub mod preset;
pub mod registry;
pub mod types;

// Re-exports for convenience
pub use preset::StylePreset;
pub use registry::{Style, StyleRegistry};
pub use types::{PostProcess, StyleConfig, CUSTOM_GUIDANCE, CUSTOM_STRENGTH};
