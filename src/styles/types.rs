use serde::{Deserialize, Serialize};

/// Strength used for caller-supplied prompts under an unknown style name
pub const CUSTOM_STRENGTH: f32 = 0.6;

/// Guidance scale used for caller-supplied prompts under an unknown style name
pub const CUSTOM_GUIDANCE: f32 = 7.5;

/// Generation parameters resolved for a style
///
/// `strength` controls how much of the source structure is discarded (lower
/// values preserve more of the original), `guidance_scale` how strongly the
/// output follows the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub prompt: String,
    pub negative_prompt: String,
    pub strength: f32,
    pub guidance_scale: f32,
    pub use_mask: bool,
}

impl StyleConfig {
    /// Configuration wrapping a free-form prompt with the fixed custom defaults
    pub fn custom<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            strength: CUSTOM_STRENGTH,
            guidance_scale: CUSTOM_GUIDANCE,
            use_mask: false,
        }
    }
}

/// Transformation applied to the generator output before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostProcess {
    /// Keep the generator output as-is
    Passthrough,
    /// Collapse to a single 8-bit luma channel
    Grayscale,
}
