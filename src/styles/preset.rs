use serde::{Deserialize, Serialize};

use crate::styles::types::{PostProcess, StyleConfig};

/// Built-in styles with fixed generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    Anime,
    Manga,
    Real,
    PopArt,
    Watercolor,
    OilPaint,
}

impl StylePreset {
    /// Every built-in preset, in display order
    pub const ALL: [StylePreset; 6] = [
        StylePreset::Anime,
        StylePreset::Manga,
        StylePreset::Real,
        StylePreset::PopArt,
        StylePreset::Watercolor,
        StylePreset::OilPaint,
    ];

    /// Registry key, also used in generated filenames
    pub fn name(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
            Self::Real => "real",
            Self::PopArt => "popart",
            Self::Watercolor => "watercolor",
            Self::OilPaint => "oilpaint",
        }
    }

    /// One-line summary shown by `stylizer styles`
    pub fn description(&self) -> &'static str {
        match self {
            Self::Anime => "Ghibli-like anime portrait, face region guided by a mask",
            Self::Manga => "High contrast black and white manga line art",
            Self::Real => "Light photo-realistic touch-up that keeps the original",
            Self::PopArt => "Lichtenstein-style pop art with halftones and bold outlines",
            Self::Watercolor => "Soft watercolor painting with pastel transitions",
            Self::OilPaint => "Renaissance oil painting with visible brushstrokes",
        }
    }

    /// Generation parameters for this preset
    pub fn config(&self) -> StyleConfig {
        match self {
            Self::Anime => StyleConfig {
                prompt: "anime portrait, highly detailed face, studio ghibli style, \
                         natural skin tones, maintain original likeness, expressive eyes, \
                         vibrant colors, 8k resolution, sharp focus"
                    .to_string(),
                negative_prompt: "ugly, deformed face, unrealistic eyes, distorted features"
                    .to_string(),
                strength: 0.55,
                guidance_scale: 7.5,
                use_mask: true,
            },
            Self::Manga => StyleConfig {
                prompt: "1-bit black and white manga style, no color, line art, \
                         extremely high contrast, thick black outlines, halftone shading, \
                         vintage manga vibe, negative space"
                    .to_string(),
                negative_prompt:
                    "color, pastel, vibrant, bright, realistic, 3d, painting, oil, watercolor"
                        .to_string(),
                strength: 0.45,
                guidance_scale: 8.0,
                use_mask: false,
            },
            Self::Real => StyleConfig {
                prompt: "photo-realistic, preserve details, neutral lighting".to_string(),
                negative_prompt: String::new(),
                strength: 0.1,
                guidance_scale: 3.0,
                use_mask: false,
            },
            Self::PopArt => StyleConfig {
                prompt: "pop art style, bright colors, bold lines, reminiscent of Roy Lichtenstein, \
                         stylized shading, halftone patterns, black outlines, cartoonish vibe"
                    .to_string(),
                negative_prompt: "ugly, out of frame, distorted, realism".to_string(),
                strength: 0.6,
                guidance_scale: 7.5,
                use_mask: false,
            },
            Self::Watercolor => StyleConfig {
                prompt: "watercolor painting style, soft edges, fluid brushstrokes, \
                         subtle color transitions, airy aesthetic, gentle blending, \
                         bright pastel palette"
                    .to_string(),
                negative_prompt: "digital, photorealistic, glitch, text".to_string(),
                strength: 0.6,
                guidance_scale: 7.0,
                use_mask: false,
            },
            Self::OilPaint => StyleConfig {
                prompt: "oil painting style, reminiscent of classical renaissance painting, \
                         rich detail, luminous color transitions, visible brushstrokes, \
                         strong chiaroscuro, highly detailed face"
                    .to_string(),
                negative_prompt: "digital, glitch, text, cartoon".to_string(),
                strength: 0.65,
                guidance_scale: 7.5,
                use_mask: false,
            },
        }
    }

    pub fn post_process(&self) -> PostProcess {
        match self {
            Self::Manga => PostProcess::Grayscale,
            _ => PostProcess::Passthrough,
        }
    }
}

impl std::fmt::Display for StylePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
