use std::collections::HashMap;

use crate::{
    error::{Result, StyleError},
    styles::{PostProcess, StyleConfig, StylePreset},
};

/// A style resolved for a single request
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    /// One of the built-in presets
    Preset(StylePreset),
    /// Caller-supplied prompt under a name the registry does not know
    Custom { name: String, prompt: String },
}

impl Style {
    /// Lowercased style name as requested by the caller
    pub fn name(&self) -> &str {
        match self {
            Style::Preset(preset) => preset.name(),
            Style::Custom { name, .. } => name,
        }
    }

    pub fn config(&self) -> StyleConfig {
        match self {
            Style::Preset(preset) => preset.config(),
            Style::Custom { prompt, .. } => StyleConfig::custom(prompt.clone()),
        }
    }

    pub fn post_process(&self) -> PostProcess {
        match self {
            Style::Preset(preset) => preset.post_process(),
            Style::Custom { .. } => PostProcess::Passthrough,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Style::Custom { .. })
    }
}

/// Registry of the built-in style presets
///
/// Lookups are case-insensitive. Names the registry does not know are only
/// accepted when the caller supplies a non-blank custom prompt.
pub struct StyleRegistry {
    styles: HashMap<String, StylePreset>,
}

impl StyleRegistry {
    /// Create a new style registry with all built-in styles
    pub fn new() -> Self {
        let styles = StylePreset::ALL
            .into_iter()
            .map(|preset| (preset.name().to_string(), preset))
            .collect();

        Self { styles }
    }

    /// Get a preset by name
    pub fn get_style(&self, name: &str) -> Option<StylePreset> {
        self.styles.get(&name.to_lowercase()).copied()
    }

    /// Resolve a request's style name and optional custom prompt
    ///
    /// Known names win over the custom prompt. An unknown name with a blank or
    /// missing custom prompt fails with [`StyleError::Unknown`].
    pub fn resolve(&self, name: &str, custom_prompt: Option<&str>) -> Result<Style> {
        let name = name.to_lowercase();

        if let Some(preset) = self.styles.get(&name) {
            return Ok(Style::Preset(*preset));
        }

        match custom_prompt.map(str::trim).filter(|prompt| !prompt.is_empty()) {
            Some(prompt) => Ok(Style::Custom {
                name,
                prompt: prompt.to_string(),
            }),
            None => Err(StyleError::Unknown { name }.into()),
        }
    }

    /// Get all available style names, in display order
    pub fn available_styles(&self) -> Vec<String> {
        StylePreset::ALL
            .iter()
            .filter(|preset| self.styles.contains_key(preset.name()))
            .map(|preset| preset.name().to_string())
            .collect()
    }

    /// Check if a style is available
    pub fn has_style(&self, name: &str) -> bool {
        self.styles.contains_key(&name.to_lowercase())
    }

    /// Get the number of registered styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
