//! Generation Request/Response Types
//!
//! Options and result types shared by every `TextGenerator` implementation.

use serde::{Deserialize, Serialize};

// ============================================================================
// Text Generation
// ============================================================================

/// Options for a single text generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(1024),
            temperature: Some(0.7),
            system_prompt: None,
        }
    }
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

// ============================================================================
// Image Generation
// ============================================================================

/// Requested image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    Square,
    Landscape,
    Portrait,
}

impl ImageSize {
    /// Provider-facing dimension string.
    pub fn as_dimensions(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }
}

/// Options for a single image generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOptions {
    pub size: ImageSize,
    /// Provider quality tier ("standard", "hd")
    pub quality: String,
    /// Rendering style hint ("natural", "vivid")
    pub style: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size: ImageSize::Landscape,
            quality: "standard".to_string(),
            style: "natural".to_string(),
        }
    }
}

impl ImageOptions {
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }
}

/// A freshly generated image, addressed by a provider URL.
///
/// Provider URLs are typically short-lived; callers are expected to re-home
/// the image through an [`AssetStore`](super::client::AssetStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

// ============================================================================
// Asset Upload
// ============================================================================

/// Options for re-homing an asset into durable storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Whether the stored asset should be publicly addressable.
    pub public: bool,
    /// Logical folder/prefix inside the asset store.
    pub folder: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            public: true,
            folder: "lesson-images".to_string(),
        }
    }
}

/// A durably stored asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAsset {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_options_builder() {
        let opts = TextOptions::new()
            .with_max_tokens(2048)
            .with_temperature(0.4)
            .with_system_prompt("You are a curriculum designer.");

        assert_eq!(opts.max_tokens, Some(2048));
        assert_eq!(opts.temperature, Some(0.4));
        assert!(opts.system_prompt.unwrap().contains("curriculum"));
    }

    #[test]
    fn test_image_size_dimensions() {
        assert_eq!(ImageSize::Square.as_dimensions(), "1024x1024");
        assert_eq!(ImageSize::Landscape.as_dimensions(), "1792x1024");
    }
}
