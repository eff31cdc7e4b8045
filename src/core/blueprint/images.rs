//! Section Image Pipeline
//!
//! Generates an illustration for a section and re-homes it into durable
//! storage. Failures degrade instead of propagating: a failed upload keeps
//! the provider's ephemeral URL, a failed generation yields `None` so the
//! caller omits the image block entirely. Nothing escapes this boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::llm::{AssetStore, ImageOptions, TextGenerator, UploadOptions};

/// Spacing between successive image generations inside one batch, to stay
/// under provider rate limits.
pub const IMAGE_SPACING: Duration = Duration::from_millis(350);

/// A resolved section illustration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub url: String,
    /// True when this is a stock placeholder rather than generated art.
    pub is_placeholder: bool,
    /// False when the durable upload failed and `url` is the provider's
    /// short-lived URL.
    pub persisted: bool,
}

/// Generates and stores section illustrations
pub struct ImagePipeline {
    generator: Arc<dyn TextGenerator>,
    assets: Arc<dyn AssetStore>,
    options: ImageOptions,
    upload: UploadOptions,
}

impl ImagePipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            generator,
            assets,
            options: ImageOptions::default(),
            upload: UploadOptions::default(),
        }
    }

    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate one section image.
    ///
    /// Returns `None` when generation itself fails; the caller should omit
    /// the image block rather than render a broken one.
    pub async fn generate_section_image(&self, prompt: &str, context: &str) -> Option<ImageAsset> {
        let generated = match self.generator.generate_image(prompt, &self.options).await {
            Ok(image) => image,
            Err(e) => {
                warn!(context, error = %e, "image generation failed, omitting image");
                return None;
            }
        };

        // Providers occasionally return junk in the url field; treat that as
        // a failed generation rather than emitting an unloadable block.
        if url::Url::parse(&generated.url).is_err() {
            warn!(context, url = %generated.url, "provider returned invalid image URL");
            return None;
        }

        match self.assets.upload_asset(&generated.url, &self.upload).await {
            Ok(stored) => {
                debug!(context, url = %stored.url, "image generated and stored");
                Some(ImageAsset {
                    url: stored.url,
                    is_placeholder: false,
                    persisted: true,
                })
            }
            Err(e) => {
                warn!(context, error = %e, "asset upload failed, keeping ephemeral URL");
                Some(ImageAsset {
                    url: generated.url,
                    is_placeholder: false,
                    persisted: false,
                })
            }
        }
    }

    /// Pause between successive generations in a batch.
    pub async fn pace(&self) {
        tokio::time::sleep(IMAGE_SPACING).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::core::llm::{
        GeneratedImage, LlmError, Result as LlmResult, StoredAsset, TextOptions,
    };

    struct StubGenerator {
        image: LlmResult<GeneratedImage>,
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate_text(&self, _p: &str, _o: &TextOptions) -> LlmResult<String> {
            Ok("text".into())
        }
        async fn generate_structured(
            &self,
            _s: &str,
            _u: &str,
            _o: &TextOptions,
        ) -> LlmResult<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
        async fn generate_image(&self, _p: &str, _o: &ImageOptions) -> LlmResult<GeneratedImage> {
            match &self.image {
                Ok(img) => Ok(img.clone()),
                Err(_) => Err(LlmError::Generation("stub failure".into())),
            }
        }
    }

    struct StubAssets {
        fail: bool,
    }

    #[async_trait]
    impl AssetStore for StubAssets {
        async fn upload_asset(&self, source: &str, _o: &UploadOptions) -> LlmResult<StoredAsset> {
            if self.fail {
                Err(LlmError::Upload("store unreachable".into()))
            } else {
                Ok(StoredAsset {
                    url: format!("https://cdn.example/{}", source.len()),
                })
            }
        }
    }

    fn generated() -> GeneratedImage {
        GeneratedImage {
            url: "https://provider.example/tmp.png".into(),
            revised_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_success_path_persists() {
        let pipeline = ImagePipeline::new(
            Arc::new(StubGenerator { image: Ok(generated()) }),
            Arc::new(StubAssets { fail: false }),
        );
        let asset = pipeline.generate_section_image("p", "visual").await.unwrap();
        assert!(asset.persisted);
        assert!(asset.url.starts_with("https://cdn.example/"));
    }

    #[tokio::test]
    async fn test_upload_failure_degrades_to_ephemeral_url() {
        let pipeline = ImagePipeline::new(
            Arc::new(StubGenerator { image: Ok(generated()) }),
            Arc::new(StubAssets { fail: true }),
        );
        let asset = pipeline.generate_section_image("p", "visual").await.unwrap();
        assert!(!asset.persisted);
        assert!(!asset.is_placeholder);
        assert_eq!(asset.url, "https://provider.example/tmp.png");
    }

    #[tokio::test]
    async fn test_invalid_provider_url_is_rejected() {
        let pipeline = ImagePipeline::new(
            Arc::new(StubGenerator {
                image: Ok(GeneratedImage {
                    url: "not a url at all".into(),
                    revised_prompt: None,
                }),
            }),
            Arc::new(StubAssets { fail: false }),
        );
        assert!(pipeline.generate_section_image("p", "visual").await.is_none());
    }

    #[tokio::test]
    async fn test_generation_failure_yields_none() {
        let pipeline = ImagePipeline::new(
            Arc::new(StubGenerator {
                image: Err(LlmError::Generation("down".into())),
            }),
            Arc::new(StubAssets { fail: false }),
        );
        assert!(pipeline.generate_section_image("p", "visual").await.is_none());
    }
}
