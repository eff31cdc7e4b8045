//! Capability Traits
//!
//! The three external capabilities the content pipeline consumes:
//! - `TextGenerator`: AI text, structured JSON, and image generation
//! - `AssetStore`: durable re-homing of generated assets
//! - `LessonStore`: persistence of a finished lesson document
//!
//! Everything above this layer is written against these traits so that the
//! pipeline can run against stub implementations in tests.

use async_trait::async_trait;

use super::error::Result;
use super::types::{GeneratedImage, ImageOptions, StoredAsset, TextOptions, UploadOptions};
use crate::core::blueprint::blocks::ContentBlock;

/// Trait implemented by every AI generation provider
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free-form text for a prompt.
    ///
    /// Fails with [`LlmError::Generation`](super::error::LlmError::Generation)
    /// when the provider errors or returns an empty completion.
    async fn generate_text(&self, prompt: &str, opts: &TextOptions) -> Result<String>;

    /// Generate a structured JSON value.
    ///
    /// Implementations extract the first JSON payload from the completion and
    /// fail with [`LlmError::Parse`](super::error::LlmError::Parse) when none
    /// is recoverable.
    async fn generate_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        opts: &TextOptions,
    ) -> Result<serde_json::Value>;

    /// Generate an image and return its (likely ephemeral) provider URL.
    async fn generate_image(&self, prompt: &str, opts: &ImageOptions) -> Result<GeneratedImage>;
}

/// Opaque asset-storage capability
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Copy the asset at `source_url` into durable storage.
    async fn upload_asset(&self, source_url: &str, opts: &UploadOptions) -> Result<StoredAsset>;
}

/// Persistence boundary for finished lessons
///
/// The block list is passed as the complete ordered document; partial saves
/// are not part of the contract.
#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn save_lesson_content(&self, lesson_id: &str, blocks: &[ContentBlock]) -> Result<()>;
}
