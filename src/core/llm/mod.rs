//! LLM Capability Module
//!
//! Provides the generation capabilities the lesson pipeline consumes:
//! - `client`: the `TextGenerator` / `AssetStore` / `LessonStore` traits
//! - `openai`: an OpenAI-compatible HTTP provider
//! - `extract`: defensive JSON extraction from model output
//! - `error`: the shared error taxonomy

pub mod client;
pub mod error;
pub mod extract;
pub mod openai;
pub mod types;

pub use client::{AssetStore, LessonStore, TextGenerator};
pub use error::{LlmError, Result};
pub use openai::OpenAiProvider;
pub use types::{
    GeneratedImage, ImageOptions, ImageSize, StoredAsset, TextOptions, UploadOptions,
};
