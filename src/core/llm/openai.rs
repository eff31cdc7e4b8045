//! OpenAI-Compatible Provider
//!
//! Implements [`TextGenerator`] against any OpenAI-style HTTP API
//! (chat completions + image generations). Also used as the base for
//! gateway providers that speak the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::client::TextGenerator;
use super::error::{LlmError, Result};
use super::extract::parse_first_json;
use super::types::{GeneratedImage, ImageOptions, TextOptions};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible generation provider
pub struct OpenAiProvider {
    api_key: String,
    text_model: String,
    image_model: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, text_model: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            text_model,
            image_model: "dall-e-3".to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        })
    }

    pub fn gpt4o(api_key: String) -> Result<Self> {
        Self::new(api_key, "gpt-4o".to_string(), None)
    }

    pub fn gpt4o_mini(api_key: String) -> Result<Self> {
        Self::new(api_key, "gpt-4o-mini".to_string(), None)
    }

    /// Override the image model (defaults to dall-e-3).
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    fn build_messages(prompt: &str, opts: &TextOptions) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();
        if let Some(system) = &opts.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));
        messages
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::Auth("Invalid API key".to_string()));
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(resp)
    }

    async fn chat_completion(&self, prompt: &str, opts: &TextOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let messages = Self::build_messages(prompt, opts);

        let mut body = serde_json::json!({
            "model": self.text_model,
            "messages": messages,
        });
        if let Some(max) = opts.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        if let Some(temp) = opts.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let json: serde_json::Value = resp.json().await?;
        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| LlmError::InvalidResponse("Missing content".to_string()))?
            .to_string();

        debug!(
            model = %self.text_model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat completion finished"
        );

        if content.trim().is_empty() {
            return Err(LlmError::Generation("Provider returned empty completion".to_string()));
        }

        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn generate_text(&self, prompt: &str, opts: &TextOptions) -> Result<String> {
        self.chat_completion(prompt, opts).await
    }

    async fn generate_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        opts: &TextOptions,
    ) -> Result<serde_json::Value> {
        let opts = TextOptions {
            system_prompt: Some(system_prompt.to_string()),
            ..opts.clone()
        };
        let content = self.chat_completion(user_prompt, &opts).await?;

        parse_first_json(&content)
            .ok_or_else(|| LlmError::Parse(format!("No JSON in completion ({} chars)", content.len())))
    }

    async fn generate_image(&self, prompt: &str, opts: &ImageOptions) -> Result<GeneratedImage> {
        let url = format!("{}/images/generations", self.base_url);
        let body = serde_json::json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": opts.size.as_dimensions(),
            "quality": opts.quality,
            "style": opts.style,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let json: serde_json::Value = resp.json().await?;
        let first = json["data"]
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| LlmError::InvalidResponse("Missing image data".to_string()))?;

        let image_url = first["url"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("Missing image url".to_string()))?
            .to_string();

        Ok(GeneratedImage {
            url: image_url,
            revised_prompt: first["revised_prompt"].as_str().map(String::from),
        })
    }
}
