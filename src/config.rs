use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::blueprint::factory::DiversityCaps;
use crate::core::blueprint::pipeline::PipelineConfig;
use crate::core::blueprint::prompts::MAX_PROMPT_CHARS;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub provider: ProviderConfig,
}

/// Generation tuning for the lesson pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generation attempts per primary block.
    pub max_attempts: u32,
    /// Quality score that stops further attempts early.
    pub excellent_score: u8,
    /// Hard prompt-length ceiling in characters.
    pub max_prompt_chars: usize,
    /// Enable the richer prompt preamble.
    pub enhanced_prompts: bool,
}

/// Provider endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Chat model identifier.
    pub text_model: String,
    /// Override for the API base URL (OpenAI-compatible).
    pub base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            excellent_score: 85,
            max_prompt_chars: MAX_PROMPT_CHARS,
            enhanced_prompts: true,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            text_model: "gpt-4o-mini".to_string(),
            base_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/lessonforge/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path (used by tests).
    pub fn load_from(config_path: &std::path::Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lessonforge")
            .join("config.toml")
    }

    /// Derive the explicit per-run pipeline configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_attempts: self.generation.max_attempts,
            excellent_score: self.generation.excellent_score,
            max_prompt_chars: self.generation.max_prompt_chars,
            enhanced_prompts: self.generation.enhanced_prompts,
            caps: DiversityCaps::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = AppConfig::load_from(std::path::Path::new("/nonexistent/config.toml"));
        assert_eq!(config.generation.max_attempts, 2);
        assert_eq!(config.provider.text_model, "gpt-4o-mini");
    }

    #[test]
    fn test_defaults_when_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not [valid toml").unwrap();
        let config = AppConfig::load_from(file.path());
        assert_eq!(config.generation.excellent_score, 85);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nmax_attempts = 3").unwrap();
        let config = AppConfig::load_from(file.path());
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.generation.excellent_score, 85);
        assert!(config.generation.enhanced_prompts);
    }

    #[test]
    fn test_pipeline_config_mirrors_generation() {
        let config = AppConfig::default();
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.max_attempts, config.generation.max_attempts);
        assert_eq!(pipeline.excellent_score, config.generation.excellent_score);
    }
}
