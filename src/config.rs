//! Runtime configuration
//!
//! Prompts, model identifiers and transport settings come from an optional
//! JSON file; the API key comes from the CLI or environment. The resolved
//! [`AppConfig`] is handed to the dispatcher once and never mutated.

use crate::ai::prompts::{DEFAULT_DESCRIPTION_PROMPT, DEFAULT_SUMMARY_PROMPT, DEFAULT_SYSTEM_PROMPT};
use crate::ai::{http_client::DEFAULT_TIMEOUT_SECS, OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "prompts/prompts.json";

/// Default cap on estimated tokens for text input
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 128_000;

/// Default completion budget for image descriptions
pub const DEFAULT_IMAGE_MAX_TOKENS: u32 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Prompts for one content kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptSet {
    pub summary: String,
    pub description: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            summary: DEFAULT_SUMMARY_PROMPT.to_string(),
            description: DEFAULT_DESCRIPTION_PROMPT.to_string(),
        }
    }
}

/// Prompts keyed by content kind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
    pub text: PromptSet,
    pub image: PromptSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used to summarize text
    pub text: String,
    /// Vision-capable model used to describe images
    pub vision: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: "gpt-4-turbo".to_string(),
            vision: "gpt-4-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub prompts: Prompts,

    pub models: ModelConfig,

    /// System message framing text summaries
    pub system_prompt: String,

    /// Base URL for the completions API (default: https://api.openai.com)
    pub base_url: String,

    pub request_timeout_secs: u64,

    /// Text estimated above this many tokens is rejected; `null` disables the check
    pub max_input_tokens: Option<usize>,

    /// `max_tokens` sent with image requests
    pub image_max_tokens: Option<u32>,

    /// Never read from or written to the config file
    #[serde(skip)]
    api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prompts: Prompts::default(),
            models: ModelConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_input_tokens: Some(DEFAULT_MAX_INPUT_TOKENS),
            image_max_tokens: Some(DEFAULT_IMAGE_MAX_TOKENS),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, or the first config file found, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("[Config] No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// `prompts/prompts.json` in the working directory, then `<config dir>/fileai/config.json`
    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_CONFIG_PATH);
        let user = dirs::config_dir().map(|dir| dir.join("fileai").join("config.json"));

        std::iter::once(local)
            .chain(user)
            .find(|candidate| candidate.is_file())
    }

    /// Attach the API key; blank keys count as absent
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}
