//! Configuration management

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration (keyword generation + verification)
    #[serde(default)]
    pub llm_service: LlmServiceConfig,

    /// Web search provider configuration
    #[serde(default)]
    pub web: WebSearchConfig,

    /// Academic paper provider configuration
    #[serde(default)]
    pub papers: PaperSearchConfig,

    /// Video provider configuration
    #[serde(default)]
    pub videos: VideoSearchConfig,

    /// Pipeline-wide behavior switches
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmServiceConfig {
    /// Base URL of the OpenAI-compatible service
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("LECTERN_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: default_chat_model(),
            api_key: std::env::var("LECTERN_LLM_API_KEY").ok(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("LECTERN_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}

fn default_temperature() -> f32 {
    0.2
}

fn default_llm_timeout() -> u64 {
    15
}

/// Limits shared by every provider pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProviderTuning {
    /// Maximum queries issued concurrently per request
    pub fanout: usize,
    /// Results requested per search call
    pub page_size: usize,
    /// Maximum candidates entering the verification stage
    pub card_limit: usize,
    /// Maximum in-flight LLM verification calls
    pub verify_concurrency: usize,
    /// Snippet/abstract length cap in the response
    pub snippet_max: usize,
    /// Minimum keywords requested from the LLM
    pub keyword_min: usize,
    /// Maximum keywords kept after deduplication
    pub keyword_max: usize,
    /// HTTP timeout for one search call, in seconds
    pub timeout_secs: u64,
}

/// Web search provider configuration (Google Custom Search shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub engine_id: Option<String>,

    #[serde(default = "WebSearchConfig::default_tuning")]
    pub tuning: ProviderTuning,
}

impl WebSearchConfig {
    fn default_tuning() -> ProviderTuning {
        ProviderTuning {
            fanout: 3,
            page_size: 10,
            card_limit: 15,
            verify_concurrency: 15,
            snippet_max: 300,
            keyword_min: 2,
            keyword_max: 4,
            timeout_secs: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(LecternError::Config(
                "web search API key is not set".to_string(),
            ));
        }
        if self.engine_id.as_deref().unwrap_or("").is_empty() {
            return Err(LecternError::Config(
                "web search engine id is not set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("LECTERN_WEB_SEARCH_API_KEY").ok(),
            engine_id: std::env::var("LECTERN_WEB_SEARCH_ENGINE_ID").ok(),
            tuning: Self::default_tuning(),
        }
    }
}

/// Paper provider configuration (OpenAlex shape, no credential required)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSearchConfig {
    /// Earliest publication year admitted by the search filter
    #[serde(default = "default_year_from")]
    pub year_from: i32,

    #[serde(default = "PaperSearchConfig::default_tuning")]
    pub tuning: ProviderTuning,
}

impl PaperSearchConfig {
    fn default_tuning() -> ProviderTuning {
        ProviderTuning {
            fanout: 4,
            page_size: 40,
            card_limit: 13,
            verify_concurrency: 20,
            snippet_max: 400,
            keyword_min: 2,
            keyword_max: 4,
            timeout_secs: 15,
        }
    }
}

impl Default for PaperSearchConfig {
    fn default() -> Self {
        Self {
            year_from: default_year_from(),
            tuning: Self::default_tuning(),
        }
    }
}

fn default_year_from() -> i32 {
    1930
}

/// Video provider configuration (YouTube Data API shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "VideoSearchConfig::default_tuning")]
    pub tuning: ProviderTuning,
}

impl VideoSearchConfig {
    fn default_tuning() -> ProviderTuning {
        ProviderTuning {
            fanout: 2,
            page_size: 8,
            card_limit: 10,
            verify_concurrency: 20,
            snippet_max: 300,
            keyword_min: 1,
            keyword_max: 2,
            timeout_secs: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(LecternError::Config(
                "video search API key is not set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for VideoSearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("LECTERN_VIDEO_API_KEY").ok(),
            tuning: Self::default_tuning(),
        }
    }
}

/// Pipeline-wide behavior switches
///
/// These were process-wide flags in earlier designs; keeping them on an
/// explicit config object allows per-orchestrator overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Skip verification entirely and stamp every candidate with the
    /// sentinel score. Intended for fast manual smoke tests only.
    #[serde(default)]
    pub skip_verification: bool,

    /// Default minimum score when the request does not set one
    #[serde(default = "default_min_score")]
    pub default_min_score: f64,

    /// Default number of results when the request does not set one
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_verification: false,
            default_min_score: default_min_score(),
            default_top_k: default_top_k(),
        }
    }
}

fn default_min_score() -> f64 {
    5.0
}

fn default_top_k() -> usize {
    5
}

/// Hard upper bound on requested result counts
pub const MAX_TOP_K: usize = 10;

impl Config {
    /// Load config from default path, falling back to env-driven defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}
