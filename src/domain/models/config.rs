//! Application configuration tree.
//!
//! Loaded hierarchically by `infrastructure::config`: serialized defaults,
//! then `stylecast.yaml`, then `STYLECAST_`-prefixed environment variables.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub match_pool: MatchPoolConfig,
    pub rate_limit: RateLimitConfig,
    pub ai: AiConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: "127.0.0.1:8080".to_string() }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "stylecast.db".to_string(), max_connections: 5 }
    }
}

/// Worker pool driving match tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPoolConfig {
    /// Number of workers draining the backlog
    pub worker_count: usize,
    /// Bounded backlog; saturated submissions are rejected
    pub queue_capacity: usize,
    /// Pacing delay between progress checkpoints, in milliseconds
    pub progress_pacing_ms: u64,
}

impl Default for MatchPoolConfig {
    fn default() -> Self {
        Self { worker_count: 4, queue_capacity: 100, progress_pacing_ms: 300 }
    }
}

/// Per-operator task-creation rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per sliding 1-second window
    pub max_requests_per_second: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests_per_second: 3 }
    }
}

/// AI provider routing and per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Master switch; calls fail fast when disabled
    pub enabled: bool,
    /// "gemini" or "openai"
    pub provider: String,
    pub openai: OpenAiConfig,
    pub gemini: GeminiConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "gemini".to_string(),
            openai: OpenAiConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completions backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Embed images as base64 data URLs instead of passing source URLs
    pub use_data_url_images: bool,
    /// Extra attempts for timeout-classified preview failures
    pub preview_max_retries: u32,
    /// Linear backoff unit; delay = backoff * attempt
    pub preview_retry_backoff_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            connect_timeout_ms: 30_000,
            read_timeout_ms: 120_000,
            use_data_url_images: true,
            preview_max_retries: 2,
            preview_retry_backoff_ms: 600,
        }
    }
}

/// Gemini generateContent backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub preview_max_retries: u32,
    pub preview_retry_backoff_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            connect_timeout_ms: 2_000,
            read_timeout_ms: 8_000,
            preview_max_retries: 2,
            preview_retry_backoff_ms: 600,
        }
    }
}
