//! Client configuration loaded from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::http::{DEFAULT_TIMEOUT, GENERATION_TIMEOUT};

pub const DEFAULT_API_URL: &str = "https://api.triptalk.app";
pub const DEFAULT_AI_URL: &str = "https://ai.triptalk.app";

/// Where the two backends live and how long calls may take.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Authentication and business API.
    pub api_base_url: String,
    /// AI trip-planning API.
    pub ai_base_url: String,
    pub default_timeout: Duration,
    pub generation_timeout: Duration,
    /// Token file override; `None` uses the platform data directory.
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            ai_base_url: DEFAULT_AI_URL.to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            generation_timeout: GENERATION_TIMEOUT,
            token_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            api_base_url: env::var("TRIPTALK_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            ai_base_url: env::var("TRIPTALK_AI_URL").unwrap_or_else(|_| DEFAULT_AI_URL.to_string()),
            default_timeout: secs_var("TRIPTALK_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT),
            generation_timeout: secs_var("TRIPTALK_GENERATION_TIMEOUT_SECS")
                .unwrap_or(GENERATION_TIMEOUT),
            token_path: env::var("TRIPTALK_TOKEN_PATH").ok().map(PathBuf::from),
        };
        config.warn_on_plaintext();
        config
    }

    pub fn with_base_urls(api_base_url: &str, ai_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            ai_base_url: ai_base_url.to_string(),
            ..Self::default()
        }
    }

    /// Base URLs that would send credentials unencrypted.
    pub fn plaintext_urls(&self) -> Vec<&str> {
        [self.api_base_url.as_str(), self.ai_base_url.as_str()]
            .into_iter()
            .filter(|url| url.trim_start().to_ascii_lowercase().starts_with("http://"))
            .collect()
    }

    fn warn_on_plaintext(&self) {
        for url in self.plaintext_urls() {
            warn!(%url, "backend configured without TLS; tokens and credentials travel in cleartext");
        }
    }
}

fn secs_var(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
