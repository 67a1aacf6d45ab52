use serde::Deserialize;
use anyhow::{bail, Context, Result};
use std::fs;
use std::time::Duration;

use crate::aggregator::{DEFAULT_PAGE_SIZE, FIXED_SUPPLY, UNCLAIMED_PREFIX};

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config: {}", path))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        if config.api.page_size == 0 {
            bail!("api.page_size must be at least 1");
        }
        if config.unclaimed_prefix.is_empty() {
            bail!("unclaimed_prefix must not be empty");
        }
        if config.total_supply > i64::MAX as u64 {
            bail!("total_supply must not exceed {}", i64::MAX);
        }
        Ok(config)
    }
}

impl ApiConfig {
    /// Reads the bearer token from the environment variable named by `token_env`.
    pub fn token(&self) -> Result<String> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => bail!(
                "{} is not set; export the minting API bearer key before running",
                self.token_env
            ),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    /// Featured project ids, in display order.
    #[serde(default)]
    pub projects: Vec<u64>,
    #[serde(default = "default_total_supply")]
    pub total_supply: u64,
    #[serde(default = "default_unclaimed_prefix")]
    pub unclaimed_prefix: String,
    /// Treat a failed page as an error instead of the end of the collection.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            page_size: default_page_size(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://mainnet.underdogprotocol.com/v2".to_string()
}

fn default_token_env() -> String {
    "UNDERDOG_BEARER_KEY".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_total_supply() -> u64 {
    FIXED_SUPPLY
}

fn default_unclaimed_prefix() -> String {
    UNCLAIMED_PREFIX.to_string()
}
