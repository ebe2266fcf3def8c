use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::enrich::BatchOptions;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// SQLite database file; tilde-expanded when resolved.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub enrich: EnrichConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    /// Personal access token. Overridden by `GITHUB_TOKEN` and `--token`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request when throttled with 429, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, doubled on each further retry (default: 100)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Stop the whole batch when 429 retries run out
    #[serde(default)]
    pub halt_on_throttle_exhaustion: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            halt_on_throttle_exhaustion: false,
        }
    }
}

fn default_base_url() -> String {
    crate::metadata::providers::GITHUB_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichConfig {
    /// Repositories per batch (default: 50)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Concurrent workers (default: 5)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            workers: default_workers(),
        }
    }
}

impl EnrichConfig {
    pub fn batch_options(&self, force: bool) -> BatchOptions {
        BatchOptions {
            limit: self.limit,
            force,
            workers: self.workers,
        }
    }
}

fn default_limit() -> usize {
    50
}

fn default_workers() -> usize {
    5
}
