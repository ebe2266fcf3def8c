mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Database file used when nothing else names one.
pub const DEFAULT_DB_PATH: &str = "./repostat.db";

/// Environment variable overriding the configured token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding the configured database path.
pub const DB_PATH_ENV: &str = "REPOSTAT_DB";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./repostat.toml", "~/.config/repostat/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.github.base_url.trim().is_empty() {
        anyhow::bail!("github.base_url cannot be empty");
    }

    if config.github.timeout_secs == 0 {
        anyhow::bail!("github.timeout_secs must be at least 1");
    }

    if config.github.max_attempts == 0 {
        anyhow::bail!("github.max_attempts must be at least 1");
    }

    if config.enrich.workers == 0 {
        anyhow::bail!("enrich.workers must be at least 1");
    }

    if config.enrich.limit == 0 {
        tracing::warn!("enrich.limit is 0; batches will be empty unless --limit is given");
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Pick the GitHub token: `--token`, then `GITHUB_TOKEN`, then the config file.
///
/// An empty result means unauthenticated requests.
pub fn resolve_token(cli: Option<&str>, env: Option<String>, config: &Config) -> String {
    non_empty(cli.map(str::to_string))
        .or_else(|| non_empty(env))
        .or_else(|| non_empty(config.github.token.clone()))
        .unwrap_or_default()
}

/// Pick the database file: `--db`, then `REPOSTAT_DB`, then the config file,
/// then [`DEFAULT_DB_PATH`]. Leading `~` is expanded.
pub fn resolve_db_path(cli: Option<&Path>, env: Option<String>, config: &Config) -> PathBuf {
    let raw = cli
        .map(Path::to_path_buf)
        .or_else(|| non_empty(env).map(PathBuf::from))
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

    let expanded = shellexpand::tilde(&raw.to_string_lossy()).into_owned();
    PathBuf::from(expanded)
}
