use anyhow::Result;
use dirs::{config_dir, data_dir};
use serde::Deserialize;

use crate::feed::{INITIAL_BATCH, SCROLL_BATCH};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Shape of config.toml on disk
///
/// Example:
/// api_key = "sk-..."
/// model = "gpt-5-mini"
/// initial_batch = 5
/// scroll_batch = 3
/// request_timeout_secs = 15
/// max_feed_posts = 200
/// state_file = "/some/custom/path.json"
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub initial_batch: Option<usize>,
    pub scroll_batch: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub max_feed_posts: Option<usize>,
    pub state_file: Option<String>,
}

/// Resolved config used by the app
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub initial_batch: usize,
    pub scroll_batch: usize,
    pub request_timeout: Duration,
    pub max_feed_posts: usize,
    pub state_path: PathBuf,
}

/// Where config.toml lives; the platform config directory, so
/// ~/.config/wikifeed/config.toml on XDG setups. Also shown to the user
/// when no API key is configured.
pub fn config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wikifeed")
        .join("config.toml")
}

/// Load config from [`config_path`] if it exists, otherwise use
/// sensible defaults. The API key falls back to the OPENAI_API_KEY
/// environment variable when the file doesn't set one.
pub fn load_config() -> Result<Config> {
    let config_path = config_path();

    let mut raw: Option<RawConfig> = None;

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        raw = Some(toml::from_str(&contents)?);
    }

    let api_key = raw
        .as_ref()
        .and_then(|c| c.api_key.clone())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .unwrap_or_default();

    let model = raw
        .as_ref()
        .and_then(|c| c.model.clone())
        .unwrap_or_else(|| "gpt-5-mini".to_string());

    let initial_batch = raw
        .as_ref()
        .and_then(|c| c.initial_batch)
        .unwrap_or(INITIAL_BATCH);

    let scroll_batch = raw
        .as_ref()
        .and_then(|c| c.scroll_batch)
        .unwrap_or(SCROLL_BATCH);

    let request_timeout = Duration::from_secs(
        raw.as_ref()
            .and_then(|c| c.request_timeout_secs)
            .unwrap_or(15),
    );

    let max_feed_posts = raw.as_ref().and_then(|c| c.max_feed_posts).unwrap_or(200);

    let state_path = raw
        .as_ref()
        .and_then(|c| c.state_file.clone())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wikifeed")
                .join("state.json")
        });

    Ok(Config {
        api_key,
        model,
        initial_batch,
        scroll_batch,
        request_timeout,
        max_feed_posts,
        state_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_points_at_the_app_config_file() {
        let path = config_path();
        assert!(path.ends_with("wikifeed/config.toml"));
    }
}
