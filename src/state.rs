use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::fs::create_dir_all;
use std::path::Path;

use crate::config::Config;
use crate::history::TopicHistory;
use crate::prompt::ToneConfig;

/// Durable app state serialized to JSON: the recent-topics log, the
/// liked/bookmarked ID sets and the tone dials. Loaded once at startup,
/// written back on exit. Posts themselves are never persisted.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct State {
    #[serde(default)]
    pub recent_topics: TopicHistory,
    #[serde(default)]
    pub liked: BTreeSet<String>,
    #[serde(default)]
    pub bookmarked: BTreeSet<String>,
    #[serde(default)]
    pub tone: ToneConfig,
}

/// Load state from JSON (or start fresh).
pub fn load_state(cfg: &Config) -> Result<State> {
    let path = &cfg.state_path;
    if !Path::new(path).exists() {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        return Ok(State::default());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(State::default());
    }

    let state: State = serde_json::from_str(&contents)?;
    Ok(state)
}

/// Save state to JSON.
pub fn save_state(cfg: &Config, state: &State) -> Result<()> {
    let path = &cfg.state_path;
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    Ok(())
}

impl State {
    /// Toggle like membership; true means the post is now liked.
    pub fn toggle_like(&mut self, post_id: &str) -> bool {
        if self.liked.remove(post_id) {
            false
        } else {
            self.liked.insert(post_id.to_string());
            true
        }
    }

    /// Toggle bookmark membership; true means the post is now bookmarked.
    pub fn toggle_bookmark(&mut self, post_id: &str) -> bool {
        if self.bookmarked.remove(post_id) {
            false
        } else {
            self.bookmarked.insert(post_id.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_config(name: &str) -> Config {
        Config {
            api_key: String::new(),
            model: "gpt-5-mini".to_string(),
            initial_batch: 5,
            scroll_batch: 3,
            request_timeout: Duration::from_secs(15),
            max_feed_posts: 200,
            state_path: std::env::temp_dir().join(format!(
                "wikifeed-test-{name}-{}.json",
                std::process::id()
            )),
        }
    }

    #[test]
    fn toggles_are_involutions() {
        let mut state = State::default();

        assert!(state.toggle_like("post_1_0"));
        assert!(state.liked.contains("post_1_0"));
        assert!(!state.toggle_like("post_1_0"));
        assert!(state.liked.is_empty());

        assert!(state.toggle_bookmark("post_1_0"));
        assert!(!state.toggle_bookmark("post_1_0"));
        assert!(state.bookmarked.is_empty());
    }

    #[test]
    fn likes_survive_independently_of_the_feed() {
        // A post no longer visible anywhere can still be liked in storage.
        let mut state = State::default();
        state.toggle_like("post_gone_0");
        assert!(state.liked.contains("post_gone_0"));
    }

    #[test]
    fn state_round_trips_through_disk() {
        let cfg = temp_config("roundtrip");
        let mut state = State::default();
        state.toggle_like("post_1_0");
        state.toggle_bookmark("post_1_1");
        state.recent_topics.record("Coffee");
        state.tone.sensationalism = 80;

        save_state(&cfg, &state).unwrap();
        let loaded = load_state(&cfg).unwrap();

        assert!(loaded.liked.contains("post_1_0"));
        assert!(loaded.bookmarked.contains("post_1_1"));
        assert!(loaded.recent_topics.contains("Coffee"));
        assert_eq!(loaded.tone.sensationalism, 80);

        let _ = fs::remove_file(&cfg.state_path);
    }

    #[test]
    fn missing_state_file_starts_fresh_with_default_tone() {
        let cfg = Config {
            state_path: std::env::temp_dir()
                .join(format!("wikifeed-test-missing-{}", std::process::id()))
                .join("state.json"),
            ..temp_config("fresh")
        };
        let state = load_state(&cfg).unwrap();
        assert!(state.liked.is_empty());
        assert_eq!(state.tone, ToneConfig::default());
        if let Some(parent) = cfg.state_path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }
}
