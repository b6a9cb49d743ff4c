use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// How many served topics we remember before the oldest falls off.
pub const MAX_RECENT: usize = 100;

/// If filtering history out of a candidate list leaves fewer than this
/// many options, use the unfiltered list instead. Guards small corpora
/// against starving themselves.
const MIN_SURVIVORS: usize = 5;

/// Recently served topics, oldest first.
///
/// Every topic draw in the app goes through [`TopicHistory::pick_unique`],
/// so meme topics, general topics and trending fallbacks all share one
/// de-duplication horizon. Persisted as a plain JSON array.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicHistory {
    topics: Vec<String>,
}

impl TopicHistory {
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t.eq_ignore_ascii_case(topic))
    }

    /// Append a topic if it isn't already present, evicting the oldest
    /// entries once the log exceeds [`MAX_RECENT`].
    pub fn record(&mut self, topic: &str) {
        if self.contains(topic) {
            return;
        }
        self.topics.push(topic.to_string());
        if self.topics.len() > MAX_RECENT {
            let excess = self.topics.len() - MAX_RECENT;
            self.topics.drain(..excess);
        }
    }

    /// Pick a candidate the feed hasn't served recently, uniformly at
    /// random, and record it before returning.
    ///
    /// Returns `None` only for an empty candidate list.
    pub fn pick_unique<S: AsRef<str>>(&mut self, candidates: &[S]) -> Option<String> {
        let fresh: Vec<&str> = candidates
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| !self.contains(c))
            .collect();

        let pool: Vec<&str> = if fresh.len() < MIN_SURVIVORS {
            candidates.iter().map(|c| c.as_ref()).collect()
        } else {
            fresh
        };

        let pick = pool.choose(&mut rand::rng())?.to_string();
        self.record(&pick);
        Some(pick)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.topics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn corpus(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("topic-{i}")).collect()
    }

    #[test]
    fn record_is_bounded_and_fifo() {
        let mut history = TopicHistory::default();
        for topic in corpus(150) {
            history.record(&topic);
        }
        assert_eq!(history.len(), MAX_RECENT);
        assert!(!history.contains("topic-0"));
        assert!(!history.contains("topic-49"));
        assert!(history.contains("topic-50"));
        assert!(history.contains("topic-149"));
    }

    #[test]
    fn record_ignores_duplicates() {
        let mut history = TopicHistory::default();
        history.record("Coffee");
        history.record("coffee");
        history.record("Coffee");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn no_repeats_within_the_eviction_window() {
        let candidates = corpus(150);
        let mut history = TopicHistory::default();
        let mut seen = HashSet::new();
        for _ in 0..MAX_RECENT {
            let pick = history.pick_unique(&candidates).unwrap();
            assert!(seen.insert(pick), "repeat within the window");
        }
    }

    #[test]
    fn small_corpus_falls_back_instead_of_starving() {
        let candidates = vec!["a", "b", "c"];
        let mut history = TopicHistory::default();
        for c in &candidates {
            history.record(c);
        }
        // Everything is in history, but a pick must still succeed.
        let pick = history.pick_unique(&candidates).unwrap();
        assert!(candidates.contains(&pick.as_str()));
    }

    #[test]
    fn empty_candidates_yield_none() {
        let mut history = TopicHistory::default();
        assert!(history.pick_unique::<&str>(&[]).is_none());
    }

    #[test]
    fn pick_is_recorded() {
        let candidates = corpus(10);
        let mut history = TopicHistory::default();
        let pick = history.pick_unique(&candidates).unwrap();
        assert!(history.contains(&pick));
    }
}
