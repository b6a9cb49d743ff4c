use anyhow::Result;
use chrono::{Datelike, Local};
use colored::Colorize;
use rand::seq::IndexedRandom;

use crate::history::TopicHistory;
use crate::wiki::{ArticleRecord, WikiClient};

/// Which feed is active. Exactly one at a time; picking a topic or
/// submitting a search replaces the mode rather than composing with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMode {
    ForYou,
    Random,
    Trending,
    Memes,
    Topic(String),
    Search(String),
}

impl FeedMode {
    /// Meme mode restricts both the topic corpus and the style draw.
    pub fn is_meme(&self) -> bool {
        matches!(self, FeedMode::Memes)
    }
}

/// Topics for general exploration (For You, and the trending fallback).
pub const GENERAL_TOPICS: &[&str] = &[
    "Quantum physics",
    "Ancient Rome",
    "Black holes",
    "Dinosaurs",
    "World War II",
    "Human brain",
    "Ocean",
    "Volcanoes",
    "DNA",
    "Renaissance",
    "Artificial intelligence",
    "Climate change",
    "Egyptian pyramids",
    "Solar system",
    "Evolution",
    "Bacteria",
    "Medieval Europe",
    "Rainforest",
    "Einstein",
    "Industrial Revolution",
    "Mythology",
    "Cryptography",
    "Vaccines",
    "Coral reef",
    "Philosophy",
    "Psychology",
    "Economics",
    "Architecture",
    "Music theory",
    "Photography",
    "Astronomy",
    "Genetics",
];

/// Relatable, meme-friendly topics for the memes feed.
pub const MEME_TOPICS: &[&str] = &[
    "Procrastination",
    "Coffee",
    "Sleep deprivation",
    "Monday",
    "Cats",
    "Dogs",
    "Pizza",
    "Internet culture",
    "Social media",
    "Smartphone",
    "Netflix",
    "Video games",
    "Homework",
    "Alarm clock",
    "Traffic",
    "Weather",
    "Meetings",
    "Email",
    "Wifi",
    "Battery life",
    "Autocorrect",
    "Passwords",
    "Updates",
    "Loading screen",
    "Buffering",
    "Adulthood",
    "Taxes",
    "Grocery shopping",
    "Laundry",
    "Cooking",
    "Exercise",
    "Diet",
    "Sleep",
    "Work",
    "Commute",
    "Introvert",
    "Extrovert",
    "Anxiety",
    "Memory",
    "Time management",
    "Dinosaurs",
    "Ancient Egypt",
    "Vikings",
    "Pirates",
    "Ninjas",
    "Robots",
    "Aliens",
    "Conspiracy theories",
    "Flat Earth",
    "Bermuda Triangle",
];

/// What the selector hands back: either a term for the article fetcher to
/// resolve, or (random / trending) an already resolved article.
#[derive(Debug, Clone)]
pub enum Selection {
    Term(String),
    Article(ArticleRecord),
}

/// The Wikipedia calls the selector needs. Implemented by [`WikiClient`];
/// tests substitute fakes.
#[allow(async_fn_in_trait)]
pub trait WikiLookup {
    async fn search_titles(&self, term: &str) -> Result<Vec<String>>;
    async fn on_this_day(&self, month: u32, day: u32) -> Result<Vec<ArticleRecord>>;
    async fn random_summary(&self) -> Option<ArticleRecord>;
}

impl WikiLookup for WikiClient {
    async fn search_titles(&self, term: &str) -> Result<Vec<String>> {
        WikiClient::search_titles(self, term).await
    }

    async fn on_this_day(&self, month: u32, day: u32) -> Result<Vec<ArticleRecord>> {
        WikiClient::on_this_day(self, month, day).await
    }

    async fn random_summary(&self) -> Option<ArticleRecord> {
        WikiClient::random_summary(self).await
    }
}

/// Choose what the next post should be about.
///
/// All term draws funnel through `history.pick_unique`, so repetition
/// avoidance holds across modes and across sessions.
pub async fn select<W: WikiLookup>(
    mode: &FeedMode,
    history: &mut TopicHistory,
    wiki: &W,
) -> Option<Selection> {
    match mode {
        FeedMode::Memes => history.pick_unique(MEME_TOPICS).map(Selection::Term),
        FeedMode::ForYou => history.pick_unique(GENERAL_TOPICS).map(Selection::Term),
        FeedMode::Topic(t) | FeedMode::Search(t) => Some(select_related(t, history, wiki).await),
        FeedMode::Random => wiki.random_summary().await.map(Selection::Article),
        FeedMode::Trending => Some(select_trending(history, wiki).await),
    }
}

/// Diversify repeated clicks on the same tag: search for related articles
/// and draw an unseen title, instead of resolving the exact same page
/// every time. An empty search falls back to the term itself.
async fn select_related<W: WikiLookup>(
    term: &str,
    history: &mut TopicHistory,
    wiki: &W,
) -> Selection {
    let titles = wiki.search_titles(term).await.unwrap_or_default();
    match history.pick_unique(&titles) {
        Some(title) => Selection::Term(title),
        None => {
            history.record(term);
            Selection::Term(term.to_string())
        }
    }
}

/// Pick an unseen "on this day" event for today's date; fall back to a
/// general topic when the events feed fails or everything is stale.
async fn select_trending<W: WikiLookup>(history: &mut TopicHistory, wiki: &W) -> Selection {
    let today = Local::now();
    let events = match wiki.on_this_day(today.month(), today.day()).await {
        Ok(events) => events,
        Err(err) => {
            eprintln!("{} {err:#}", "on-this-day fetch failed, falling back:".dimmed());
            Vec::new()
        }
    };

    let fresh: Vec<&ArticleRecord> = events
        .iter()
        .filter(|e| !history.contains(&e.title))
        .collect();

    if let Some(event) = fresh.choose(&mut rand::rng()) {
        history.record(&event.title);
        return Selection::Article((*event).clone());
    }

    match history.pick_unique(GENERAL_TOPICS) {
        Some(term) => Selection::Term(term),
        // Unreachable with a non-empty corpus; keep the fallback total.
        None => Selection::Term("History".to_string()),
    }
}
