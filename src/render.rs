use colored::Colorize;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

use crate::feed::FeedSink;
use crate::generate::Post;
use crate::wiki::ArticleRecord;

/// Per-category avatar emoji, keyed on words in the article title.
const AVATAR_CATEGORIES: &[(&str, &[&str], &[&str])] = &[
    (
        "science",
        &["physics", "chemistry", "biology", "scientist", "experiment", "theory"],
        &["🔬", "🧪", "⚗️", "🔭", "🧬"],
    ),
    (
        "space",
        &["space", "planet", "star", "galaxy", "universe", "moon", "asteroid"],
        &["🚀", "🌟", "🌙", "☄️", "🛸"],
    ),
    (
        "history",
        &["war", "ancient", "century", "empire", "king", "queen", "dynasty"],
        &["📜", "🏛️", "⚔️", "👑", "🗿"],
    ),
    (
        "nature",
        &["plant", "tree", "flower", "ocean", "mountain", "forest", "river"],
        &["🌿", "🌺", "🦋", "🌊", "🏔️"],
    ),
    (
        "animal",
        &["animal", "species", "mammal", "bird", "fish", "insect"],
        &["🦁", "🐘", "🦈", "🦅", "🐙"],
    ),
    (
        "tech",
        &["computer", "software", "internet", "digital", "electronic", "robot"],
        &["💻", "🤖", "📱", "⚡", "🔋"],
    ),
    ("art", &[], &["🎨", "🎭", "🎬", "📷", "✨"]),
    ("music", &[], &["🎵", "🎸", "🎹", "🎺", "🎻"]),
    ("food", &[], &["🍕", "🍜", "🍰", "🍷", "🌮"]),
    ("sports", &[], &["⚽", "🏀", "🎾", "🏆", "🥇"]),
    ("philosophy", &[], &["🤔", "💭", "📚", "🧠", "💡"]),
];

const TIME_AGO: &[&str] = &[
    "1m", "2m", "5m", "10m", "15m", "30m", "1h", "2h", "3h", "5h", "8h", "12h", "1d", "2d",
];

/// Simulated engagement numbers, generated fresh at render time and
/// never persisted.
#[derive(Debug, Clone, Copy)]
struct Engagement {
    likes: u64,
    reposts: u64,
    replies: u64,
    views: u64,
}

impl Engagement {
    fn random() -> Self {
        let mut rng = rand::rng();
        let likes = rng.random_range(100..50_100);
        Self {
            likes,
            reposts: rng.random_range(0..=likes * 3 / 10),
            replies: rng.random_range(0..=likes / 10),
            views: likes * rng.random_range(5..25),
        }
    }
}

/// Renders the feed to the terminal. Holds snapshots of the liked and
/// bookmarked sets so posts can be marked without touching app state.
pub struct TerminalSink {
    liked: BTreeSet<String>,
    bookmarked: BTreeSet<String>,
}

impl TerminalSink {
    pub fn new(liked: BTreeSet<String>, bookmarked: BTreeSet<String>) -> Self {
        Self { liked, bookmarked }
    }
}

impl FeedSink for TerminalSink {
    fn on_batch_start(&mut self) {
        println!("{}", "loading posts...".dimmed());
    }

    fn on_post_ready(&mut self, post: &Post, article: &ArticleRecord) {
        let avatar = avatar_emoji(&article.title);
        let handle = handle(&article.title);
        let author = format!("Wiki{}", capitalize_first(&handle));
        let time_ago = TIME_AGO
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("1m");
        let engagement = Engagement::random();

        println!();
        println!(
            "{avatar} {} {} {} {}  {}",
            author.bold(),
            "✔".cyan(),
            format!("@wiki_{handle}").dimmed(),
            format!("· {time_ago}").dimmed(),
            post.style.label().yellow(),
        );
        println!("{}", highlight_hashtags(&post.text));
        if let Some(thumbnail) = &article.thumbnail {
            println!("{} {}", "img:".dimmed(), thumbnail.dimmed());
        }
        println!("{} {}", "source:".dimmed(), article.url.blue());
        println!(
            "💬 {}  🔁 {}  ❤️ {}{}  👁 {}{}",
            format_number(engagement.replies),
            format_number(engagement.reposts),
            format_number(engagement.likes),
            if self.liked.contains(&post.id) {
                " (liked)".red().to_string()
            } else {
                String::new()
            },
            format_number(engagement.views),
            if self.bookmarked.contains(&post.id) {
                "  🔖 bookmarked".yellow().to_string()
            } else {
                String::new()
            },
        );
        println!("{}", format!("id: {}", post.id).dimmed());
    }

    fn on_post_skipped(&mut self) {
        eprintln!("{}", "generation returned nothing usable, skipping".dimmed());
    }

    fn on_batch_end(&mut self) {
        println!();
    }

    fn on_no_credential(&mut self) {
        println!("🔑 {}", "OpenAI API key required".bold());
        println!("To generate posts, add your API key to the config file:");
        println!(
            "  {}  ->  api_key = \"sk-...\"",
            crate::config::config_path().display()
        );
        println!("or set the OPENAI_API_KEY environment variable.");
    }

    fn on_generation_error(&mut self, message: &str) {
        eprintln!("{} {message}", "generation error:".red());
    }
}

/// Pick an avatar matching the title's category; any emoji as fallback.
fn avatar_emoji(title: &str) -> &'static str {
    let title_lower = title.to_lowercase();
    let mut rng = rand::rng();

    for (category, keywords, emojis) in AVATAR_CATEGORIES {
        if title_lower.contains(category) || keywords.iter().any(|k| title_lower.contains(k)) {
            if let Some(emoji) = emojis.choose(&mut rng).copied() {
                return emoji;
            }
        }
    }

    let all: Vec<&'static str> = AVATAR_CATEGORIES
        .iter()
        .flat_map(|(_, _, emojis)| emojis.iter().copied())
        .collect();
    all.choose(&mut rng).copied().unwrap_or("💡")
}

/// Fake handle from the first two title words: "Black holes" -> "black_holes".
fn handle(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn highlight_hashtags(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word.starts_with('#') && word.len() > 1 {
                word.cyan().to_string()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_number(num: u64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}
