use anyhow::{Result, bail};
use colored::Colorize;

use crate::config::Config;
use crate::feed::{FeedController, WikiSource};
use crate::generate::GenerationClient;
use crate::render::TerminalSink;
use crate::state::State;
use crate::topics::FeedMode;
use crate::wiki::WikiClient;
use crate::{Cli, Cmd};

pub async fn run_command(mut cli: Cli, cfg: &Config, state: &mut State) -> Result<()> {
    let command = cli.command.take();
    match command {
        None => cmd_feed(FeedMode::ForYou, &cli, cfg, state).await,
        Some(Cmd::Random) => cmd_feed(FeedMode::Random, &cli, cfg, state).await,
        Some(Cmd::Trending) => cmd_feed(FeedMode::Trending, &cli, cfg, state).await,
        Some(Cmd::Memes) => cmd_feed(FeedMode::Memes, &cli, cfg, state).await,
        Some(Cmd::Topic { topic }) => {
            let topic = topic.trim().to_string();
            if topic.is_empty() {
                bail!("Topic cannot be empty");
            }
            cmd_feed(FeedMode::Topic(topic), &cli, cfg, state).await
        }
        Some(Cmd::Search { query }) => {
            let query = query.trim().to_string();
            if query.is_empty() {
                bail!("Search query cannot be empty");
            }
            cmd_feed(FeedMode::Search(query), &cli, cfg, state).await
        }
        Some(Cmd::Like { post_id }) => cmd_like(state, &post_id),
        Some(Cmd::Bookmark { post_id }) => cmd_bookmark(state, &post_id),
        Some(Cmd::Likes) => cmd_list_ids("liked", state.liked.iter()),
        Some(Cmd::Bookmarks) => cmd_list_ids("bookmarked", state.bookmarked.iter()),
        Some(Cmd::Tune {
            sensationalism,
            controversy,
            surprise,
            emotional_weight,
        }) => cmd_tune(state, sensationalism, controversy, surprise, emotional_weight),
    }
}

/// Run a feed: one initial batch, then `--scroll` continuation batches
/// of the smaller scroll size, exactly as the infinite-scroll trigger
/// would fire them.
async fn cmd_feed(mode: FeedMode, cli: &Cli, cfg: &Config, state: &mut State) -> Result<()> {
    let wiki = WikiClient::new(cfg.request_timeout)?;
    let generator =
        GenerationClient::new(cfg.api_key.clone(), cfg.model.clone(), cfg.request_timeout)?;

    let mut controller = FeedController::new(
        WikiSource::new(wiki),
        generator,
        mode,
        state.tone,
        cfg.max_feed_posts,
    );
    let mut sink = TerminalSink::new(state.liked.clone(), state.bookmarked.clone());

    let initial = cli.limit.unwrap_or(cfg.initial_batch);
    controller
        .request_batch(initial, &mut state.recent_topics, &mut sink)
        .await;

    for _ in 0..cli.scroll {
        controller
            .request_batch(cfg.scroll_batch, &mut state.recent_topics, &mut sink)
            .await;
    }

    Ok(())
}

fn cmd_like(state: &mut State, post_id: &str) -> Result<()> {
    if state.toggle_like(post_id) {
        println!("Liked {post_id}");
    } else {
        println!("Removed like from {post_id}");
    }
    Ok(())
}

fn cmd_bookmark(state: &mut State, post_id: &str) -> Result<()> {
    if state.toggle_bookmark(post_id) {
        println!("Added {post_id} to bookmarks");
    } else {
        println!("Removed {post_id} from bookmarks");
    }
    Ok(())
}

fn cmd_list_ids<'a>(label: &str, ids: impl ExactSizeIterator<Item = &'a String>) -> Result<()> {
    if ids.len() == 0 {
        println!("No {label} posts yet.");
        return Ok(());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

/// Update whichever tone dials were passed, then show all four.
fn cmd_tune(
    state: &mut State,
    sensationalism: Option<u8>,
    controversy: Option<u8>,
    surprise: Option<u8>,
    emotional_weight: Option<u8>,
) -> Result<()> {
    if let Some(v) = sensationalism {
        state.tone.sensationalism = v;
    }
    if let Some(v) = controversy {
        state.tone.controversy = v;
    }
    if let Some(v) = surprise {
        state.tone.surprise_intensity = v;
    }
    if let Some(v) = emotional_weight {
        state.tone.emotional_weight = v;
    }
    state.tone = state.tone.clamped();

    let tone = &state.tone;
    println!("{}", "Tone settings".bold());
    println!("  sensationalism:    {}%", tone.sensationalism);
    println!("  controversy:       {}%", tone.controversy);
    println!("  surprise:          {}%", tone.surprise_intensity);
    println!("  emotional weight:  {}%", tone.emotional_weight);
    Ok(())
}
