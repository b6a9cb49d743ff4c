mod commands;
mod config;
mod error;
mod feed;
mod generate;
mod history;
mod prompt;
mod render;
mod state;
mod topics;
mod wiki;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::run_command;

/// Command-line arguments for wikifeed
#[derive(Parser, Debug)]
#[command(name = "wikifeed")]
#[command(about = "An infinite Wikipedia doomscroll feed for the command line")]
pub struct Cli {
    /// Number of posts in the initial batch (overrides config)
    #[arg(short = 'n', long = "limit", global = true)]
    pub limit: Option<usize>,

    /// Extra scroll-triggered batches to load after the initial one
    #[arg(long, global = true, default_value_t = 0)]
    pub scroll: usize,

    #[command(subcommand)]
    pub command: Option<Cmd>,
}

/// Subcommands for wikifeed
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Posts about completely random articles
    Random,

    /// Posts about events that happened on this day in history
    Trending,

    /// Shitposts about relatable topics
    Memes,

    /// Posts about a chosen topic (and articles related to it)
    Topic {
        /// Topic to explore, e.g. "Black holes"
        topic: String,
    },

    /// Posts about whatever a search turns up
    Search {
        /// Search query
        query: String,
    },

    /// Like (or unlike) a post by id
    Like {
        /// Post id as shown in the feed
        post_id: String,
    },

    /// Bookmark (or unbookmark) a post by id
    Bookmark {
        /// Post id as shown in the feed
        post_id: String,
    },

    /// List liked post ids
    Likes,

    /// List bookmarked post ids
    Bookmarks,

    /// Adjust the tone dials (0-100 each)
    Tune {
        /// How sensational/clickbaity the posts read
        #[arg(long)]
        sensationalism: Option<u8>,

        /// How provocative/polarizing the posts read
        #[arg(long)]
        controversy: Option<u8>,

        /// How dramatized the reveal is
        #[arg(long)]
        surprise: Option<u8>,

        /// How dark/philosophical the framing gets
        #[arg(long)]
        emotional_weight: Option<u8>,
    }, // No subcommand -> default: the For You feed
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config()?;
    let mut state = state::load_state(&cfg)?;

    run_command(cli, &cfg, &mut state).await?;

    state::save_state(&cfg, &state)?;
    Ok(())
}
