use thiserror::Error;

/// Failures the feed controller has to tell apart.
///
/// Wikipedia-side failures are deliberately not represented here: a slot
/// that can't be resolved is skipped silently (logged to stderr), while
/// generation failures carry a message that gets surfaced to the user.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("{0}")]
    Generation(String),
}
