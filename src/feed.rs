use chrono::Local;

use crate::error::FeedError;
use crate::generate::Post;
use crate::history::TopicHistory;
use crate::prompt::{self, GenerationRequest, PostStyle, ToneConfig};
use crate::topics::{self, FeedMode, Selection};
use crate::wiki::{ArticleRecord, WikiClient};

/// Posts fetched when a feed starts (or restarts after a mode switch).
pub const INITIAL_BATCH: usize = 5;

/// Posts fetched per scroll-triggered continuation.
pub const SCROLL_BATCH: usize = 3;

/// Where the controller gets articles from. The real implementation runs
/// the topic selector and the Wikipedia fetcher; tests substitute fakes.
#[allow(async_fn_in_trait)]
pub trait ArticleSource {
    async fn next_article(
        &self,
        mode: &FeedMode,
        history: &mut TopicHistory,
    ) -> Option<ArticleRecord>;
}

/// Where the controller gets posts from.
#[allow(async_fn_in_trait)]
pub trait PostGenerator {
    fn has_credential(&self) -> bool;

    async fn generate(
        &self,
        request: &GenerationRequest,
        seq: u64,
    ) -> Result<Option<Post>, FeedError>;
}

/// What the controller tells the presentation layer. The controller
/// never touches rendering directly.
pub trait FeedSink {
    fn on_batch_start(&mut self) {}
    fn on_post_ready(&mut self, post: &Post, article: &ArticleRecord);
    fn on_post_skipped(&mut self) {}
    fn on_batch_end(&mut self) {}
    fn on_no_credential(&mut self) {}
    fn on_generation_error(&mut self, _message: &str) {}
}

/// Production article source: topic selection plus summary resolution.
pub struct WikiSource {
    client: WikiClient,
}

impl WikiSource {
    pub fn new(client: WikiClient) -> Self {
        Self { client }
    }
}

impl ArticleSource for WikiSource {
    async fn next_article(
        &self,
        mode: &FeedMode,
        history: &mut TopicHistory,
    ) -> Option<ArticleRecord> {
        match topics::select(mode, history, &self.client).await? {
            Selection::Article(record) => Some(record),
            Selection::Term(term) => self.client.resolve(&term).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Idle,
    LoadingBatch,
}

/// Orchestrates the generation pipeline and owns the visible feed.
///
/// Strictly sequential: one slot's fetch-then-generate pair completes
/// before the next begins, so at most one outbound request is ever in
/// flight. At most one batch runs at a time; triggers that arrive while
/// loading are dropped, not queued.
pub struct FeedController<A, G> {
    source: A,
    generator: G,
    mode: FeedMode,
    tone: ToneConfig,
    max_posts: usize,
    state: LoadState,
    post_seq: u64,
    posts: Vec<Post>,
}

impl<A: ArticleSource, G: PostGenerator> FeedController<A, G> {
    pub fn new(source: A, generator: G, mode: FeedMode, tone: ToneConfig, max_posts: usize) -> Self {
        Self {
            source,
            generator,
            mode,
            tone,
            max_posts,
            state: LoadState::Idle,
            post_seq: 0,
            posts: Vec::new(),
        }
    }

    pub fn mode(&self) -> &FeedMode {
        &self.mode
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn is_idle(&self) -> bool {
        self.state == LoadState::Idle
    }

    /// Replace the active mode: the visible feed and the per-session
    /// post counter reset, topic history deliberately survives. A batch
    /// can never be in flight here (batches hold the controller
    /// exclusively), so no stale posts can append after the switch.
    pub fn switch_mode(&mut self, mode: FeedMode) {
        self.mode = mode;
        self.posts.clear();
        self.post_seq = 0;
    }

    /// Produce up to `n` posts. Partial success is normal: slots whose
    /// article or post comes back empty are skipped, generation errors
    /// are surfaced through the sink, and the batch always returns the
    /// controller to idle.
    pub async fn request_batch<S: FeedSink>(
        &mut self,
        n: usize,
        history: &mut TopicHistory,
        sink: &mut S,
    ) {
        if self.state == LoadState::LoadingBatch {
            return;
        }
        if !self.generator.has_credential() {
            sink.on_no_credential();
            return;
        }

        self.state = LoadState::LoadingBatch;
        sink.on_batch_start();

        for _ in 0..n {
            let Some(article) = self.source.next_article(&self.mode, history).await else {
                continue;
            };

            let style = PostStyle::draw(self.mode.is_meme());
            let request = prompt::build(&article, style, &self.tone, Local::now());

            match self.generator.generate(&request, self.post_seq).await {
                Ok(Some(post)) => {
                    self.post_seq += 1;
                    sink.on_post_ready(&post, &article);
                    self.posts.push(post);
                    if self.posts.len() > self.max_posts {
                        let excess = self.posts.len() - self.max_posts;
                        self.posts.drain(..excess);
                    }
                }
                Ok(None) => sink.on_post_skipped(),
                Err(err) => sink.on_generation_error(&err.to_string()),
            }
        }

        sink.on_batch_end();
        self.state = LoadState::Idle;
    }

    #[cfg(test)]
    fn force_loading(&mut self) {
        self.state = LoadState::LoadingBatch;
    }

    #[cfg(test)]
    fn force_idle(&mut self) {
        self.state = LoadState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn article(title: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            extract: format!("{title} is a thing that exists."),
            url: format!("https://en.wikipedia.org/wiki/{title}"),
            thumbnail: None,
            year: None,
            is_historical_event: false,
        }
    }

    /// Pops one scripted response per slot; `None` simulates a fetch
    /// failure for that slot.
    struct FakeSource {
        slots: RefCell<VecDeque<Option<ArticleRecord>>>,
        served_modes: RefCell<Vec<FeedMode>>,
    }

    impl FakeSource {
        fn new(slots: Vec<Option<ArticleRecord>>) -> Self {
            Self {
                slots: RefCell::new(slots.into()),
                served_modes: RefCell::new(Vec::new()),
            }
        }

        fn endless() -> Self {
            Self::new(Vec::new())
        }
    }

    impl ArticleSource for FakeSource {
        async fn next_article(
            &self,
            mode: &FeedMode,
            _history: &mut TopicHistory,
        ) -> Option<ArticleRecord> {
            self.served_modes.borrow_mut().push(mode.clone());
            let mut slots = self.slots.borrow_mut();
            match slots.pop_front() {
                Some(slot) => slot,
                None => Some(article("Filler")),
            }
        }
    }

    enum Script {
        Post,
        Empty,
        Error(&'static str),
    }

    struct FakeGenerator {
        credential: bool,
        script: RefCell<VecDeque<Script>>,
    }

    impl FakeGenerator {
        fn ok() -> Self {
            Self {
                credential: true,
                script: RefCell::new(VecDeque::new()),
            }
        }

        fn scripted(script: Vec<Script>) -> Self {
            Self {
                credential: true,
                script: RefCell::new(script.into()),
            }
        }

        fn without_credential() -> Self {
            Self {
                credential: false,
                script: RefCell::new(VecDeque::new()),
            }
        }
    }

    impl PostGenerator for FakeGenerator {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
            seq: u64,
        ) -> Result<Option<Post>, FeedError> {
            match self.script.borrow_mut().pop_front().unwrap_or(Script::Post) {
                Script::Post => Ok(Some(Post {
                    id: format!("post_0_{seq}"),
                    text: "generated text long enough to count".to_string(),
                    style: request.style,
                })),
                Script::Empty => Ok(None),
                Script::Error(msg) => Err(FeedError::Generation(msg.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        batch_starts: usize,
        batch_ends: usize,
        posts: Vec<Post>,
        skipped: usize,
        no_credential: usize,
        errors: Vec<String>,
    }

    impl FeedSink for RecordingSink {
        fn on_batch_start(&mut self) {
            self.batch_starts += 1;
        }
        fn on_post_ready(&mut self, post: &Post, _article: &ArticleRecord) {
            self.posts.push(post.clone());
        }
        fn on_post_skipped(&mut self) {
            self.skipped += 1;
        }
        fn on_batch_end(&mut self) {
            self.batch_ends += 1;
        }
        fn on_no_credential(&mut self) {
            self.no_credential += 1;
        }
        fn on_generation_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn controller<A: ArticleSource, G: PostGenerator>(
        source: A,
        generator: G,
        mode: FeedMode,
    ) -> FeedController<A, G> {
        FeedController::new(source, generator, mode, ToneConfig::default(), 200)
    }

    #[tokio::test]
    async fn failed_slots_are_skipped_not_fatal() {
        // Batch of 5 where slots 2 and 4 fail the fetch.
        let source = FakeSource::new(vec![
            Some(article("A")),
            None,
            Some(article("B")),
            None,
            Some(article("C")),
        ]);
        let mut feed = controller(source, FakeGenerator::ok(), FeedMode::ForYou);
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(5, &mut history, &mut sink).await;

        assert_eq!(sink.posts.len(), 3);
        assert_eq!(feed.posts().len(), 3);
        assert_eq!(sink.batch_starts, 1);
        assert_eq!(sink.batch_ends, 1);
        assert!(feed.is_idle());
    }

    #[tokio::test]
    async fn generation_errors_are_surfaced_and_batch_continues() {
        let generator = FakeGenerator::scripted(vec![
            Script::Post,
            Script::Error("rate limited"),
            Script::Empty,
            Script::Post,
        ]);
        let mut feed = controller(FakeSource::endless(), generator, FeedMode::ForYou);
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(4, &mut history, &mut sink).await;

        assert_eq!(sink.posts.len(), 2);
        assert_eq!(sink.skipped, 1);
        assert_eq!(sink.errors, vec!["rate limited"]);
        assert!(feed.is_idle());
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let mut feed = controller(
            FakeSource::endless(),
            FakeGenerator::without_credential(),
            FeedMode::ForYou,
        );
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(5, &mut history, &mut sink).await;

        assert_eq!(sink.no_credential, 1);
        assert_eq!(sink.batch_starts, 0);
        assert!(sink.posts.is_empty());
        assert!(feed.is_idle());
    }

    #[tokio::test]
    async fn request_while_loading_is_a_noop() {
        let mut feed = controller(FakeSource::endless(), FakeGenerator::ok(), FeedMode::ForYou);
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.force_loading();
        feed.request_batch(5, &mut history, &mut sink).await;
        assert_eq!(sink.batch_starts, 0);
        assert!(sink.posts.is_empty());

        feed.force_idle();
        feed.request_batch(5, &mut history, &mut sink).await;
        assert_eq!(sink.posts.len(), 5);
    }

    #[tokio::test]
    async fn switch_mode_resets_feed_and_counter_but_not_history() {
        let mut feed = controller(FakeSource::endless(), FakeGenerator::ok(), FeedMode::ForYou);
        let mut history = TopicHistory::default();
        history.record("Coffee");
        let mut sink = RecordingSink::default();

        feed.request_batch(5, &mut history, &mut sink).await;
        assert_eq!(feed.posts().len(), 5);

        feed.switch_mode(FeedMode::Memes);
        assert!(feed.posts().is_empty());
        assert!(history.contains("Coffee"));

        let mut sink = RecordingSink::default();
        feed.request_batch(5, &mut history, &mut sink).await;
        // Counter restarted: the first post of the new feed is seq 0 again.
        assert!(sink.posts[0].id.ends_with("_0"));
        assert_eq!(feed.mode(), &FeedMode::Memes);
    }

    #[tokio::test]
    async fn meme_mode_draws_only_meme_styles() {
        let mut feed = controller(FakeSource::endless(), FakeGenerator::ok(), FeedMode::Memes);
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(5, &mut history, &mut sink).await;

        assert!(sink.posts.iter().all(|p| p.style.is_meme()));
    }

    #[tokio::test]
    async fn feed_is_a_bounded_sliding_window() {
        let source = FakeSource::endless();
        let generator = FakeGenerator::ok();
        let mut feed =
            FeedController::new(source, generator, FeedMode::ForYou, ToneConfig::default(), 3);
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(5, &mut history, &mut sink).await;

        // The sink saw all five, the retained feed keeps the newest three.
        assert_eq!(sink.posts.len(), 5);
        assert_eq!(feed.posts().len(), 3);
        assert_eq!(feed.posts()[0].id, sink.posts[2].id);
    }

    #[tokio::test]
    async fn source_sees_the_active_mode() {
        let source = FakeSource::endless();
        let mut feed = controller(source, FakeGenerator::ok(), FeedMode::Topic("Black holes".into()));
        let mut history = TopicHistory::default();
        let mut sink = RecordingSink::default();

        feed.request_batch(1, &mut history, &mut sink).await;

        assert_eq!(
            feed.source.served_modes.borrow().as_slice(),
            &[FeedMode::Topic("Black holes".into())]
        );
    }
}
