use anyhow::{Result, anyhow};
use colored::Colorize;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

const WIKI_BASE: &str = "https://en.wikipedia.org";

/// A normalized Wikipedia article summary.
///
/// Anything handed to the prompt builder has a non-empty title and
/// extract; records failing that are discarded during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub extract: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub year: Option<i32>,
    pub is_historical_event: bool,
}

/// Shape of the REST summary endpoint (and of the pages embedded in the
/// "on this day" feed).
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: DesktopUrls,
}

#[derive(Debug, Deserialize)]
struct DesktopUrls {
    page: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct OnThisDayResponse {
    #[serde(default)]
    events: Vec<OnThisDayEvent>,
}

#[derive(Debug, Deserialize)]
struct OnThisDayEvent {
    #[serde(default)]
    text: String,
    year: Option<i32>,
    #[serde(default)]
    pages: Vec<SummaryResponse>,
}

/// Client for the Wikipedia REST and action APIs.
pub struct WikiClient {
    http: Client,
}

impl WikiClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("wikifeed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Resolve a search term to an article, or `None` if anything along
    /// the way fails. Failures are logged, never raised: the caller
    /// treats `None` as "skip this slot".
    pub async fn resolve(&self, term: &str) -> Option<ArticleRecord> {
        match self.try_resolve(term).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                eprintln!("{}", format!("no article found for '{term}'").dimmed());
                None
            }
            Err(err) => {
                eprintln!("{} {err:#}", "wikipedia fetch failed:".yellow());
                None
            }
        }
    }

    /// Direct summary for the exact term; if that misses, full-text
    /// search and take the top hit's summary.
    async fn try_resolve(&self, term: &str) -> Result<Option<ArticleRecord>> {
        if let Some(record) = self.summary(term).await? {
            return Ok(Some(record));
        }

        let titles = self.search_titles(term).await?;
        match titles.first() {
            Some(title) => self.summary(title).await,
            None => Ok(None),
        }
    }

    async fn summary(&self, title: &str) -> Result<Option<ArticleRecord>> {
        let url = rest_url(&["api", "rest_v1", "page", "summary", title])?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let data: SummaryResponse = resp.json().await?;
        Ok(normalize(data))
    }

    /// Full-text search, returning result titles in ranking order.
    pub async fn search_titles(&self, term: &str) -> Result<Vec<String>> {
        let url = rest_url(&["w", "api.php"])?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", term),
                ("format", "json"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("search returned HTTP {}", resp.status()));
        }
        let data: SearchResponse = resp.json().await?;
        let titles = data
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default();
        Ok(titles)
    }

    /// One random article summary, already normalized. Used by the
    /// random feed, which bypasses term selection entirely.
    pub async fn random_summary(&self) -> Option<ArticleRecord> {
        let result: Result<Option<ArticleRecord>> = async {
            let url = rest_url(&["api", "rest_v1", "page", "random", "summary"])?;
            let resp = self.http.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(anyhow!("random summary returned HTTP {}", resp.status()));
            }
            let data: SummaryResponse = resp.json().await?;
            Ok(normalize(data))
        }
        .await;

        match result {
            Ok(record) => record,
            Err(err) => {
                eprintln!("{} {err:#}", "random article fetch failed:".yellow());
                None
            }
        }
    }

    /// Historical events for a calendar day, as article records carrying
    /// the event year.
    pub async fn on_this_day(&self, month: u32, day: u32) -> Result<Vec<ArticleRecord>> {
        let url = rest_url(&[
            "api",
            "rest_v1",
            "feed",
            "onthisday",
            "events",
            &format!("{month:02}"),
            &format!("{day:02}"),
        ])?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("on-this-day returned HTTP {}", resp.status()));
        }
        let data: OnThisDayResponse = resp.json().await?;
        Ok(data.events.into_iter().filter_map(event_record).collect())
    }
}

fn rest_url(segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(WIKI_BASE)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("invalid base url"))?
        .extend(segments);
    Ok(url)
}

/// Canonical page link built from the title, for responses that omit
/// `content_urls`.
fn page_url(title: &str) -> String {
    rest_url(&["wiki", title])
        .map(String::from)
        .unwrap_or_else(|_| format!("{WIKI_BASE}/wiki/{title}"))
}

/// Drop records that would violate the non-empty title/extract invariant.
fn normalize(data: SummaryResponse) -> Option<ArticleRecord> {
    if data.title.trim().is_empty() || data.extract.trim().is_empty() {
        return None;
    }
    let url = data
        .content_urls
        .map(|c| c.desktop.page)
        .unwrap_or_else(|| page_url(&data.title));
    Some(ArticleRecord {
        url,
        extract: data.extract,
        thumbnail: data.thumbnail.map(|t| t.source),
        year: None,
        is_historical_event: false,
        title: data.title,
    })
}

/// An event's lead page, with the event year attached. Extract falls
/// back to the event blurb when the page has none.
fn event_record(event: OnThisDayEvent) -> Option<ArticleRecord> {
    let page = event.pages.into_iter().next()?;
    let extract = if page.extract.trim().is_empty() {
        event.text.clone()
    } else {
        page.extract.clone()
    };
    let mut record = normalize(SummaryResponse { extract, ..page })?;
    record.year = event.year;
    record.is_historical_event = true;
    Some(record)
}
