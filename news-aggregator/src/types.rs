use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// RFC 1123 with a numeric zone, the text form `pubDate` is served in.
pub const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// One `<item>` exactly as the feed published it. The date is still raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub description: String,
}

/// A normalized feed item, eligible for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub content: String,
}

impl Entry {
    /// Publication time as stored in `posts.pub_time`.
    pub fn pub_time(&self) -> i64 {
        self.published_at.timestamp()
    }

    pub fn from_row(title: String, content: String, pub_time: i64, link: String) -> Result<Self> {
        let published_at = DateTime::<Utc>::from_timestamp(pub_time, 0).ok_or_else(|| {
            AggregatorError::General(format!("pub_time {} out of range for {}", pub_time, link))
        })?;

        Ok(Self {
            title,
            link,
            published_at,
            content,
        })
    }
}

/// Wire shape of an entry returned by `GET /news/{n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub content: String,
}

impl From<&Entry> for PostView {
    fn from(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            pub_date: entry.published_at.format(RFC1123Z).to_string(),
            content: entry.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Aggregator/1.0".to_string(),
            timeout_seconds: 10,
            max_feed_size_mb: 10,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn max_feed_bytes(&self) -> u64 {
        self.max_feed_size_mb as u64 * 1024 * 1024
    }
}

/// What one feed contributed to a cycle.
#[derive(Debug)]
pub struct FeedOutcome {
    pub url: String,
    pub result: Result<FeedContribution>,
}

#[derive(Debug, Default)]
pub struct FeedContribution {
    pub entries: Vec<Entry>,
    /// Items dropped because their date could not be normalized.
    pub dropped: usize,
}

impl FeedOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl UpsertSummary {
    pub fn attempted(&self) -> usize {
        self.inserted + self.duplicates + self.failed
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub feeds_total: usize,
    pub feeds_failed: usize,
    pub entries_fetched: usize,
    pub entries_dropped: usize,
    /// `None` when the store could not be reached this cycle.
    pub upsert: Option<UpsertSummary>,
    pub elapsed_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse feed {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("Feed {url} exceeds size limit: {size_mb}MB")]
    FeedTooLarge { url: String, size_mb: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("General error: {0}")]
    General(String),
}

impl AggregatorError {
    pub fn is_timeout(&self) -> bool {
        match self {
            AggregatorError::Fetch { source, .. } => source.is_timeout(),
            AggregatorError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
