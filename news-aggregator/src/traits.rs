use crate::types::{Entry, RawEntry, Result, UpsertSummary};
use async_trait::async_trait;

/// Source of raw feed items for one URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve and parse one feed. A single attempt; no partial results on error.
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// Durable entry storage keyed by `link`.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert every entry whose link is not stored yet. Existing rows are
    /// never touched. Row-level failures are counted, connectivity failures
    /// are returned.
    async fn upsert_all(&self, entries: &[Entry]) -> Result<UpsertSummary>;

    /// Up to `n` entries, most recently published first.
    async fn query_recent(&self, n: usize) -> Result<Vec<Entry>>;

    /// Release connections on shutdown.
    async fn close(&self) {}
}
