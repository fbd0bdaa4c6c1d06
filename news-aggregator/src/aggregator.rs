use crate::normalizer::normalize;
use crate::traits::FeedSource;
use crate::types::{AggregatorError, Entry, FeedContribution, FeedOutcome, RawEntry, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fans one fetch task out per feed URL and merges what comes back.
pub struct Aggregator {
    source: Arc<dyn FeedSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self { source }
    }

    /// Fetch and normalize every feed concurrently, returning one tagged
    /// outcome per URL. Waits for all tasks; never fails as a whole.
    pub async fn collect(&self, urls: &[String]) -> Vec<FeedOutcome> {
        info!("Fetching {} feeds", urls.len());

        let handles = urls
            .iter()
            .map(|url| {
                let source = self.source.clone();
                let url = url.clone();
                tokio::spawn(async move { fetch_and_normalize(source.as_ref(), &url).await })
            })
            .collect::<Vec<_>>();

        let joined = join_all(handles).await;

        let outcomes: Vec<FeedOutcome> = urls
            .iter()
            .zip(joined)
            .map(|(url, joined)| FeedOutcome {
                url: url.clone(),
                result: joined.unwrap_or_else(|e| {
                    warn!("Fetch task for {} did not complete: {}", url, e);
                    Err(AggregatorError::General(format!("fetch task for {} failed: {}", url, e)))
                }),
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!("Fetched {}/{} feeds successfully", succeeded, outcomes.len());
        outcomes
    }

    /// The merged, unordered entries of every feed that succeeded.
    pub async fn aggregate_all(&self, urls: &[String]) -> Vec<Entry> {
        merge(self.collect(urls).await)
    }
}

async fn fetch_and_normalize(source: &dyn FeedSource, url: &str) -> Result<FeedContribution> {
    match source.fetch(url).await {
        Ok(raw) => Ok(normalize_entries(url, raw)),
        Err(e) => {
            if e.is_timeout() {
                warn!("Feed {} timed out: {}", url, e);
            } else {
                warn!("Skipping feed {}: {}", url, e);
            }
            Err(e)
        }
    }
}

/// Normalize the dates of one feed's items, dropping those that do not parse.
pub fn normalize_entries(url: &str, raw: Vec<RawEntry>) -> FeedContribution {
    let mut contribution = FeedContribution::default();

    for item in raw {
        match normalize(&item.pub_date) {
            Some(published_at) => contribution.entries.push(Entry {
                title: item.title,
                link: item.link,
                published_at,
                content: item.description,
            }),
            None => {
                warn!(
                    "Dropping entry {:?} ({}) from {}: unparseable date {:?}",
                    item.title, item.link, url, item.pub_date
                );
                contribution.dropped += 1;
            }
        }
    }

    debug!(
        "Feed {}: {} entries kept, {} dropped",
        url,
        contribution.entries.len(),
        contribution.dropped
    );
    contribution
}

/// Flatten successful outcomes; failed feeds contribute nothing.
pub fn merge(outcomes: Vec<FeedOutcome>) -> Vec<Entry> {
    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.result.ok())
        .flat_map(|contribution| contribution.entries)
        .collect()
}
