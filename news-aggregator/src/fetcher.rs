use crate::parser::FeedParser;
use crate::traits::FeedSource;
use crate::types::{AggregatorError, FetchConfig, RawEntry, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info};

const MB: u64 = 1024 * 1024;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// One bounded GET of `url`, parsed into raw items. No retries: a failed
    /// feed is simply tried again next cycle.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<RawEntry>> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| AggregatorError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_feed_bytes();
        if let Some(content_length) = response.content_length() {
            if content_length > limit {
                return Err(too_large(url, content_length));
            }
        }

        // Content-Length is optional, so the body is checked again after reading.
        let body = response.bytes().await.map_err(|source| AggregatorError::Fetch {
            url: url.to_string(),
            source,
        })?;
        if body.len() as u64 > limit {
            return Err(too_large(url, body.len() as u64));
        }

        let entries = FeedParser::parse_items(url, &body)?;

        info!(
            "Fetched feed {} ({} bytes, {} items) in {}ms",
            url,
            body.len(),
            entries.len(),
            start_time.elapsed().as_millis()
        );
        Ok(entries)
    }
}

fn too_large(url: &str, bytes: u64) -> AggregatorError {
    AggregatorError::FeedTooLarge {
        url: url.to_string(),
        size_mb: bytes.div_ceil(MB),
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        self.fetch_feed(url).await
    }
}
