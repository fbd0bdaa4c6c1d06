#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_aggregator::types::{AggregatorError, Entry, RawEntry, Result, UpsertSummary};
use news_aggregator::{EntryStore, FeedSource};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// `(title, link, pubDate, description)`
pub type Item<'a> = (&'a str, &'a str, &'a str, &'a str);

pub fn rss_document(items: &[Item]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date, description)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>{}</description></item>",
                title, link, pub_date, description
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com/</link>
    <description>Feed used in tests</description>
    {}
  </channel>
</rss>"#,
        items
    )
}

pub fn raw(title: &str, link: &str, pub_date: &str) -> RawEntry {
    RawEntry {
        title: title.to_string(),
        link: link.to_string(),
        pub_date: pub_date.to_string(),
        description: format!("About {}", title),
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

pub fn entry(title: &str, link: &str, secs: i64) -> Entry {
    Entry {
        title: title.to_string(),
        link: link.to_string(),
        published_at: at(secs),
        content: format!("Content of {}", title),
    }
}

/// Feed source answering from a fixed table. URLs missing from the table
/// fail with HTTP 404; `failing` URLs fail with HTTP 503.
#[derive(Default)]
pub struct StaticSource {
    pub feeds: HashMap<String, Vec<RawEntry>>,
    pub failing: Vec<String>,
    pub delay: Option<Duration>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, items: Vec<RawEntry>) -> Self {
        self.feeds.insert(url.to_string(), items);
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.failing.push(url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.iter().any(|f| f == url) {
            return Err(AggregatorError::HttpStatus {
                url: url.to_string(),
                status: 503,
            });
        }
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| AggregatorError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Source whose fetch task panics for one URL.
pub struct PanickingSource {
    pub inner: StaticSource,
    pub panic_on: String,
}

#[async_trait]
impl FeedSource for PanickingSource {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        if url == self.panic_on {
            panic!("parser blew up on {}", url);
        }
        self.inner.fetch(url).await
    }
}

/// Store whose connection is gone.
pub struct UnavailableStore;

#[async_trait]
impl EntryStore for UnavailableStore {
    async fn upsert_all(&self, _entries: &[Entry]) -> Result<UpsertSummary> {
        Err(AggregatorError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn query_recent(&self, _n: usize) -> Result<Vec<Entry>> {
        Err(AggregatorError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// A TCP endpoint that accepts connections and never answers.
pub async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent server");
    let addr = listener.local_addr().expect("silent server address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}
