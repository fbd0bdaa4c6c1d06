mod common;

use common::{init_tracing, rss_document, silent_server};
use news_aggregator::types::{AggregatorError, FetchConfig, Result};
use news_aggregator::{FeedParser, Fetcher};
use std::time::{Duration, Instant};
use tracing::info;

fn test_config(timeout_seconds: u64) -> FetchConfig {
    FetchConfig {
        user_agent: "News-Aggregator-Test/1.0".to_string(),
        timeout_seconds,
        max_feed_size_mb: 1,
    }
}

#[tokio::test]
async fn test_fetch_returns_items_in_document_order() -> Result<()> {
    init_tracing();

    let body = rss_document(&[
        ("First", "https://example.com/1", "Mon, 02 Jan 2006 15:04:05 GMT", "one"),
        ("Second", "https://example.com/2", "not a date", "two"),
        ("Third", "https://example.com/3", "Tue, 03 Jan 2006 15:04:05 +0000", "three"),
    ]);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(body)
        .create_async()
        .await;

    let fetcher = Fetcher::new(test_config(10))?;
    let items = fetcher.fetch_feed(&format!("{}/feed.xml", server.url())).await?;

    mock.assert_async().await;
    info!("Fetched {} items", items.len());

    let links: Vec<&str> = items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(
        links,
        vec!["https://example.com/1", "https://example.com/2", "https://example.com/3"]
    );
    // Dates stay raw at the fetcher boundary.
    assert_eq!(items[1].pub_date, "not a date");
    assert_eq!(items[0].title, "First");
    assert_eq!(items[0].description, "one");
    Ok(())
}

#[tokio::test]
async fn test_fetch_reports_http_status_with_url() -> Result<()> {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing.xml")
        .with_status(500)
        .create_async()
        .await;

    let url = format!("{}/missing.xml", server.url());
    let fetcher = Fetcher::new(test_config(10))?;
    let err = fetcher.fetch_feed(&url).await.unwrap_err();

    match &err {
        AggregatorError::HttpStatus { url: failed, status } => {
            assert_eq!(failed, &url);
            assert_eq!(*status, 500);
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(err.to_string().contains(&url));
    Ok(())
}

#[tokio::test]
async fn test_fetch_rejects_malformed_body() -> Result<()> {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/page.html")
        .with_status(200)
        .with_body("<html><body>not a feed</body></html>")
        .create_async()
        .await;

    let fetcher = Fetcher::new(test_config(10))?;
    let err = fetcher
        .fetch_feed(&format!("{}/page.html", server.url()))
        .await
        .unwrap_err();

    assert!(matches!(err, AggregatorError::Parse { .. }), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn test_fetch_rejects_oversized_feed() -> Result<()> {
    init_tracing();

    let filler = "x".repeat(1024 * 1024 + 1);
    let body = rss_document(&[("Big", "https://example.com/big", "Mon, 02 Jan 2006 15:04:05 GMT", filler.as_str())]);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/big.xml")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let fetcher = Fetcher::new(test_config(10))?;
    let err = fetcher
        .fetch_feed(&format!("{}/big.xml", server.url()))
        .await
        .unwrap_err();

    assert!(matches!(err, AggregatorError::FeedTooLarge { size_mb: 2, .. }), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn test_fetch_times_out() -> Result<()> {
    init_tracing();

    let addr = silent_server().await;
    let fetcher = Fetcher::new(test_config(1))?;

    let start = Instant::now();
    let err = fetcher
        .fetch_feed(&format!("http://{}/feed.xml", addr))
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {:?}", err);
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn test_fetch_fails_on_unreachable_url() -> Result<()> {
    init_tracing();

    let fetcher = Fetcher::new(test_config(2))?;
    let err = fetcher.fetch_feed("not a url").await.unwrap_err();
    assert!(matches!(err, AggregatorError::Fetch { .. }), "got {:?}", err);
    Ok(())
}

#[test]
fn test_parser_skips_items_without_link() {
    let body = rss_document(&[
        ("Linked", "https://example.com/a", "Mon, 02 Jan 2006 15:04:05 GMT", "a"),
        ("Unlinked", "", "Mon, 02 Jan 2006 15:04:05 GMT", "b"),
    ]);

    let items = FeedParser::parse_items("test", body.as_bytes()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Linked");
}

#[test]
fn test_parser_keeps_missing_fields_empty() {
    let body = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://example.com</link><description>d</description>
<item><link>https://example.com/bare</link></item>
</channel></rss>"#;

    let items = FeedParser::parse_items("test", body.as_bytes()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "");
    assert_eq!(items[0].pub_date, "");
    assert_eq!(items[0].description, "");
}
