use crate::types::{AggregatorError, RawEntry, Result};
use rss::{Channel, Item};
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parse an RSS 2.0 document into its items, in document order.
    ///
    /// `url` is only used to label errors. Items without a `<link>` are
    /// skipped: the link is what identifies an entry across cycles.
    pub fn parse_items(url: &str, content: &[u8]) -> Result<Vec<RawEntry>> {
        debug!("Parsing feed {} ({} bytes)", url, content.len());

        let channel = Channel::read_from(content).map_err(|e| AggregatorError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let entries: Vec<RawEntry> = channel
            .items()
            .iter()
            .filter_map(|item| Self::parse_item(url, item))
            .collect();

        debug!("Parsed {} items from {}", entries.len(), url);
        Ok(entries)
    }

    fn parse_item(url: &str, item: &Item) -> Option<RawEntry> {
        let link = match item.link().map(str::trim) {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => {
                debug!("Skipping item without link in {}: {:?}", url, item.title());
                return None;
            }
        };

        Some(RawEntry {
            title: item.title().unwrap_or_default().to_string(),
            link,
            pub_date: item.pub_date().unwrap_or_default().to_string(),
            description: item.description().unwrap_or_default().to_string(),
        })
    }
}
