use crate::types::{ParsedEntry, RelayError, Result};
use chrono::Utc;
use feed_rs::parser;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse RSS 0.9x/1.0/2.0 or Atom content into entries, keeping feed order.
    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| RelayError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();

        info!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let guid = if entry.id.is_empty() { None } else { Some(entry.id.clone()) };
        let url = entry.links.first().map(|l| l.href.clone());

        ParsedEntry {
            guid,
            url,
            title: entry.title.map(|t| t.content),
            summary: entry.summary.map(|s| s.content),
            published_at: entry.published.map(|dt| dt.with_timezone(&Utc)),
            updated_at: entry.updated.map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();

        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("<channel")
    }
}
