use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::FeedSource;
use crate::types::{FetchConfig, ParsedEntry, RelayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;

/// RSS/Atom feed read over HTTP
pub struct RssFeedSource {
    pub feed_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(url: String, client: Client, fetch_config: FetchConfig) -> Self {
        Self {
            feed_id: Uuid::new_v4(),
            url,
            title: None,
            fetcher: Fetcher::new(client, fetch_config),
            parser: FeedParser::new(),
        }
    }

    fn source_name(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            url::Url::parse(&self.url)
                .ok()
                .and_then(|parsed| parsed.domain().map(|d| format!("RSS Feed ({})", d)))
                .unwrap_or_else(|| "RSS Feed".to_string())
        })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn source_id(&self) -> String {
        self.url.clone()
    }

    async fn pull(&mut self) -> Result<Vec<ParsedEntry>> {
        info!("Pulling RSS feed: {} ({})", self.url, self.feed_id);

        let content = self.fetcher.fetch_feed(&self.url).await?;

        if !FeedParser::is_valid_feed_content(&content) {
            warn!("Response from {} does not look like a feed", self.url);
            return Err(RelayError::Parse(format!("Not a feed document: {}", self.url)));
        }

        let parsed_feed = self.parser.parse_feed(&content)?;
        if self.title.is_none() {
            self.title = parsed_feed.title;
        }

        info!(
            "Pulled {} entries from {}",
            parsed_feed.entries.len(),
            self.source_name()
        );
        Ok(parsed_feed.entries)
    }
}
