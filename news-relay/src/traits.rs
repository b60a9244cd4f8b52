use crate::types::{ParsedEntry, Result};
use async_trait::async_trait;

/// Trait for pulling entries from a syndication source
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Identifier used in logs, normally the feed URL
    fn source_id(&self) -> String;

    /// Fetch the entries the source currently lists, in feed order
    async fn pull(&mut self) -> Result<Vec<ParsedEntry>>;
}
