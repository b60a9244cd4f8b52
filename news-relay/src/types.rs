use chrono::{DateTime, Utc};
use std::fmt;

/// An entry as a feed source yields it, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    pub guid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ParsedEntry {
    /// The instant the entry counts as published at.
    ///
    /// Atom only mandates `<updated>`, so it stands in when `<published>` is absent.
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        self.published_at.or(self.updated_at).ok_or_else(|| RelayError::TimestampParse {
            title: self.title.as_deref().unwrap_or_default().trim().to_string(),
        })
    }
}

/// A validated feed item: non-empty title and an absolute publish instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

impl FeedItem {
    /// Text handed to the rewriter: the title, then the summary on the next line.
    pub fn raw_text(&self) -> String {
        format!("{}\n{}", self.title, self.summary)
    }
}

impl TryFrom<ParsedEntry> for FeedItem {
    type Error = RelayError;

    fn try_from(entry: ParsedEntry) -> Result<Self> {
        let published_at = entry.timestamp()?;

        let title = entry
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RelayError::MissingTitle {
                entry: entry.guid.clone().or_else(|| entry.url.clone()).unwrap_or_default(),
            })?;

        Ok(Self {
            title,
            summary: entry.summary.unwrap_or_default(),
            published_at,
        })
    }
}

/// Unconstrained completion text, exactly as the rewriter returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDraft(pub String);

impl RawDraft {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Text that satisfies the restricted delivery grammar.
///
/// Only [`crate::sanitizer::sanitize`] constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPost(pub(crate) String);

impl FormattedPost {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub ok: bool,
    pub detail: String,
}

impl DeliveryResult {
    pub fn delivered(detail: impl Into<String>) -> Self {
        Self { ok: true, detail: detail.into() }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self { ok: false, detail: detail.into() }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Relay/1.0".to_string(),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Entry has no usable title: {entry}")]
    MissingTitle { entry: String },

    #[error("No resolvable publish timestamp for '{title}'")]
    TimestampParse { title: String },

    #[error("Rewrite service error: {0}")]
    Rewrite(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
