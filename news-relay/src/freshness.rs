use crate::types::{FeedItem, RelayError, Result};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_WINDOW_HOURS: i64 = 2;

/// Admits items published at or after `now - window`.
///
/// The cutoff is fixed when the filter is built, so every item of a run is
/// judged against the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessFilter {
    cutoff: DateTime<Utc>,
}

impl FreshnessFilter {
    pub fn new(now: DateTime<Utc>, window: Duration) -> Self {
        Self { cutoff: now - window }
    }

    pub fn with_default_window(now: DateTime<Utc>) -> Self {
        Self::new(now, Duration::hours(DEFAULT_WINDOW_HOURS))
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn admit(&self, item: &FeedItem) -> bool {
        admit(item, self.cutoff)
    }

    pub fn is_fresh(&self, published_at: DateTime<Utc>) -> bool {
        published_at >= self.cutoff
    }
}

pub fn admit(item: &FeedItem, cutoff: DateTime<Utc>) -> bool {
    item.published_at >= cutoff
}

/// Converts a `--window-hours` value, refusing negative or unrepresentable spans.
pub fn window_from_hours(hours: i64) -> Result<Duration> {
    if hours < 0 {
        return Err(RelayError::Config(format!(
            "freshness window must not be negative, got {} hours",
            hours
        )));
    }
    Duration::try_hours(hours)
        .ok_or_else(|| RelayError::Config(format!("freshness window of {} hours is out of range", hours)))
}
