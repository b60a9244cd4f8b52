use crate::llm_adapter::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::types::{RelayError, Result};
use std::env;

pub const DEFAULT_FEEDS: [&str; 4] = [
    "https://www.tagesschau.de/xml/rss2",
    "https://www.zdf.de/rss/zdfheutea.xml",
    "https://www.spiegel.de/international/index.rss",
    "https://www.sueddeutsche.de/news/rss",
];

/// Credentials and endpoints taken from the environment
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Absent only in dry-run mode
    pub telegram: Option<TelegramConfig>,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl RelayConfig {
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `RELAY_MODEL`, `BOT_TOKEN` and `CHAT_ID`.
    /// Missing credentials are reported here rather than on the first outbound call.
    pub fn from_env(dry_run: bool) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), dry_run)
    }

    pub fn from_lookup<F>(lookup: F, dry_run: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| RelayError::Config(format!("{} is not set", key)))
        };

        let telegram = if dry_run {
            None
        } else {
            Some(TelegramConfig {
                bot_token: required("BOT_TOKEN")?,
                chat_id: required("CHAT_ID")?,
            })
        };

        Ok(Self {
            api_key: required("OPENAI_API_KEY")?,
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("RELAY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            telegram,
        })
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("telegram", &self.telegram.as_ref().map(|t| &t.chat_id))
            .finish()
    }
}
