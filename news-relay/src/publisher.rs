use crate::types::{DeliveryResult, FormattedPost};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{info, warn};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Trait for delivering a finished post to its destination
#[async_trait]
pub trait Publisher: Send + Sync {
    fn publisher_name(&self) -> String;

    /// Deliver one post. Transport failures are reported through the result, not raised.
    async fn publish(&self, post: &FormattedPost) -> DeliveryResult;
}

/// Telegram Bot API `sendMessage` with Markdown rendering
pub struct TelegramPublisher {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramPublisher {
    pub fn new(client: Client, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn message_payload(&self, post: &FormattedPost) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "text": post.as_str(),
            "parse_mode": "Markdown"
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn publisher_name(&self) -> String {
        format!("Telegram (chat {})", self.chat_id)
    }

    async fn publish(&self, post: &FormattedPost) -> DeliveryResult {
        let resp = match self
            .client
            .post(self.endpoint())
            .json(&self.message_payload(post))
            .send()
            .await
        {
            Ok(resp) => resp,
            // the error text may embed the URL, which carries the bot token
            Err(e) => return DeliveryResult::rejected(e.without_url().to_string()),
        };

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if status == StatusCode::OK {
            DeliveryResult::delivered(body)
        } else {
            warn!("Telegram rejected message with HTTP {}", status);
            DeliveryResult::rejected(body)
        }
    }
}

/// Logs posts instead of sending them
#[derive(Debug, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    fn publisher_name(&self) -> String {
        "dry run".to_string()
    }

    async fn publish(&self, post: &FormattedPost) -> DeliveryResult {
        info!("Dry run, not sending:\n{}", post);
        DeliveryResult::delivered("dry run")
    }
}
