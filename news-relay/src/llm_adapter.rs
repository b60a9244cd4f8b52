use crate::types::{RelayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

/// One stateless completion call: a system instruction and a user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for text-in/text-out completion services
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    fn adapter_name(&self) -> String;

    /// Return the completion text verbatim
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Adapter for OpenAI-compatible `/chat/completions` endpoints (OpenAI, OpenRouter, ...)
pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// JSON body sent for `request`.
    pub fn request_body(&self, request: &CompletionRequest) -> Result<serde_json::Value> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    fn adapter_name(&self) -> String {
        format!("OpenAI-compatible ({})", self.model)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.request_body(request)?;
        debug!("Requesting completion from {}", self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Rewrite(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::Rewrite(format!("HTTP {}: {}", status, error_text)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Rewrite(format!("malformed response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RelayError::Rewrite("response carried no completion".to_string()))
    }
}

/// Mock adapter replaying scripted responses, for development and testing.
///
/// Each call pops the next scripted response; once the script runs out, the
/// request's user text is echoed back.
pub struct MockLlmAdapter {
    name: String,
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()));
        self
    }

    fn push(&self, entry: std::result::Result<String, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => {
                info!("Mock adapter {} failing as scripted", self.name);
                Err(RelayError::Rewrite(reason))
            }
            None => Ok(request.user.clone()),
        }
    }
}
