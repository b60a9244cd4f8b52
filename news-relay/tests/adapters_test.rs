mod common;

use common::{local_client, refused_base_url, serve_once};
use news_relay::llm_adapter::CompletionRequest;
use news_relay::rewriter::{MAX_OUTPUT_TOKENS, STYLE_INSTRUCTION, TEMPERATURE};
use news_relay::{
    sanitize, ContentRewriter, DryRunPublisher, LlmAdapter, MockLlmAdapter, OpenAiAdapter, Publisher,
    RelayConfig, RelayError, TelegramPublisher,
};
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn test_rewrite_request_carries_style_contract() {
    let request = ContentRewriter::build_request("Titel\nZusammenfassung");

    assert_eq!(request.system, STYLE_INSTRUCTION);
    assert!(request.system.contains("keine `**` oder `__`"));
    assert!(request.user.ends_with("\n\nTitel\nZusammenfassung"));
    assert_eq!(request.temperature, 0.7);
    assert_eq!(request.max_tokens, 600);
}

#[test]
fn test_openai_request_body() {
    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        "https://openrouter.ai/api/v1",
        "sk-test",
        "mistralai/mistral-7b-instruct",
    );
    let request = CompletionRequest {
        system: "system".to_string(),
        user: "user".to_string(),
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    };

    let body = adapter.request_body(&request).unwrap();
    assert_eq!(body["model"], "mistralai/mistral-7b-instruct");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["max_tokens"].as_u64(), Some(600));
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_rewriter_returns_draft_verbatim() {
    let adapter = MockLlmAdapter::new("scripted").with_response("**Roh**\n  Text  ");
    let rewriter = ContentRewriter::new(Arc::new(adapter));

    let draft = rewriter.rewrite("Titel\n").await.unwrap();
    assert_eq!(draft.as_str(), "**Roh**\n  Text  ");
}

#[tokio::test]
async fn test_rewriter_failure_is_rewrite_error() {
    let adapter = MockLlmAdapter::new("down").with_failure("connection refused");
    assert!(adapter.adapter_name().contains("down"));
    let rewriter = ContentRewriter::new(Arc::new(adapter));

    match rewriter.rewrite("Titel\n").await {
        Err(RelayError::Rewrite(reason)) => assert_eq!(reason, "connection refused"),
        other => panic!("expected rewrite error, got {:?}", other),
    }
}

#[test]
fn test_telegram_payload_requests_markdown() {
    let publisher = TelegramPublisher::new(reqwest::Client::new(), "123:abc", "-10042");
    let post = sanitize("Titel\nText");

    let payload = publisher.message_payload(&post);
    assert_eq!(payload["chat_id"], "-10042");
    assert_eq!(payload["text"], "*Titel*\n\nText");
    assert_eq!(payload["parse_mode"], "Markdown");
}

#[test]
fn test_dry_run_publisher_reports_success() {
    let post = sanitize("Titel\nText");
    let result = tokio_test::block_on(DryRunPublisher.publish(&post));
    assert!(result.ok);
}

#[test]
fn test_config_requires_credentials() {
    let env: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk-test"), ("BOT_TOKEN", "123:abc")].into();
    let lookup = |key: &str| env.get(key).map(|v| v.to_string());

    match RelayConfig::from_lookup(lookup, false) {
        Err(RelayError::Config(msg)) => assert!(msg.contains("CHAT_ID")),
        other => panic!("expected config error, got {:?}", other),
    }

    let config = RelayConfig::from_lookup(lookup, true).unwrap();
    assert!(config.telegram.is_none());
    assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.model, "mistralai/mistral-7b-instruct");
    assert!(!format!("{:?}", config).contains("sk-test"));
}

fn sample_request() -> CompletionRequest {
    ContentRewriter::build_request("Titel\nZusammenfassung")
}

#[tokio::test]
async fn test_openai_adapter_returns_completion_verbatim() {
    let base = serve_once(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"**Titel**\n  Text "}}]}"#,
    )
    .await;
    let adapter = OpenAiAdapter::new(local_client(), &base, "sk-test", "test-model");

    let text = adapter.complete(&sample_request()).await.unwrap();
    assert_eq!(text, "**Titel**\n  Text ");
}

#[tokio::test]
async fn test_openai_adapter_failures_are_rewrite_errors() {
    let cases = [
        (500, r#"{"error":"overloaded"}"#),
        (200, "not json"),
        (200, r#"{"choices":[]}"#),
        (200, r#"{"choices":[{"message":{"content":null}}]}"#),
    ];

    for (status, body) in cases {
        let base = serve_once(status, body).await;
        let adapter = OpenAiAdapter::new(local_client(), &base, "sk-test", "test-model");

        match adapter.complete(&sample_request()).await {
            Err(RelayError::Rewrite(reason)) => {
                if status != 200 {
                    assert!(reason.contains("HTTP 500"), "unexpected reason: {}", reason);
                    assert!(reason.contains("overloaded"));
                }
            }
            other => panic!("expected rewrite error for {} {}, got {:?}", status, body, other),
        }
    }
}

#[tokio::test]
async fn test_telegram_publish_ok_on_http_200() {
    let base = serve_once(200, r#"{"ok":true,"result":{"message_id":7}}"#).await;
    let publisher = TelegramPublisher::new(local_client(), "123:secret", "-10042").with_api_base(base);

    let result = publisher.publish(&sanitize("Titel\nText")).await;
    assert!(result.ok);
    assert!(result.detail.contains("message_id"));
}

#[tokio::test]
async fn test_telegram_publish_reports_error_body() {
    let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#;
    let base = serve_once(400, body).await;
    let publisher = TelegramPublisher::new(local_client(), "123:secret", "-10042").with_api_base(base);

    let result = publisher.publish(&sanitize("Titel\nText")).await;
    assert!(!result.ok);
    assert_eq!(result.detail, body);
}

#[tokio::test]
async fn test_telegram_transport_error_hides_token() {
    let base = refused_base_url().await;
    let publisher = TelegramPublisher::new(local_client(), "123:secret", "-10042").with_api_base(base);

    let result = publisher.publish(&sanitize("Titel\nText")).await;
    assert!(!result.ok);
    assert!(!result.detail.is_empty());
    assert!(!result.detail.contains("123:secret"));
}
