#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use news_relay::{DeliveryResult, FeedSource, FormattedPost, ParsedEntry, Publisher, RelayError, Result};
use std::sync::{Arc, Mutex, Once};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn entry(title: &str, summary: &str, published_at: DateTime<Utc>) -> ParsedEntry {
    ParsedEntry {
        title: Some(title.to_string()),
        summary: Some(summary.to_string()),
        published_at: Some(published_at),
        ..ParsedEntry::default()
    }
}

pub fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(minutes)
}

/// In-memory feed; `failing` makes every pull return an error
pub struct StaticFeedSource {
    id: String,
    entries: Vec<ParsedEntry>,
    failing: bool,
}

impl StaticFeedSource {
    pub fn new(id: &str, entries: Vec<ParsedEntry>) -> Self {
        Self { id: id.to_string(), entries, failing: false }
    }

    pub fn failing(id: &str) -> Self {
        Self { id: id.to_string(), entries: Vec::new(), failing: true }
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    fn source_id(&self) -> String {
        self.id.clone()
    }

    async fn pull(&mut self) -> Result<Vec<ParsedEntry>> {
        if self.failing {
            return Err(RelayError::Fetch { url: self.id.clone(), reason: "HTTP 503".to_string() });
        }
        Ok(self.entries.clone())
    }
}

/// Records every post; rejects posts containing `reject_containing`
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    sent: Arc<Mutex<Vec<String>>>,
    reject_containing: Option<String>,
}

impl RecordingPublisher {
    pub fn rejecting(marker: &str) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            reject_containing: Some(marker.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn publisher_name(&self) -> String {
        "recording".to_string()
    }

    async fn publish(&self, post: &FormattedPost) -> DeliveryResult {
        self.sent.lock().unwrap().push(post.as_str().to_string());
        match &self.reject_containing {
            Some(marker) if post.as_str().contains(marker.as_str()) => {
                DeliveryResult::rejected("Bad Request: can't parse entities")
            }
            _ => DeliveryResult::delivered("{\"ok\":true}"),
        }
    }
}

/// Client for talking to [`serve_once`] servers, bypassing any proxy from the environment
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Serves a single HTTP response on a local port and returns the base URL.
pub async fn serve_once(status: u16, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason_phrase(status),
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);

        if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
