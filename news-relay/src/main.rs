use chrono::Utc;
use clap::Parser;
use news_relay::config::DEFAULT_FEEDS;
use news_relay::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use news_relay::fetcher::build_client;
use news_relay::freshness::{window_from_hours, DEFAULT_WINDOW_HOURS};
use news_relay::{
    ContentRewriter, DryRunPublisher, DuplicateDetector, FeedSource, FetchConfig, FreshnessFilter,
    OpenAiAdapter, Publisher, RelayConfig, RelayPipeline, RssFeedSource, TelegramPublisher,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Rewrites fresh news feed items into channel posts and publishes them, once.
#[derive(Debug, Parser)]
#[command(name = "news-relay", version)]
struct Cli {
    /// Feed URL to read; repeat for several. Defaults to the built-in German news feeds.
    #[arg(long = "feed")]
    feeds: Vec<String>,

    /// Only items published within this many hours are relayed
    #[arg(long, default_value_t = DEFAULT_WINDOW_HOURS, value_parser = clap::value_parser!(i64).range(0..))]
    window_hours: i64,

    /// Titles more similar than this to an already published one are skipped
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD, value_parser = parse_threshold)]
    threshold: f64,

    /// Timeout for every outbound HTTP request
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,

    /// Log posts instead of sending them
    #[arg(long)]
    dry_run: bool,
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value.parse().map_err(|e| format!("{}", e))?;
    DuplicateDetector::try_new(threshold)
        .map(|detector| detector.threshold())
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let window = window_from_hours(cli.window_hours)?;
    let detector = DuplicateDetector::try_new(cli.threshold)?;

    let config = RelayConfig::from_env(cli.dry_run).map_err(|e| {
        error!("{}", e);
        e
    })?;
    info!("Starting news relay with {:?}", config);

    let fetch_config = FetchConfig {
        timeout_seconds: cli.timeout_seconds,
        ..FetchConfig::default()
    };
    let client = build_client(&fetch_config)?;

    let feeds: Vec<String> = if cli.feeds.is_empty() {
        DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.feeds
    };
    let sources: Vec<Box<dyn FeedSource>> = feeds
        .into_iter()
        .map(|url| Box::new(RssFeedSource::new(url, client.clone(), fetch_config.clone())) as Box<dyn FeedSource>)
        .collect();

    let adapter = OpenAiAdapter::new(client.clone(), &config.base_url, &config.api_key, &config.model);
    let rewriter = ContentRewriter::new(Arc::new(adapter));

    let publisher: Box<dyn Publisher> = match &config.telegram {
        Some(telegram) => Box::new(TelegramPublisher::new(
            client.clone(),
            &telegram.bot_token,
            &telegram.chat_id,
        )),
        None => Box::new(DryRunPublisher),
    };

    let mut pipeline = RelayPipeline::new(
        sources,
        detector,
        rewriter,
        publisher,
    );

    let freshness = FreshnessFilter::new(Utc::now(), window);
    let report = pipeline.run(freshness).await;

    info!(
        "News relay finished: {} of {} entries published",
        report.published, report.entries_seen
    );
    Ok(())
}
