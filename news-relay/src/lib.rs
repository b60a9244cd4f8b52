pub mod types;
pub mod config;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod freshness;
pub mod dedup;
pub mod llm_adapter;
pub mod rewriter;
pub mod sanitizer;
pub mod publisher;
pub mod pipeline;

pub use types::*;
pub use config::RelayConfig;
pub use traits::FeedSource;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::RssFeedSource;
pub use freshness::FreshnessFilter;
pub use dedup::{DuplicateDetector, ProcessedTitleHistory};
pub use llm_adapter::{LlmAdapter, MockLlmAdapter, OpenAiAdapter};
pub use rewriter::ContentRewriter;
pub use sanitizer::sanitize;
pub use publisher::{DryRunPublisher, Publisher, TelegramPublisher};
pub use pipeline::{ItemOutcome, RelayPipeline, RunReport, SkipReason};
