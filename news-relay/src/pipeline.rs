use crate::dedup::{DuplicateDetector, ProcessedTitleHistory};
use crate::freshness::FreshnessFilter;
use crate::publisher::Publisher;
use crate::rewriter::ContentRewriter;
use crate::sanitizer::sanitize_draft;
use crate::traits::FeedSource;
use crate::types::{FeedItem, ParsedEntry, RelayError};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Why an entry was dropped without being an error
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Stale { published_at: DateTime<Utc> },
    Duplicate { matched: String, ratio: f64 },
}

/// Result of running one entry through the stages
#[derive(Debug)]
pub enum ItemOutcome {
    Published { title: String },
    Skipped(SkipReason),
    Failed(RelayError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub feeds_visited: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub published: usize,
    pub stale: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub published_titles: Vec<String>,
}

/// State owned by a single run
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub freshness: FreshnessFilter,
    pub history: ProcessedTitleHistory,
    report: RunReport,
}

impl RunContext {
    pub fn new(freshness: FreshnessFilter) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            freshness,
            history: ProcessedTitleHistory::new(),
            report: RunReport {
                run_id,
                ..RunReport::default()
            },
        }
    }

    fn tally(&mut self, outcome: &ItemOutcome) {
        self.report.entries_seen += 1;
        match outcome {
            ItemOutcome::Published { .. } => self.report.published += 1,
            ItemOutcome::Skipped(SkipReason::Stale { .. }) => self.report.stale += 1,
            ItemOutcome::Skipped(SkipReason::Duplicate { .. }) => self.report.duplicates += 1,
            ItemOutcome::Failed(_) => self.report.failed += 1,
        }
    }

    fn finish(mut self) -> RunReport {
        self.report.published_titles = self.history.titles().to_vec();
        self.report
    }
}

/// Drives one run: every feed in order, every entry through
/// freshness → duplicate → rewrite → sanitize → publish → record.
pub struct RelayPipeline {
    sources: Vec<Box<dyn FeedSource>>,
    detector: DuplicateDetector,
    rewriter: ContentRewriter,
    publisher: Box<dyn Publisher>,
}

impl RelayPipeline {
    pub fn new(
        sources: Vec<Box<dyn FeedSource>>,
        detector: DuplicateDetector,
        rewriter: ContentRewriter,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        Self {
            sources,
            detector,
            rewriter,
            publisher,
        }
    }

    pub async fn run(&mut self, freshness: FreshnessFilter) -> RunReport {
        let mut ctx = RunContext::new(freshness);
        let span = info_span!("run", run_id = %ctx.run_id);

        async move {
            info!(
                "Starting run over {} feeds (cutoff {}, rewriter {}, publisher {})",
                self.sources.len(),
                ctx.freshness.cutoff(),
                self.rewriter.adapter_name(),
                self.publisher.publisher_name()
            );

            for source in self.sources.iter_mut() {
                let source_id = source.source_id();
                ctx.report.feeds_visited += 1;
                info!("Reading feed: {}", source_id);

                let entries = match source.pull().await {
                    Ok(entries) => entries,
                    Err(e) => {
                        error!("Failed to pull feed {}: {}", source_id, e);
                        ctx.report.feeds_failed += 1;
                        continue;
                    }
                };

                for entry in entries {
                    let outcome =
                        process_entry(&mut ctx, &self.detector, &self.rewriter, self.publisher.as_ref(), entry)
                            .await;
                    log_outcome(&outcome);
                    ctx.tally(&outcome);
                }
            }

            let report = ctx.finish();
            info!(
                "Run finished: {} published, {} stale, {} duplicates, {} failed, {}/{} feeds failed",
                report.published,
                report.stale,
                report.duplicates,
                report.failed,
                report.feeds_failed,
                report.feeds_visited
            );
            report
        }
        .instrument(span)
        .await
    }
}

async fn process_entry(
    ctx: &mut RunContext,
    detector: &DuplicateDetector,
    rewriter: &ContentRewriter,
    publisher: &dyn Publisher,
    entry: ParsedEntry,
) -> ItemOutcome {
    // the window is checked before the title, so an old entry is stale even when it is untitled
    let published_at = match entry.timestamp() {
        Ok(published_at) => published_at,
        Err(e) => return ItemOutcome::Failed(e),
    };
    if !ctx.freshness.is_fresh(published_at) {
        return ItemOutcome::Skipped(SkipReason::Stale { published_at });
    }

    let item = match FeedItem::try_from(entry) {
        Ok(item) => item,
        Err(e) => return ItemOutcome::Failed(e),
    };

    if let Some(dup) = detector.first_match(&item.title, &ctx.history) {
        return ItemOutcome::Skipped(SkipReason::Duplicate {
            matched: dup.matched,
            ratio: dup.ratio,
        });
    }

    info!("Processing: {}", item.title);
    let draft = match rewriter.rewrite(&item.raw_text()).await {
        Ok(draft) => draft,
        Err(e) => return ItemOutcome::Failed(e),
    };

    let post = sanitize_draft(&draft);
    debug!("Formatted post:\n{}", post);

    let delivery = publisher.publish(&post).await;
    if !delivery.ok {
        return ItemOutcome::Failed(RelayError::Delivery(delivery.detail));
    }

    ctx.history.record(item.title.clone());
    ItemOutcome::Published { title: item.title }
}

fn log_outcome(outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Published { title } => info!("Sent: {}", title),
        ItemOutcome::Skipped(SkipReason::Stale { published_at }) => {
            debug!("Skipped (published {}, outside window)", published_at)
        }
        ItemOutcome::Skipped(SkipReason::Duplicate { matched, ratio }) => {
            info!("Skipped (duplicate of '{}', ratio {:.2})", matched, ratio)
        }
        ItemOutcome::Failed(e) => warn!("Entry failed: {}", e),
    }
}
