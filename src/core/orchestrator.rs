//! Workflow orchestrator.
//!
//! Runs one pass of the pipeline: fetch each URL, refine and analyze the
//! content, compose drafts, then enqueue them as a single batch. Composing
//! never touches the queue, so the store only needs to be open for the
//! final write.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{ContentRefiner, ContentSource};
use crate::analysis::{AnalyzedContent, Insights};
use crate::compose::{DraftComposer, TemplateComposer};
use crate::domain::{ContentRecord, DraftRecord};

use super::draft_queue::DraftQueue;

/// Default polite delay between URLs
pub const DEFAULT_DELAY_BETWEEN: Duration = Duration::from_secs(2);

/// Outcome of a workflow run
#[derive(Debug, Clone)]
pub struct WorkflowSummary {
    /// URLs handed to the run
    pub urls_requested: usize,

    /// Pages fetched and kept
    pub pages_processed: usize,

    /// URLs whose fetch failed
    pub fetch_failures: usize,

    /// Pages skipped because their text matched an earlier page
    pub duplicates_skipped: usize,

    /// Drafts appended to the queue
    pub drafts_queued: usize,

    /// Drafts dropped because the queue would reject them
    pub drafts_rejected: usize,

    /// Queue size after the run
    pub queue_size: usize,

    /// Aggregate analysis of the processed pages
    pub insights: Insights,

    /// Head of the queue after the run
    pub next_draft: Option<DraftRecord>,
}

/// Drafts composed by one run, not yet in the queue
#[derive(Debug, Clone)]
pub struct ComposedBatch {
    /// Drafts in URL order
    pub drafts: Vec<DraftRecord>,

    /// Fetch and analysis counts so far
    pub summary: WorkflowSummary,
}

/// Wires a content source, an optional refiner and a composer
pub struct Orchestrator {
    source: Box<dyn ContentSource>,
    refiner: Option<Box<dyn ContentRefiner>>,
    composer: Box<dyn DraftComposer>,
    delay_between: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with the template composer and no refiner
    pub fn new(source: Box<dyn ContentSource>) -> Self {
        Self {
            source,
            refiner: None,
            composer: Box::new(TemplateComposer::new()),
            delay_between: DEFAULT_DELAY_BETWEEN,
        }
    }

    /// Refine content before composing
    pub fn with_refiner(mut self, refiner: Box<dyn ContentRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    /// Use a different composer
    pub fn with_composer(mut self, composer: Box<dyn DraftComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// Set the delay between consecutive fetches
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_between = delay;
        self
    }

    /// Run the workflow over `urls`, enqueueing into `queue`
    ///
    /// The caller holds the queue for the whole run, network time included.
    /// Use [`Orchestrator::run_at`] to hold the store only while enqueueing.
    pub async fn run(&self, urls: &[String], queue: &mut DraftQueue) -> Result<WorkflowSummary> {
        let batch = self.compose_all(urls).await;
        self.enqueue(batch, queue)
    }

    /// Run the workflow, opening the store at `path` only once every draft
    /// is composed
    ///
    /// Other processes can read the queue while pages are being fetched.
    pub async fn run_at(&self, urls: &[String], path: &Path) -> Result<WorkflowSummary> {
        let batch = self.compose_all(urls).await;

        let mut queue = DraftQueue::open(path)
            .with_context(|| format!("Failed to open draft queue at {}", path.display()))?;
        self.enqueue(batch, &mut queue)
    }

    /// Fetch, refine, analyze and compose without touching the queue
    #[instrument(skip(self, urls), fields(urls = urls.len(), source = self.source.name()))]
    pub async fn compose_all(&self, urls: &[String]) -> ComposedBatch {
        info!("Starting workflow");

        let mut summary = WorkflowSummary {
            urls_requested: urls.len(),
            pages_processed: 0,
            fetch_failures: 0,
            duplicates_skipped: 0,
            drafts_queued: 0,
            drafts_rejected: 0,
            queue_size: 0,
            insights: Insights::default(),
            next_draft: None,
        };

        let records = self.fetch_all(urls, &mut summary).await;
        if records.is_empty() {
            error!("No content scraped");
            return ComposedBatch {
                drafts: Vec::new(),
                summary,
            };
        }

        let mut analyzed = Vec::with_capacity(records.len());
        for record in records {
            let record = match &self.refiner {
                Some(refiner) => refiner.refine(&record).await,
                None => record,
            };
            analyzed.push(AnalyzedContent::from_record(record));
        }
        summary.pages_processed = analyzed.len();
        summary.insights = Insights::from_analyses(&analyzed);

        let drafts = analyzed
            .iter()
            .map(|item| {
                let draft = self.composer.compose_with_analysis(item);
                debug!(
                    url = %draft.source_url,
                    chars = draft.char_count(),
                    composer = self.composer.name(),
                    "Composed draft"
                );
                draft
            })
            .collect();

        ComposedBatch { drafts, summary }
    }

    /// Validate a composed batch and append it with a single write
    ///
    /// Drafts the queue would reject are dropped and counted. A queue
    /// failure aborts; nothing from the batch is enqueued in that case.
    pub fn enqueue(&self, batch: ComposedBatch, queue: &mut DraftQueue) -> Result<WorkflowSummary> {
        let ComposedBatch { drafts, mut summary } = batch;

        let mut accepted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            match queue.limits().validate(&draft) {
                Ok(()) => accepted.push(draft),
                Err(e) => {
                    warn!(url = %draft.source_url, error = %e, "Dropping draft");
                    summary.drafts_rejected += 1;
                }
            }
        }

        summary.drafts_queued = queue
            .enqueue_batch(accepted)
            .context("Failed to enqueue drafts")?;
        summary.queue_size = queue.size();
        summary.next_draft = queue.peek().ok().cloned();

        info!(
            queued = summary.drafts_queued,
            rejected = summary.drafts_rejected,
            queue_size = summary.queue_size,
            "Workflow complete"
        );

        Ok(summary)
    }

    /// Fetch every URL in order, skipping failures and repeated content
    async fn fetch_all(&self, urls: &[String], summary: &mut WorkflowSummary) -> Vec<ContentRecord> {
        let mut records = Vec::new();
        let mut fingerprints = HashSet::new();

        for (idx, url) in urls.iter().enumerate() {
            if idx > 0 && !self.delay_between.is_zero() {
                tokio::time::sleep(self.delay_between).await;
            }

            let record = match self.source.fetch(url).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(%url, error = %e, "Skipping URL");
                    summary.fetch_failures += 1;
                    continue;
                }
            };

            if !record.body.is_empty() && !fingerprints.insert(record.fingerprint()) {
                info!(%url, "Skipping page with duplicate content");
                summary.duplicates_skipped += 1;
                continue;
            }

            records.push(record);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sector;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Serves canned bodies keyed by URL; unknown URLs fail
    struct StaticSource;

    #[async_trait]
    impl ContentSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, url: &str) -> Result<ContentRecord> {
            match url {
                "https://a.example/ev" => Ok(ContentRecord::new(
                    url,
                    "EV",
                    "Battery prices fell again this quarter.",
                    Some(Sector::EMobility),
                )),
                "https://b.example/ev-copy" => Ok(ContentRecord::new(
                    url,
                    "EV copy",
                    "Battery prices  fell again this quarter.",
                    Some(Sector::EMobility),
                )),
                _ => anyhow::bail!("404 for {}", url),
            }
        }
    }

    #[tokio::test]
    async fn test_run_skips_failures_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let mut queue = DraftQueue::open(temp.path().join("q.json")).unwrap();
        let orchestrator = Orchestrator::new(Box::new(StaticSource)).with_delay(Duration::ZERO);

        let urls = vec![
            "https://a.example/ev".to_string(),
            "https://missing.example".to_string(),
            "https://b.example/ev-copy".to_string(),
        ];
        let summary = orchestrator.run(&urls, &mut queue).await.unwrap();

        assert_eq!(summary.urls_requested, 3);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.duplicates_skipped, 1);
        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.drafts_queued, 1);
        assert_eq!(summary.queue_size, 1);
        assert_eq!(
            summary.next_draft.map(|d| d.source_url),
            Some("https://a.example/ev".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_with_nothing_fetched_leaves_queue_alone() {
        let temp = TempDir::new().unwrap();
        let mut queue = DraftQueue::open(temp.path().join("q.json")).unwrap();
        let orchestrator = Orchestrator::new(Box::new(StaticSource)).with_delay(Duration::ZERO);

        let summary = orchestrator
            .run(&["https://missing.example".to_string()], &mut queue)
            .await
            .unwrap();

        assert_eq!(summary.drafts_queued, 0);
        assert!(summary.next_draft.is_none());
        assert!(queue.is_empty());
        assert!(!temp.path().join("q.json").exists());
    }
}
