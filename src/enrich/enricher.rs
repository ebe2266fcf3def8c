//! Batch enrichment over a fixed-size worker pool.
//!
//! A batch is loaded from the [`RepoStore`], pre-loaded into a bounded job
//! channel and drained by `workers` tasks sharing its receiver. Each worker
//! looks the repository up, persists the result and reports an outcome to the
//! aggregator. Hitting the provider's rate limit cancels the batch: no further
//! jobs are claimed, in-flight ones finish and are counted. A lookup cut short
//! by that cancellation is neither persisted nor counted.

use std::sync::Arc;

use repostat_common::{EnrichmentStatus, RepoId};
use repostat_db::models::{ExtractedRepo, RepoEnrichmentUpdate};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::store::RepoStore;
use super::summary::BatchSummary;
use crate::metadata::{FetchError, RepoStatsProvider};
use crate::reporter::ProgressReporter;

const BATCH_TITLE: &str = "Enriching repositories";

/// Batch-level failure. Per-item problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("failed to load repositories for enrichment: {0}")]
    Store(#[source] repostat_common::Error),

    /// The provider's quota ran out; the batch stopped early.
    #[error("rate limit exceeded: {summary}")]
    RateLimitExceeded { summary: BatchSummary },

    /// The caller cancelled before every item was processed.
    #[error("enrichment cancelled: {summary}")]
    Cancelled { summary: BatchSummary },
}

impl EnrichError {
    /// Counts gathered before the batch stopped, if any work started.
    pub fn summary(&self) -> Option<&BatchSummary> {
        match self {
            Self::Store(_) => None,
            Self::RateLimitExceeded { summary } | Self::Cancelled { summary } => Some(summary),
        }
    }
}

/// Knobs for one call to [`Enricher::enrich_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum repositories to load.
    pub limit: usize,
    /// Re-enrich repositories that already succeeded.
    pub force: bool,
    /// Concurrent workers; `0` behaves like `1`.
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            force: false,
            workers: 5,
        }
    }
}

/// Per-item result handed from a worker to the aggregator.
#[derive(Debug)]
struct Outcome {
    repo_id: String,
    /// `None` when the lookup was abandoned; the item counts as skipped.
    status: Option<EnrichmentStatus>,
    error: Option<FetchError>,
}

impl Outcome {
    fn is_rate_limited(&self) -> bool {
        self.error.as_ref().is_some_and(FetchError::is_rate_limit)
    }
}

/// Fetches metadata for stored repositories and writes it back.
#[derive(Clone)]
pub struct Enricher {
    store: Arc<dyn RepoStore>,
    provider: Arc<dyn RepoStatsProvider>,
}

impl Enricher {
    pub fn new(store: Arc<dyn RepoStore>, provider: Arc<dyn RepoStatsProvider>) -> Self {
        Self { store, provider }
    }

    /// Enrich up to `options.limit` repositories.
    ///
    /// Returns the tally when every selected item was processed. Stops early
    /// with [`EnrichError::RateLimitExceeded`] when the provider reports an
    /// exhausted quota, or [`EnrichError::Cancelled`] when `cancel` fires.
    /// Both carry the counts gathered so far. An empty work set returns a
    /// zero summary without touching the provider or the reporter.
    pub async fn enrich_batch(
        &self,
        options: &BatchOptions,
        reporter: Arc<dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, EnrichError> {
        let repos = self
            .store
            .repos_for_enrichment(options.limit, options.force)
            .await
            .map_err(EnrichError::Store)?;

        if repos.is_empty() {
            debug!("No repositories pending enrichment");
            return Ok(BatchSummary::default());
        }

        let total = repos.len();
        let workers = options.workers.max(1);
        info!(total, workers, force = options.force, "Starting enrichment batch");
        reporter.start(total, BATCH_TITLE);

        let batch = cancel.child_token();

        // Both channels hold the whole batch, so no send ever waits.
        let (job_tx, job_rx) = mpsc::channel(total);
        for repo in repos {
            if job_tx.send(repo).await.is_err() {
                break;
            }
        }
        drop(job_tx);
        let jobs = Arc::new(Mutex::new(job_rx));

        let (outcome_tx, mut outcome_rx) = mpsc::channel(total);
        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                store: Arc::clone(&self.store),
                provider: Arc::clone(&self.provider),
                reporter: Arc::clone(&reporter),
                cancel: batch.clone(),
            };
            tasks.spawn(worker.run(Arc::clone(&jobs), outcome_tx.clone()));
        }
        drop(outcome_tx);

        let mut summary = BatchSummary::new(total);
        let mut rate_limited = false;
        while let Some(outcome) = outcome_rx.recv().await {
            if let Some(status) = outcome.status {
                summary.record(status);
            }
            if outcome.is_rate_limited() && !rate_limited {
                rate_limited = true;
                batch.cancel();
                warn!(repo_id = %outcome.repo_id, "Rate limit exceeded, stopping batch");
                if let Some(err) = &outcome.error {
                    reporter.error(err);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Enrichment worker failed");
            }
        }

        info!(%summary, "Enrichment batch finished");
        reporter.finish(&summary.to_string());

        if rate_limited {
            Err(EnrichError::RateLimitExceeded { summary })
        } else if cancel.is_cancelled() && summary.skipped() > 0 {
            Err(EnrichError::Cancelled { summary })
        } else {
            Ok(summary)
        }
    }
}

struct Worker {
    id: usize,
    store: Arc<dyn RepoStore>,
    provider: Arc<dyn RepoStatsProvider>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(
        self,
        jobs: Arc<Mutex<mpsc::Receiver<ExtractedRepo>>>,
        outcomes: mpsc::Sender<Outcome>,
    ) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let next = jobs.lock().await.recv().await;
            let Some(repo) = next else {
                break;
            };

            // Claimed while the batch was being cancelled.
            if self.cancel.is_cancelled() {
                break;
            }

            let outcome = self.process(repo).await;
            if outcome.status.is_some() {
                self.reporter.advance();
            }
            if outcomes.send(outcome).await.is_err() {
                break;
            }
        }
        debug!(worker = self.id, "Enrichment worker exiting");
    }

    async fn process(&self, repo: ExtractedRepo) -> Outcome {
        let repo_id = repo.repo_id;
        self.reporter.set_status(&format!("Enriching {repo_id}"));

        let id = match repo_id.parse::<RepoId>() {
            Ok(id) => id,
            Err(e) => {
                self.reporter.log(&format!("{repo_id}: {e}"));
                let update = RepoEnrichmentUpdate::status(&repo_id, EnrichmentStatus::ApiError);
                self.persist(update).await;
                return Outcome {
                    repo_id,
                    status: Some(EnrichmentStatus::ApiError),
                    error: None,
                };
            }
        };

        let lookup = self.provider.repo_stats(&id, &self.cancel).await;
        debug!(
            repo_id = %id,
            provider = self.provider.name(),
            rate_limit_remaining = lookup.rate_limit_remaining,
            "Lookup finished"
        );

        let (update, error) = match lookup.stats {
            Ok(stats) => (RepoEnrichmentUpdate::success(&repo_id, stats), None),
            Err(err) if err.is_rate_limit() => {
                // Stop sibling workers from claiming before the aggregator
                // sees this outcome. The item itself is left untouched so the
                // next batch retries it.
                self.cancel.cancel();
                self.reporter.log(&format!("{repo_id}: {err}"));
                return Outcome {
                    repo_id,
                    status: Some(EnrichmentStatus::ApiError),
                    error: Some(err),
                };
            }
            Err(err) if err.is_cancelled() => {
                debug!(repo_id = %repo_id, "Lookup abandoned, keeping stored status");
                self.reporter.log(&format!("{repo_id}: skipped: {err}"));
                return Outcome {
                    repo_id,
                    status: None,
                    error: Some(err),
                };
            }
            Err(err) if err.is_not_found() => (
                RepoEnrichmentUpdate::status(&repo_id, EnrichmentStatus::NotFound),
                Some(err),
            ),
            Err(err) => (
                RepoEnrichmentUpdate::status(&repo_id, EnrichmentStatus::ApiError),
                Some(err),
            ),
        };

        let mut status = update.status;
        let stars = update.stats.as_ref().map(|s| s.stars);
        if !self.persist(update).await {
            status = EnrichmentStatus::ApiError;
        }

        match (&error, stars) {
            (None, Some(stars)) if status == EnrichmentStatus::Success => {
                self.reporter
                    .log(&format!("{repo_id}: {status} ({stars} stars)"));
            }
            (Some(err), _) => self.reporter.log(&format!("{repo_id}: {status}: {err}")),
            _ => self.reporter.log(&format!("{repo_id}: {status}")),
        }

        Outcome {
            repo_id,
            status: Some(status),
            error,
        }
    }

    /// Write one update; `false` when the store rejected it.
    async fn persist(&self, update: RepoEnrichmentUpdate) -> bool {
        let repo_id = update.repo_id.clone();
        match self.store.update_repo_enrichment(update).await {
            Ok(()) => true,
            Err(e) => {
                warn!(repo_id = %repo_id, error = %e, "Failed to save enrichment result");
                self.reporter
                    .log(&format!("{repo_id}: save failed: {e}"));
                false
            }
        }
    }
}
