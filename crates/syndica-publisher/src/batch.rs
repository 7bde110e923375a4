use std::sync::Arc;
use std::time::Duration;

use syndica_core::{ArticleStatus, BatchSummary, PublishOutcome, Timestamp};
use syndica_db::{Database, DbResult};
use time::UtcOffset;
use tracing::{info, warn};

use crate::gate::{DEFAULT_RUN_JOB, GateDecision, RunGate, RunWindow};
use crate::gateway::{PostGateway, PublishError};

const LOG_TARGET: &str = "syndica::batch";

/// Successful submissions permitted per batch.
pub const DEFAULT_BATCH_CAP: usize = 4;

/// Pause before each submission, so a batch never bursts the external API.
pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PipelineOpts {
    pub job: String,
    pub window: RunWindow,
    pub utc_offset: UtcOffset,
    pub batch_cap: usize,
    pub publish_delay: Duration,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            job: DEFAULT_RUN_JOB.to_string(),
            window: RunWindow::default(),
            utc_offset: UtcOffset::UTC,
            batch_cap: DEFAULT_BATCH_CAP,
            publish_delay: DEFAULT_PUBLISH_DELAY,
        }
    }
}

/// The publication batch: gate check, candidate selection, throttled
/// sequential submission, per-article state updates.
pub struct Pipeline {
    db: Arc<Database>,
    gateway: Arc<dyn PostGateway>,
    gate: RunGate,
    opts: PipelineOpts,
}

impl Pipeline {
    pub fn new(db: Arc<Database>, gateway: Arc<dyn PostGateway>, opts: PipelineOpts) -> Self {
        let gate = RunGate::new(
            db.clone(),
            opts.job.clone(),
            opts.window,
            opts.utc_offset,
        );

        Self {
            db,
            gateway,
            gate,
            opts,
        }
    }

    pub async fn run_batch(&self) -> DbResult<BatchSummary> {
        self.run_batch_at(Timestamp::now()).await
    }

    /// Run one batch as of `now`.
    ///
    /// Candidates are processed strictly sequentially, in insertion order,
    /// with [`PipelineOpts::publish_delay`] before each submission. A single
    /// failed submission marks that article `failed` and deletes the run
    /// metadata (so the next invocation's gate sees no history), but does not
    /// abort the batch; only the cap or a storage error stops it early.
    pub async fn run_batch_at(&self, now: Timestamp) -> DbResult<BatchSummary> {
        match self.gate.check_and_mark(now).await? {
            GateDecision::OutsideWindow => {
                info!(target: LOG_TARGET, "Outside the publish window, skipping");
                return Ok(BatchSummary::noop("Outside the publish window, skipping."));
            }
            GateDecision::AlreadyRan { hour } => {
                info!(target: LOG_TARGET, hour, "Already ran this window, skipping");
                return Ok(BatchSummary::noop(format!(
                    "Already ran today at {hour}:00, skipping."
                )));
            }
            GateDecision::Run => {}
        }

        let candidates = self.db.get_candidate_articles().await?;
        if candidates.is_empty() {
            return Ok(BatchSummary::noop("No new articles to publish."));
        }

        info!(
            target: LOG_TARGET,
            count = candidates.len(),
            "Publishing candidate articles"
        );

        let mut saved = 0;
        let mut outcomes = Vec::new();

        for (id, article) in candidates {
            tokio::time::sleep(self.opts.publish_delay).await;

            if self.opts.batch_cap <= saved {
                warn!(
                    target: LOG_TARGET,
                    %id,
                    cap = self.opts.batch_cap,
                    "Batch cap reached, deferring remaining articles"
                );
                self.db
                    .mark_article_status(id, ArticleStatus::Failed, now)
                    .await?;
                break;
            }

            match self.gateway.submit(&article).await {
                Ok(draft) => {
                    self.db
                        .mark_article_status(id, ArticleStatus::Posted, now)
                        .await?;
                    saved += 1;
                    info!(target: LOG_TARGET, %id, post_id = %draft.id, "Published article");
                    outcomes.push(PublishOutcome::posted(draft.url, Some(draft.id)));
                }
                // Token-store trouble is a storage failure, not a publish
                // failure; abort the invocation
                Err(PublishError::TokenStore { source }) => return Err(source),
                Err(err) => {
                    warn!(target: LOG_TARGET, %id, error = %err, "Failed to publish article");
                    self.db.delete_run_timestamp(&self.opts.job).await?;
                    self.db
                        .mark_article_status(id, ArticleStatus::Failed, now)
                        .await?;
                    outcomes.push(err.to_outcome());
                }
            }
        }

        Ok(BatchSummary {
            saved,
            message: format!("{saved} articles published to Blogger."),
            articles: outcomes,
        })
    }
}
