//! Scheduler use case - runs generate → publish cycles on a fixed interval

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    model::{CycleReport, PostReceipt, PostText},
    ports::{Clock, PublishError, Publisher, TextGenerator},
    usecases::generate::ContentGenerator,
};

/// Default time between cycles (5 minutes)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between cycle starts; the first cycle runs immediately
    pub interval: Duration,
    /// Generate and log only, never publish
    pub dry_run: bool,
    /// Upper bound on a single publish call
    pub publish_timeout: Duration,
    /// Stop after this many cycles (None = run until cancelled)
    pub max_cycles: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            dry_run: false,
            publish_timeout: Duration::from_secs(60),
            max_cycles: None,
        }
    }
}

/// Timer-driven orchestrator for posting cycles
pub struct Scheduler<G: ?Sized, P: ?Sized, Cl: ?Sized> {
    content: ContentGenerator<G, Cl>,
    publisher: Arc<P>,
    config: SchedulerConfig,
}

impl<G, P, Cl> Scheduler<G, P, Cl>
where
    G: TextGenerator + ?Sized,
    P: Publisher + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(content: ContentGenerator<G, Cl>, publisher: Arc<P>, config: SchedulerConfig) -> Self {
        Self {
            content,
            publisher,
            config,
        }
    }

    /// Run cycles until `shutdown` is cancelled or `max_cycles` is reached.
    ///
    /// Cycles run one at a time; a tick that comes due while a cycle is still
    /// running is skipped rather than queued. Returns the number of completed
    /// cycles.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            dry_run = self.config.dry_run,
            max_cycles = ?self.config.max_cycles,
            platform = self.publisher.platform(),
            "Scheduler started"
        );

        let mut completed = 0;

        loop {
            if self.config.max_cycles.is_some_and(|max| completed >= max) {
                tracing::info!(completed, "Reached cycle limit");
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let cycle = completed + 1;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::warn!(cycle, "Cycle cancelled before completion");
                    break;
                }
                report = self.run_cycle(cycle) => {
                    completed = report.cycle;
                }
            }
        }

        tracing::info!(completed, "Scheduler stopped");
        completed
    }

    /// Run a single generate → publish cycle
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", cycle, run_id = %run_id);

        async move {
            let generated = self.content.generate().await;

            let receipt = if self.config.dry_run {
                tracing::info!(text = %generated.text, "[DRY RUN] Would publish");
                None
            } else {
                self.publish(&generated.text).await
            };

            CycleReport {
                cycle,
                run_id,
                text: generated.text,
                origin: generated.origin,
                receipt,
                dry_run: self.config.dry_run,
            }
        }
        .instrument(span)
        .await
    }

    async fn publish(&self, text: &PostText) -> Option<PostReceipt> {
        let platform = self.publisher.platform();
        let result = tokio::time::timeout(self.config.publish_timeout, self.publisher.publish(text))
            .await
            .unwrap_or(Err(PublishError::Timeout));

        match result {
            Ok(receipt) => {
                tracing::info!(platform, uri = %receipt.uri, "Posted successfully");
                Some(receipt)
            }
            Err(e) => {
                tracing::error!(platform, error = %e, "Failed to publish");
                None
            }
        }
    }
}
