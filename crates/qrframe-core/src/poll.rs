//! Poll loop: list the watched folder, run each photo, sleep, repeat.
//!
//! Photos are isolated from each other: one photo's failure is logged and
//! counted, and the rest of the listing is still processed in the same cycle.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, PollConfig};
use crate::error::PipelineResult;
use crate::pipeline::PipelineDriver;
use crate::store::RemoteStore;
use crate::types::{CycleReport, PhotoOutcome};

/// Repeatedly feeds new photos from the watched folder to the pipeline.
pub struct Poller {
    store: Arc<dyn RemoteStore>,
    driver: PipelineDriver,
    watch_folder_id: String,
    poll: PollConfig,
    consecutive_failures: u32,
}

impl Poller {
    pub fn new(config: &Config, store: Arc<dyn RemoteStore>) -> PipelineResult<Self> {
        let driver = PipelineDriver::new(config, store.clone())?;
        Ok(Self {
            store,
            driver,
            watch_folder_id: config.store.watch_folder_id.clone(),
            poll: config.poll.clone(),
            consecutive_failures: 0,
        })
    }

    pub fn driver(&self) -> &PipelineDriver {
        &self.driver
    }

    /// Run one listing and process every file in it.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let files = match self.store.list(&self.watch_folder_id).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(
                    "Listing folder {} on {} failed: {e}",
                    self.watch_folder_id,
                    self.store.name()
                );
                report.listing_error = Some(e.to_string());
                return report;
            }
        };
        report.listed = files.len();
        tracing::debug!("Listed {} file(s) in {}", files.len(), self.watch_folder_id);

        for file in &files {
            match self.driver.process(file).await {
                Ok(PhotoOutcome::Skipped) => report.skipped += 1,
                Ok(PhotoOutcome::Completed { .. }) => report.completed += 1,
                Err(e) => {
                    report.failed += 1;
                    if e.is_transient() {
                        report.transient_failures += 1;
                    }
                    tracing::error!(
                        kind = e.kind(),
                        transient = e.is_transient(),
                        "Failed to process {}: {e}",
                        file.name
                    );
                }
            }
        }

        if report.completed > 0 || report.failed > 0 {
            tracing::info!(
                "Cycle done: {} listed, {} published, {} skipped, {} failed",
                report.listed,
                report.completed,
                report.skipped,
                report.failed
            );
        }
        report
    }

    /// How long to sleep after `report`, updating the failure streak.
    ///
    /// Any failure switches to the error interval. When `max_backoff_secs` is
    /// set, consecutive cycles with listing failures or transient photo
    /// failures double it up to that cap.
    pub fn next_delay(&mut self, report: &CycleReport) -> Duration {
        if !report.has_failures() {
            self.consecutive_failures = 0;
            return Duration::from_secs(self.poll.success_interval_secs);
        }

        if report.backend_unhealthy() {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }
        let base = backoff_duration(
            self.consecutive_failures.saturating_sub(1),
            self.poll.error_interval_secs.saturating_mul(1000),
            self.poll
                .max_backoff_secs
                .unwrap_or(self.poll.error_interval_secs)
                .saturating_mul(1000),
        );
        let jitter = if self.poll.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.poll.jitter_ms)
        } else {
            0
        };
        base.saturating_add(Duration::from_millis(jitter))
    }

    /// Poll until `shutdown` resolves or `poll.max_cycles` cycles have run.
    ///
    /// Returns the number of cycles run.
    pub async fn run<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0u64;

        loop {
            let report = self.run_cycle().await;
            cycles += 1;

            if self.poll.max_cycles.is_some_and(|max| cycles >= max) {
                tracing::info!("Reached {cycles} cycle(s), stopping");
                break;
            }

            let delay = self.next_delay(&report);
            if report.has_failures() {
                tracing::warn!(
                    "Cycle had failures, retrying in {delay:?} (backend failure streak: {})",
                    self.consecutive_failures
                );
            } else {
                tracing::debug!("Sleeping {delay:?}");
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping after {cycles} cycle(s)");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        cycles
    }
}

/// Exponential backoff: `base_ms * 2^attempt`, capped at `max_ms`.
pub fn backoff_duration(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let delay = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(max_ms))
}
