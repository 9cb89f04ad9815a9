//! Periodic pipeline runs

use crate::error::Result;
use crate::orchestrator::{Pipeline, RunSummary};
use sift_domain::{ForumSource, LlmProvider};
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs the pipeline on a fixed schedule
///
/// The first run starts immediately.
pub struct PipelineWorker<F, P> {
    pipeline: Pipeline<F, P>,
    interval: Duration,
}

impl<F, P> PipelineWorker<F, P>
where
    F: ForumSource + Send + Sync + 'static,
    P: LlmProvider + Send + Sync + 'static,
{
    /// Create a worker
    pub fn new(pipeline: Pipeline<F, P>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Run until Ctrl+C
    ///
    /// A failed run is logged and the schedule continues.
    pub async fn run(&self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Run until `shutdown` resolves
    ///
    /// `shutdown` is watched while waiting for the next tick and while a run
    /// is in progress. A run interrupted by shutdown is abandoned where it
    /// stands; work already persisted stays persisted.
    pub async fn run_until<S>(&self, shutdown: S) -> Result<()>
    where
        S: Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(shutdown);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (mut succeeded, mut failed) = (0usize, 0usize);

        tracing::info!("Pipeline worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                signal = &mut shutdown => {
                    signal?;
                    tracing::info!("Shutdown signal received, stopping worker");
                    break;
                }
            }

            tokio::select! {
                outcome = self.pipeline.run() => match outcome {
                    Ok(summary) => {
                        succeeded += 1;
                        tracing::info!("Run {} completed", summary.run_id);
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::error!("Run failed: {}", e);
                    }
                },
                signal = &mut shutdown => {
                    signal?;
                    tracing::warn!("Shutdown signal received during a run, abandoning it");
                    break;
                }
            }
        }

        tracing::info!(
            "Pipeline worker stopped: {} runs succeeded, {} failed",
            succeeded,
            failed
        );
        Ok(())
    }

    /// Run exactly `cycles` times, stopping at the first failure
    pub async fn run_cycles(&self, cycles: usize) -> Result<Vec<RunSummary>> {
        let mut ticker = interval(self.interval);
        let mut summaries = Vec::with_capacity(cycles);

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting run {}/{}", cycle + 1, cycles);
            summaries.push(self.pipeline.run().await?);
        }

        Ok(summaries)
    }
}
