//! One end-to-end pipeline run
//!
//! Phases run strictly in order:
//!
//! | Phase | Work |
//! |-------|------|
//! | Collect | Paginated search, relevance filter |
//! | PersistThreads | Insert-or-ignore collected threads |
//! | ExtractAndPersistComments | Bounded fan-out, one task per thread |
//! | Summarize | Read all rows, chunked completion, write report |
//!
//! A fatal error aborts the run with [`CliError::Aborted`] naming the phase
//! it occurred in. Nothing written by earlier phases is rolled back.

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use serde::Serialize;
use sift_collector::{Collector, CommentExtractor, RunMetrics};
use sift_domain::{ForumSource, LlmProvider, RunId};
use sift_store::SqliteStore;
use sift_summarizer::{write_report, Summarizer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, Instrument};

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Run created, nothing done yet
    Init,
    /// Fetching and filtering search pages
    Collect,
    /// Writing threads
    PersistThreads,
    /// Extracting and writing comments
    ExtractAndPersistComments,
    /// Producing the report
    Summarize,
    /// Finished successfully
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Collect => "collect",
            Phase::PersistThreads => "persist threads",
            Phase::ExtractAndPersistComments => "extract and persist comments",
            Phase::Summarize => "summarize",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: String,
    /// Relevant threads collected
    pub threads_collected: usize,
    /// Threads newly stored
    pub threads_inserted: usize,
    /// Comments kept by the extractor
    pub comments_analyzed: usize,
    /// Comments newly stored
    pub comments_inserted: usize,
    /// Report length in characters
    pub report_chars: usize,
    /// Where the report was written
    pub report_path: PathBuf,
    /// Final phase
    pub phase: Phase,
}

/// Wires the collaborators together for one or more runs
pub struct Pipeline<F, P> {
    config: AppConfig,
    forum: Arc<F>,
    llm: Arc<P>,
    store: SqliteStore,
}

impl<F, P> Pipeline<F, P>
where
    F: ForumSource + Send + Sync + 'static,
    P: LlmProvider + Send + Sync + 'static,
{
    /// Open (or create) the store and build the pipeline
    pub fn new(config: AppConfig, forum: Arc<F>, llm: Arc<P>) -> Result<Self> {
        let store =
            SqliteStore::new(&config.database.file)?.with_busy_timeout(config.busy_timeout());
        info!("Using database {}", store.path().display());
        Ok(Self {
            config,
            forum,
            llm,
            store,
        })
    }

    /// Underlying store
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Execute one run
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = RunId::new();
        let span = tracing::info_span!("run", run_id = %run_id);

        async move {
            info!("Run started");
            let mut phase = Phase::Init;
            match self.execute(&run_id, &mut phase).await {
                Ok(summary) => {
                    info!(
                        "Run finished: {} threads collected, {} comments analyzed, report {} chars",
                        summary.threads_collected,
                        summary.comments_analyzed,
                        summary.report_chars
                    );
                    Ok(summary)
                }
                Err(e) => {
                    error!("Run aborted during {}: {}", phase, e);
                    Err(CliError::Aborted {
                        phase,
                        source: Box::new(e),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run_id: &RunId, phase: &mut Phase) -> Result<RunSummary> {
        let metrics = Arc::new(RunMetrics::new());

        *phase = Phase::Collect;
        let collector = Collector::new(
            Arc::clone(&self.forum),
            self.config.keyword_sets(),
            self.config.forum.post_min_length,
            Arc::clone(&metrics),
        )
        .with_retry_policy(self.config.retry_policy());
        let query = self.config.search_query();
        let threads = tokio::task::spawn_blocking(move || collector.collect(&query)).await??;

        *phase = Phase::PersistThreads;
        let store = self.store.clone();
        let batch = threads.clone();
        let threads_inserted =
            tokio::task::spawn_blocking(move || store.upsert_threads(&batch)).await??;
        info!("Stored {} new of {} collected threads", threads_inserted, threads.len());

        *phase = Phase::ExtractAndPersistComments;
        let comments_inserted = self.extract_comments(threads.clone(), Arc::clone(&metrics)).await?;
        info!("{}", metrics.summary());

        *phase = Phase::Summarize;
        let store = self.store.clone();
        let rows = tokio::task::spawn_blocking(move || store.query_all_text()).await??;
        let summarizer = Summarizer::new(Arc::clone(&self.llm), self.config.summarizer_config())?;
        let summary =
            tokio::task::spawn_blocking(move || summarizer.summarize_detailed(&rows)).await?;
        if summary.failed_chunks > 0 {
            error!(
                "{} of {} report chunks failed and were left out",
                summary.failed_chunks, summary.chunks
            );
        }

        let report_path = self.config.output.report_file.clone();
        write_report(&report_path, &summary.text)?;

        *phase = Phase::Done;
        let counts = metrics.snapshot();
        Ok(RunSummary {
            run_id: run_id.to_string(),
            threads_collected: counts.threads_processed,
            threads_inserted,
            comments_analyzed: counts.comments_analyzed,
            comments_inserted,
            report_chars: summary.text.chars().count(),
            report_path,
            phase: *phase,
        })
    }

    /// Extract and store comments for every thread with bounded concurrency
    ///
    /// A thread whose comments cannot be saved is logged and skipped; a task
    /// that panics aborts the remaining ones and fails the phase.
    async fn extract_comments(
        &self,
        threads: Vec<sift_domain::Thread>,
        metrics: Arc<RunMetrics>,
    ) -> Result<usize> {
        let extractor = Arc::new(CommentExtractor::new(
            Arc::clone(&self.forum),
            self.config.forum.expand_limit,
            self.config.forum.comment_min_length,
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.runtime.workers.max(1)));
        let mut tasks = JoinSet::new();

        for thread in threads {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            let extractor = Arc::clone(&extractor);
            let metrics = Arc::clone(&metrics);
            let store = self.store.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let comments = extractor.extract(&thread);
                metrics.add_comments(comments.len());
                if comments.is_empty() {
                    return 0;
                }
                match store.upsert_comments(&comments, &thread.id) {
                    Ok(inserted) => inserted,
                    Err(e) => {
                        error!(thread_id = %thread.id, "Failed to save comments: {}", e);
                        0
                    }
                }
            });
        }

        let mut inserted = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(count) => inserted += count,
                Err(e) => {
                    tasks.abort_all();
                    return Err(e.into());
                }
            }
        }
        Ok(inserted)
    }
}
