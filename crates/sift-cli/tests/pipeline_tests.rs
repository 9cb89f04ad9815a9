//! End-to-end pipeline runs against scripted collaborators

use sift_cli::{AppConfig, CliError, Phase, Pipeline, PipelineWorker};
use sift_collector::CollectorError;
use sift_domain::{Comment, CommentNode, CompletionRequest, LlmProvider, RawThread, Thread};
use sift_forum::{ForumError, MockForum};
use sift_llm::{LlmError, MockProvider};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config(dir: &TempDir, chunk_size: usize) -> AppConfig {
    let toml = format!(
        r#"
        [forum]
        subreddit = "oscp"
        search_query = "exam"
        batch_size = 10
        max_pagination = 3
        post_min_length = 10
        comment_min_length = 5

        [keywords]
        exam = ["passed", "proctor"]

        [llm]
        model = "test-model"
        chunk_size = {chunk_size}

        [database]
        file = "{db}"

        [output]
        report_file = "{report}"

        [runtime]
        workers = 2
        retry_attempts = 2
        retry_base_delay_ms = 1
        "#,
        chunk_size = chunk_size,
        db = dir.path().join("data").join("posts.db").display(),
        report = dir.path().join("reports").join("analysis.txt").display(),
    );
    AppConfig::from_toml(&toml).unwrap()
}

fn raw(id: &str) -> RawThread {
    RawThread::new(
        Thread {
            id: id.to_string(),
            title: format!("Exam thread {}", id),
            body: "I passed on my second attempt, here is how".to_string(),
            url: format!("https://forum/{}", id),
            created_at: 1_700_000_000.0,
            score: 3,
            comment_count: 2,
        },
        format!("t3_{}", id),
    )
}

fn comment(id: &str, thread_id: &str) -> CommentNode {
    CommentNode::leaf(Comment {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        body: format!("Congratulations, comment {}", id),
        created_at: 1_700_000_100.0,
        score: 1,
    })
}

/// Three relevant threads carrying five comments in total
fn forum() -> MockForum {
    let forum = MockForum::new();
    forum.add_page(vec![raw("a"), raw("b"), raw("c")]);
    forum.set_forest("a", vec![comment("a1", "a"), comment("a2", "a")]);
    forum.set_forest("b", vec![comment("b1", "b")]);
    forum.set_forest("c", vec![comment("c1", "c"), comment("c2", "c")]);
    forum
}

/// Provider that blocks for a while on every call
struct SlowProvider {
    delay: Duration,
}

impl LlmProvider for SlowProvider {
    type Error = LlmError;

    fn generate(&self, _request: &CompletionRequest) -> Result<String, Self::Error> {
        std::thread::sleep(self.delay);
        Ok("late".to_string())
    }
}

#[tokio::test]
async fn test_end_to_end_run() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 10);
    let llm = MockProvider::new("SUMMARY");
    let pipeline = Pipeline::new(config.clone(), Arc::new(forum()), Arc::new(llm.clone())).unwrap();

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.phase, Phase::Done);
    assert_eq!(summary.threads_collected, 3);
    assert_eq!(summary.threads_inserted, 3);
    assert_eq!(summary.comments_analyzed, 5);
    assert_eq!(summary.comments_inserted, 5);
    assert_eq!(llm.call_count(), 1, "Five rows fit one chunk of ten");

    let report = std::fs::read_to_string(&config.output.report_file).unwrap();
    assert_eq!(report, "SUMMARY");
    assert_eq!(summary.report_chars, 7);

    let overview = pipeline.store().overview().unwrap();
    assert_eq!(overview.thread_count, 3);
    assert_eq!(overview.comment_count, 5);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        config(&dir, 10),
        Arc::new(forum()),
        Arc::new(MockProvider::new("SUMMARY")),
    )
    .unwrap();

    pipeline.run().await.unwrap();
    let second = pipeline.run().await.unwrap();

    assert_eq!(second.threads_collected, 3);
    assert_eq!(second.threads_inserted, 0);
    assert_eq!(second.comments_inserted, 0);
    assert_eq!(pipeline.store().overview().unwrap().comment_count, 5);
}

#[tokio::test]
async fn test_comment_failure_for_one_thread_does_not_abort() {
    let dir = TempDir::new().unwrap();
    let forum = forum();
    forum.fail_thread("b");
    let pipeline = Pipeline::new(
        config(&dir, 10),
        Arc::new(forum),
        Arc::new(MockProvider::new("ok")),
    )
    .unwrap();

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.threads_inserted, 3);
    assert_eq!(summary.comments_analyzed, 4);
    assert_eq!(summary.comments_inserted, 4);
}

#[tokio::test]
async fn test_chunking_drives_call_count() {
    let dir = TempDir::new().unwrap();
    let llm = MockProvider::new("part");
    let pipeline =
        Pipeline::new(config(&dir, 2), Arc::new(forum()), Arc::new(llm.clone())).unwrap();

    let summary = pipeline.run().await.unwrap();

    // 5 rows in chunks of 2
    assert_eq!(llm.call_count(), 3);
    let report = std::fs::read_to_string(&summary.report_path).unwrap();
    assert_eq!(report, "part\npart\npart");
}

#[tokio::test]
async fn test_all_chunks_failing_writes_empty_report() {
    let dir = TempDir::new().unwrap();
    let mut llm = MockProvider::new("never");
    llm.fail_on_call(1);
    let pipeline = Pipeline::new(config(&dir, 10), Arc::new(forum()), Arc::new(llm)).unwrap();

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.report_chars, 0);
    assert_eq!(std::fs::read_to_string(&summary.report_path).unwrap(), "");
}

#[tokio::test]
async fn test_collect_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let forum = forum();
    forum.fail_next_searches(2, ForumError::RateLimited { retry_after_secs: None });
    let config = config(&dir, 10);
    let llm = MockProvider::new("SUMMARY");
    let pipeline = Pipeline::new(config.clone(), Arc::new(forum), Arc::new(llm.clone())).unwrap();

    let err = pipeline.run().await.unwrap_err();
    match err {
        CliError::Aborted { phase, source } => {
            assert_eq!(phase, Phase::Collect);
            assert!(matches!(
                *source,
                CliError::Collector(CollectorError::RetriesExhausted { attempts: 2, .. })
            ));
        }
        other => panic!("Expected aborted run, got {:?}", other),
    }

    assert_eq!(llm.call_count(), 0);
    assert!(!config.output.report_file.exists(), "No report without a completed run");
    assert_eq!(pipeline.store().overview().unwrap().thread_count, 0);
}

#[tokio::test]
async fn test_worker_runs_cycles() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        config(&dir, 10),
        Arc::new(forum()),
        Arc::new(MockProvider::new("SUMMARY")),
    )
    .unwrap();
    let worker = PipelineWorker::new(pipeline, Duration::from_millis(10));

    let summaries = worker.run_cycles(2).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_ne!(summaries[0].run_id, summaries[1].run_id);
    assert_eq!(summaries[1].threads_inserted, 0);
}

#[tokio::test]
async fn test_comment_fan_out_counts_every_comment() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, 10);
    config.runtime.workers = 4;

    let forum = MockForum::new();
    let ids = ["a", "b", "c", "d", "e"];
    forum.add_page(ids.iter().map(|&id| raw(id)).collect());
    for (&id, count) in ids.iter().zip([3, 2, 4, 1, 2]) {
        let forest = (0..count).map(|i| comment(&format!("{}{}", id, i), id)).collect();
        forum.set_forest(id, forest);
    }

    let pipeline =
        Pipeline::new(config, Arc::new(forum), Arc::new(MockProvider::new("SUMMARY"))).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.threads_collected, 5);
    assert_eq!(summary.comments_analyzed, 12);
    assert_eq!(summary.comments_inserted, 12);
    assert_eq!(pipeline.store().overview().unwrap().comment_count, 12);
}

#[tokio::test]
async fn test_worker_stops_when_shutdown_arrives_mid_run() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 10);
    let report_file = config.output.report_file.clone();
    let llm = SlowProvider {
        delay: Duration::from_secs(2),
    };
    let pipeline = Pipeline::new(config, Arc::new(forum()), Arc::new(llm)).unwrap();
    let worker = PipelineWorker::new(pipeline, Duration::from_secs(3600));

    let shutdown = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<(), std::io::Error>(())
    };
    let stopped = tokio::time::timeout(Duration::from_secs(8), worker.run_until(shutdown)).await;

    assert!(stopped.is_ok(), "Worker kept waiting after shutdown");
    stopped.unwrap().unwrap();
    assert!(!report_file.exists(), "Interrupted run must not write a report");
}

#[tokio::test]
async fn test_worker_shutdown_while_idle() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        config(&dir, 10),
        Arc::new(forum()),
        Arc::new(MockProvider::new("SUMMARY")),
    )
    .unwrap();
    let worker = PipelineWorker::new(pipeline, Duration::from_secs(3600));

    // First run completes immediately, then the worker waits on the hourly tick
    let shutdown = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok::<(), std::io::Error>(())
    };
    let stopped = tokio::time::timeout(Duration::from_secs(8), worker.run_until(shutdown)).await;

    assert!(stopped.is_ok(), "Worker kept waiting for the next tick");
    stopped.unwrap().unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("reports").join("analysis.txt")).unwrap(),
        "SUMMARY"
    );
}
