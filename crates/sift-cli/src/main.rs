//! Sift CLI - collect forum threads, store them, and summarize them.

use anyhow::{bail, Context};
use clap::Parser;
use sift_cli::{
    logging, AppConfig, Cli, CliError, Command, DashboardView, Formatter, Pipeline, PipelineWorker,
};
use sift_forum::RedditClient;
use sift_llm::OpenAiProvider;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    // Secrets may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        eprintln!("{}", formatter.error(&format!("Error: {:#}", e)));
        std::process::exit(1);
    }
}

fn run(cli: Cli, formatter: &Formatter) -> anyhow::Result<()> {
    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Command::CheckConfig => {
            println!("{}", formatter.format_config(&config)?);
        }
        Command::Dashboard(args) => {
            let view = DashboardView::load(
                &config.database.file,
                &config.output.report_file,
                args.limit,
            )?;
            println!("{}", formatter.format_dashboard(&view)?);
        }
        Command::Run => {
            logging::init(config.output.log_file.as_deref())?;
            let pipeline = build_pipeline(config)?;
            let runtime = build_runtime()?;
            let summary = runtime.block_on(pipeline.run())?;
            println!("{}", formatter.format_run_summary(&summary)?);
        }
        Command::Watch(args) => {
            logging::init(config.output.log_file.as_deref())?;
            let interval = match args.interval_minutes {
                Some(0) => bail!("--interval-minutes must be greater than 0"),
                Some(minutes) => Duration::from_secs(minutes * 60),
                None => config.interval(),
            };
            let subreddit = config.forum.subreddit.clone();
            let worker = PipelineWorker::new(build_pipeline(config)?, interval);
            let runtime = build_runtime()?;

            println!(
                "{}",
                formatter.info(&format!(
                    "Watching r/{} every {} minutes, press Ctrl+C to stop",
                    subreddit,
                    interval.as_secs() / 60
                ))
            );
            runtime.block_on(worker.run())?;
            println!("{}", formatter.success("Worker stopped"));
        }
    }

    Ok(())
}

/// Production collaborators: Reddit and an OpenAI-compatible endpoint
///
/// Built outside the async runtime since both hold blocking HTTP clients.
fn build_pipeline(config: AppConfig) -> anyhow::Result<Pipeline<RedditClient, OpenAiProvider>> {
    let forum = RedditClient::from_env().map_err(CliError::from)?;
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| CliError::MissingEnv("OPENAI_API_KEY".to_string()))?;
    let llm = OpenAiProvider::new(api_key)
        .with_base_url(config.llm.base_url.clone())
        .with_max_retries(config.llm.max_retries)
        .with_base_delay(config.retry_policy().base_delay);

    Ok(Pipeline::new(config, Arc::new(forum), Arc::new(llm))?)
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}
