//! Sift CLI library.
//!
//! Configuration, logging, the pipeline orchestrator, the periodic worker and
//! the read-only dashboard behind the `sift` binary.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod worker;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use dashboard::DashboardView;
pub use error::{CliError, Result};
pub use orchestrator::{Phase, Pipeline, RunSummary};
pub use output::{Formatter, OutputFormat};
pub use worker::PipelineWorker;
