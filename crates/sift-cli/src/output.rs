//! Output formatting for the CLI.

use crate::config::AppConfig;
use crate::dashboard::{format_timestamp, DashboardView};
use crate::error::Result;
use crate::orchestrator::RunSummary;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Longest title shown in the recent threads table
const TITLE_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of a run.
    pub fn format_run_summary(&self, summary: &RunSummary) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(summary)?);
        }

        let rows = [
            ("Run", summary.run_id.clone()),
            ("Threads collected", summary.threads_collected.to_string()),
            ("Threads inserted", summary.threads_inserted.to_string()),
            ("Comments analyzed", summary.comments_analyzed.to_string()),
            ("Comments inserted", summary.comments_inserted.to_string()),
            (
                "Report",
                format!("{} ({} chars)", summary.report_path.display(), summary.report_chars),
            ),
        ];

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (field, value) in rows {
            builder.push_record([field.to_string(), value]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        Ok(format!("{}\n{}", self.success("Run completed"), table))
    }

    /// Format the dashboard.
    pub fn format_dashboard(&self, view: &DashboardView) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_dashboard_json(view),
            OutputFormat::Table => Ok(self.format_dashboard_table(view)),
        }
    }

    fn format_dashboard_json(&self, view: &DashboardView) -> Result<String> {
        let recent: Vec<serde_json::Value> = view
            .recent
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "score": t.score,
                    "num_comments": t.comment_count,
                    "created_utc": t.created_at,
                    "url": t.url,
                })
            })
            .collect();

        let value = serde_json::json!({
            "overview": {
                "threads": view.overview.thread_count,
                "comments": view.overview.comment_count,
                "average_score": view.overview.average_score,
            },
            "recent_threads": recent,
            "report_path": view.report_path.display().to_string(),
            "report": view.report,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_dashboard_table(&self, view: &DashboardView) -> String {
        let mut sections = vec![self.heading("Overview")];

        if view.is_empty() {
            sections.push(self.warning("No data available. Run `sift run` first."));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Threads", "Comments", "Avg. score"]);
            builder.push_record([
                view.overview.thread_count.to_string(),
                view.overview.comment_count.to_string(),
                format!("{:.2}", view.overview.average_score),
            ]);
            let mut table = builder.build();
            table.with(Style::rounded());
            sections.push(table.to_string());

            sections.push(self.heading("Recent threads"));
            let mut builder = Builder::default();
            builder.push_record(["Title", "Score", "Comments", "Created (UTC)"]);
            for thread in &view.recent {
                builder.push_record([
                    truncate(&thread.title, TITLE_WIDTH),
                    thread.score.to_string(),
                    thread.comment_count.to_string(),
                    format_timestamp(thread.created_at),
                ]);
            }
            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            sections.push(table.to_string());
        }

        sections.push(self.heading("Latest report"));
        match &view.report {
            Some(text) if !text.trim().is_empty() => sections.push(text.trim_end().to_string()),
            Some(_) => sections.push(self.warning("The latest report is empty.")),
            None => sections.push(self.warning(&format!(
                "No report found at {}",
                view.report_path.display()
            ))),
        }

        sections.join("\n\n")
    }

    /// Format the effective configuration.
    pub fn format_config(&self, config: &AppConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            OutputFormat::Table => {
                let rendered = config.to_toml()?;
                Ok(format!("{}\n\n{}", self.success("Configuration is valid"), rendered))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn heading(&self, title: &str) -> String {
        if self.color_enabled {
            title.bold().cyan().to_string()
        } else {
            title.to_string()
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Phase;
    use sift_domain::Thread;
    use sift_store::StoreOverview;
    use std::path::PathBuf;

    fn summary() -> RunSummary {
        RunSummary {
            run_id: "0190a5b2-0000-7000-8000-000000000000".to_string(),
            threads_collected: 3,
            threads_inserted: 2,
            comments_analyzed: 5,
            comments_inserted: 5,
            report_chars: 7,
            report_path: PathBuf::from("reports/analysis.txt"),
            phase: Phase::Done,
        }
    }

    fn view(threads: usize, report: Option<&str>) -> DashboardView {
        DashboardView {
            overview: StoreOverview {
                thread_count: threads,
                comment_count: 4,
                average_score: 12.5,
            },
            recent: (0..threads)
                .map(|i| Thread {
                    id: format!("t{}", i),
                    title: format!("Thread number {}", i),
                    body: String::new(),
                    url: String::new(),
                    created_at: 0.0,
                    score: 10,
                    comment_count: 2,
                })
                .collect(),
            report_path: PathBuf::from("reports/analysis.txt"),
            report: report.map(String::from),
        }
    }

    #[test]
    fn test_run_summary_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_run_summary(&summary()).unwrap();
        assert!(output.starts_with("✓ Run completed"));
        assert!(output.contains("Threads collected"));
        assert!(output.contains("reports/analysis.txt (7 chars)"));
    }

    #[test]
    fn test_run_summary_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_run_summary(&summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["comments_analyzed"], 5);
        assert_eq!(value["phase"], "Done");
    }

    #[test]
    fn test_dashboard_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_dashboard(&view(2, Some("SUMMARY\n"))).unwrap();
        assert!(output.contains("12.50"));
        assert!(output.contains("Thread number 1"));
        assert!(output.contains("1970-01-01 00:00:00"));
        assert!(output.contains("SUMMARY"));
    }

    #[test]
    fn test_dashboard_empty_store_and_missing_report() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_dashboard(&view(0, None)).unwrap();
        assert!(output.contains("No data available"));
        assert!(output.contains("No report found at reports/analysis.txt"));
    }

    #[test]
    fn test_dashboard_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_dashboard(&view(1, None)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["overview"]["threads"], 1);
        assert!(value["report"].is_null());
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.warning("careful"), "⚠ careful");
        assert_eq!(formatter.error("bad"), "✗ bad");
        assert_eq!(formatter.info("note"), "ℹ note");
    }
}
