//! Read-only view over the store and the latest report

use crate::error::Result;
use sift_domain::Thread;
use sift_store::{SqliteStore, StoreOverview};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Everything the dashboard shows
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Aggregate counts
    pub overview: StoreOverview,
    /// Newest threads first
    pub recent: Vec<Thread>,
    /// Where the report is expected
    pub report_path: PathBuf,
    /// Report text, `None` when no run has produced one yet
    pub report: Option<String>,
}

impl DashboardView {
    /// Gather the view without writing anything
    ///
    /// A missing database is an error; a missing report is not.
    pub fn load(database: &Path, report_path: &Path, limit: usize) -> Result<Self> {
        let store = SqliteStore::open_read_only(database)?;
        let overview = store.overview()?;
        let recent = store.recent_threads(limit)?;

        let report = match std::fs::read_to_string(report_path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Report not found at {}", report_path.display());
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            overview,
            recent,
            report_path: report_path.to_path_buf(),
            report,
        })
    }

    /// Whether the store holds no threads
    pub fn is_empty(&self) -> bool {
        self.overview.thread_count == 0
    }
}

/// Format epoch seconds as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_timestamp(epoch_secs: f64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs.trunc() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use sift_store::StoreError;
    use tempfile::TempDir;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000.9), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = DashboardView::load(
            &dir.path().join("missing.db"),
            &dir.path().join("report.txt"),
            10,
        );
        assert!(matches!(result, Err(CliError::Store(StoreError::NotFound(_)))));
        assert!(!dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_missing_report_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("posts.db");
        SqliteStore::new(&db).unwrap();

        let view = DashboardView::load(&db, &dir.path().join("report.txt"), 10).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.report, None);
    }
}
