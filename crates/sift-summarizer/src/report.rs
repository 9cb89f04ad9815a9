//! Report artifact

use crate::error::{Result, SummarizerError};
use std::fs;
use std::path::Path;

/// Write the report, replacing any previous one
///
/// Missing parent directories are created.
pub fn write_report(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    let wrap = |source: std::io::Error| SummarizerError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, text).map_err(wrap)?;

    tracing::info!("Report written to {} ({} chars)", path.display(), text.chars().count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_dirs_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("analysis.txt");

        write_report(&path, "first report, rather long").unwrap();
        write_report(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = write_report(blocker.join("report.txt"), "text");
        assert!(matches!(result, Err(SummarizerError::Write { .. })));
    }
}
