//! Sift Storage Layer
//!
//! SQLite persistence for collected threads and comments.
//!
//! # Architecture
//!
//! - Two tables, `posts` and `comments`, with an index on `comments.post_id`
//! - Insert-or-ignore writes: a row whose id is already stored is skipped
//! - One connection per operation, so the store can be cloned into worker tasks
//!   and SQLite's own locking serializes concurrent writers
//! - WAL journal and a busy timeout on every writable connection
//!
//! # Examples
//!
//! ```no_run
//! use sift_store::SqliteStore;
//!
//! let store = SqliteStore::new("data/posts.db").unwrap();
//! let rows = store.query_all_text().unwrap();
//! println!("{} rows", rows.len());
//! ```

#![warn(missing_docs)]

use rusqlite::{params, Connection, OpenFlags};
use sift_domain::{Comment, TextRow, Thread};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// How long a connection waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file does not exist (read-only open)
    #[error("Database file not found: {0}")]
    NotFound(String),

    /// Write attempted through a read-only store
    #[error("Store is read-only")]
    ReadOnly,
}

/// Aggregate counts shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOverview {
    /// Number of stored threads
    pub thread_count: usize,

    /// Number of stored comments
    pub comment_count: usize,

    /// Mean thread score, 0.0 when the store is empty
    pub average_score: f64,
}

/// SQLite-based persistence store
///
/// Holds only the database path. Every operation opens its own connection,
/// uses it, and drops it before returning, so clones can be handed to
/// concurrent workers freely.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    read_only: bool,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema
    ///
    /// Parent directories are created as required.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path,
            read_only: false,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an existing database for reading only
    ///
    /// Never creates the file and never touches the schema.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path,
            read_only: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Override the busy timeout used by each connection
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection scoped to one operation
    fn connect(&self) -> Result<Connection, StoreError> {
        if self.read_only {
            let conn = Connection::open_with_flags(
                &self.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(self.busy_timeout)?;
            return Ok(conn);
        }

        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    fn writable(&self) -> Result<Connection, StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.connect()
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.writable()?.execute_batch(schema)?;
        Ok(())
    }

    /// Insert threads whose id is not stored yet
    ///
    /// Existing rows are left untouched. Returns the number of rows inserted.
    pub fn upsert_threads(&self, threads: &[Thread]) -> Result<usize, StoreError> {
        let mut conn = self.writable()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO posts
                     (id, title, selftext, url, created_utc, score, num_comments)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for thread in threads {
                inserted += stmt.execute(params![
                    &thread.id,
                    &thread.title,
                    &thread.body,
                    &thread.url,
                    thread.created_at,
                    thread.score,
                    thread.comment_count,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            "Stored {} new threads ({} skipped)",
            inserted,
            threads.len() - inserted
        );
        Ok(inserted)
    }

    /// Insert comments for `thread_id` whose id is not stored yet
    ///
    /// The thread must already be stored; a missing thread fails the whole
    /// batch with a foreign key error. Returns the number of rows inserted.
    pub fn upsert_comments(
        &self,
        comments: &[Comment],
        thread_id: &str,
    ) -> Result<usize, StoreError> {
        let mut conn = self.writable()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO comments (id, post_id, comment_body, created_utc, score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for comment in comments {
                inserted += stmt.execute(params![
                    &comment.id,
                    thread_id,
                    &comment.body,
                    comment.created_at,
                    comment.score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Every thread joined with each of its comments
    ///
    /// Threads without comments yield one row with `comment: None`. Rows are
    /// ordered by thread insertion, then comment insertion.
    pub fn query_all_text(&self) -> Result<Vec<TextRow>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT p.title, p.selftext, c.comment_body
             FROM posts p
             LEFT JOIN comments c ON p.id = c.post_id
             ORDER BY p.rowid, c.rowid",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TextRow {
                    title: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    body: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    comment: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Thread/comment counts and mean thread score
    pub fn overview(&self) -> Result<StoreOverview, StoreError> {
        let conn = self.connect()?;
        let overview = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM posts),
                    (SELECT COUNT(*) FROM comments),
                    (SELECT AVG(score) FROM posts)",
            [],
            |row| {
                Ok(StoreOverview {
                    thread_count: row.get::<_, i64>(0)? as usize,
                    comment_count: row.get::<_, i64>(1)? as usize,
                    average_score: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            },
        )?;
        Ok(overview)
    }

    /// The most recently created threads, newest first
    pub fn recent_threads(&self, limit: usize) -> Result<Vec<Thread>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, selftext, url, created_utc, score, num_comments
             FROM posts ORDER BY created_utc DESC LIMIT ?1",
        )?;
        let threads = stmt
            .query_map(params![limit as i64], row_to_thread)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(threads)
    }
}

fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        body: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        url: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        created_at: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        score: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        comment_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
    })
}
