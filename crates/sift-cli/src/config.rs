//! Application configuration loaded from `sift.toml`

use serde::{Deserialize, Serialize};
use sift_collector::{RetryPolicy, SearchQuery};
use sift_domain::KeywordSets;
use sift_summarizer::{ChunkStrategy, SummarizerConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/sift.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// File is not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Required value is absent or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Value is out of range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Whole application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where and what to search
    #[serde(default)]
    pub forum: ForumSection,

    /// Named keyword categories
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<String>>,

    /// Which categories take part in relevance filtering
    #[serde(default)]
    pub filter: FilterSection,

    /// Completion endpoint and prompt settings
    #[serde(default)]
    pub llm: LlmSection,

    /// SQLite store
    #[serde(default)]
    pub database: DatabaseSection,

    /// Report and log files
    #[serde(default)]
    pub output: OutputSection,

    /// Concurrency, retries and scheduling
    #[serde(default)]
    pub runtime: RuntimeSection,
}

/// `[forum]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumSection {
    /// Subreddit to search
    pub subreddit: String,
    /// Search expression
    pub search_query: String,
    /// relevance | hot | top | new | comments
    pub sort: String,
    /// all | day | hour | month | week | year
    pub time_filter: String,
    /// Results per page
    pub batch_size: usize,
    /// Maximum pages per run
    pub max_pagination: usize,
    /// Thread bodies must be longer than this
    pub post_min_length: usize,
    /// Comments must be at least this long
    pub comment_min_length: usize,
    /// Placeholder expansions per thread; unbounded when absent
    pub expand_limit: Option<usize>,
}

impl Default for ForumSection {
    fn default() -> Self {
        Self {
            subreddit: String::new(),
            search_query: String::new(),
            sort: "relevance".to_string(),
            time_filter: "year".to_string(),
            batch_size: 100,
            max_pagination: 5,
            post_min_length: 100,
            comment_min_length: 20,
            expand_limit: None,
        }
    }
}

/// `[filter]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Categories used for matching; empty means all
    pub active_categories: Vec<String>,
}

/// `[llm]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// Model name
    pub model: String,
    /// System instruction
    pub system_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Input budget per request (applied as characters)
    pub max_input_tokens: usize,
    /// Output cap per request
    pub max_response_tokens: u32,
    /// Rows (or approximate tokens) per request
    pub chunk_size: usize,
    /// by_rows | by_approx_tokens
    pub chunk_strategy: ChunkStrategy,
    /// Chat-completions base URL
    pub base_url: String,
    /// Attempts per completion call
    pub max_retries: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        let summarizer = SummarizerConfig::default();
        Self {
            model: summarizer.model,
            system_prompt: summarizer.system_prompt,
            temperature: summarizer.temperature,
            max_input_tokens: summarizer.max_input_chars,
            max_response_tokens: summarizer.max_output_tokens,
            chunk_size: summarizer.chunk_size,
            chunk_strategy: summarizer.chunk_strategy,
            base_url: sift_llm::openai::DEFAULT_BASE_URL.to_string(),
            max_retries: sift_llm::openai::DEFAULT_MAX_RETRIES,
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file
    pub file: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data/posts.db"),
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Report artifact, overwritten by every run
    pub report_file: PathBuf,
    /// Optional log file next to stderr logging
    pub log_file: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            report_file: PathBuf::from("reports/analysis.txt"),
            log_file: None,
        }
    }
}

/// `[runtime]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Concurrent comment workers
    pub workers: usize,
    /// Attempts for rate-limited forum calls
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled afterwards
    pub retry_base_delay_ms: u64,
    /// Minutes between runs in watch mode
    pub interval_minutes: u64,
    /// Seconds a store connection waits on a locked database
    pub busy_timeout_secs: u64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            workers: 4,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            interval_minutes: 24 * 60,
            busy_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check required fields and ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forum.subreddit.trim().is_empty() {
            return Err(ConfigError::MissingField("forum.subreddit".to_string()));
        }
        if self.forum.search_query.trim().is_empty() {
            return Err(ConfigError::MissingField("forum.search_query".to_string()));
        }
        if self.keyword_sets().is_empty() {
            return Err(ConfigError::MissingField("keywords".to_string()));
        }
        for name in &self.filter.active_categories {
            if !self.keywords.contains_key(name) {
                return Err(invalid(
                    "filter.active_categories",
                    format!("unknown category '{}'", name),
                ));
            }
        }

        let positive = [
            ("forum.batch_size", self.forum.batch_size),
            ("forum.max_pagination", self.forum.max_pagination),
            ("llm.chunk_size", self.llm.chunk_size),
            ("llm.max_input_tokens", self.llm.max_input_tokens),
            ("llm.max_retries", self.llm.max_retries as usize),
            ("runtime.workers", self.runtime.workers),
            ("runtime.retry_attempts", self.runtime.retry_attempts as usize),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0".to_string()));
            }
        }
        if self.llm.max_response_tokens == 0 {
            return Err(invalid(
                "llm.max_response_tokens",
                "must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("must be within [0, 2], got {}", self.llm.temperature),
            ));
        }
        let positive_secs = [
            ("runtime.interval_minutes", self.runtime.interval_minutes),
            ("runtime.busy_timeout_secs", self.runtime.busy_timeout_secs),
        ];
        for (field, value) in positive_secs {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0".to_string()));
            }
        }
        Ok(())
    }

    /// Keyword categories restricted to the active ones
    pub fn keyword_sets(&self) -> KeywordSets {
        KeywordSets::from_categories(self.keywords.clone())
            .with_active_categories(self.filter.active_categories.clone())
    }

    /// Search parameters for the collector
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            forum: self.forum.subreddit.clone(),
            query: self.forum.search_query.clone(),
            sort: self.forum.sort.clone(),
            time_window: self.forum.time_filter.clone(),
            page_size: self.forum.batch_size,
            max_pages: self.forum.max_pagination,
        }
    }

    /// Summarizer settings
    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            model: self.llm.model.clone(),
            system_prompt: self.llm.system_prompt.clone(),
            temperature: self.llm.temperature,
            max_input_chars: self.llm.max_input_tokens,
            max_output_tokens: self.llm.max_response_tokens,
            chunk_size: self.llm.chunk_size,
            chunk_strategy: self.llm.chunk_strategy,
        }
    }

    /// Retry policy for forum calls; its base delay also paces completion retries
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.runtime.retry_attempts,
            Duration::from_millis(self.runtime.retry_base_delay_ms),
        )
    }

    /// Time between runs in watch mode
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.runtime.interval_minutes * 60)
    }

    /// Lock wait for each store connection
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.busy_timeout_secs)
    }
}

fn invalid(field: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [forum]
        subreddit = "oscp"
        search_query = "exam"

        [keywords]
        exam = ["passed", "Proctor"]
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.forum.batch_size, 100);
        assert_eq!(config.forum.expand_limit, None);
        assert_eq!(config.runtime.workers, 4);
        assert_eq!(config.busy_timeout(), Duration::from_secs(30));
        assert_eq!(config.llm.chunk_strategy, ChunkStrategy::ByRows);
        assert_eq!(config.database.file, PathBuf::from("data/posts.db"));
        assert_eq!(config.output.log_file, None);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
            [forum]
            subreddit = "oscp"
            search_query = "exam OR review"
            sort = "new"
            time_filter = "month"
            batch_size = 50
            max_pagination = 3
            post_min_length = 80
            comment_min_length = 15
            expand_limit = 10

            [keywords]
            technical_terms = ["buffer overflow"]
            exam_experience = ["passed"]

            [filter]
            active_categories = ["exam_experience"]

            [llm]
            model = "gpt-4o"
            temperature = 0.5
            chunk_size = 10
            chunk_strategy = "by_approx_tokens"

            [database]
            file = "/tmp/sift.db"

            [output]
            report_file = "/tmp/report.txt"
            log_file = "/tmp/sift.log"

            [runtime]
            workers = 8
            retry_attempts = 5
            retry_base_delay_ms = 10
            interval_minutes = 60
            busy_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.forum.expand_limit, Some(10));
        assert_eq!(config.llm.chunk_strategy, ChunkStrategy::ByApproxTokens);
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));

        let query = config.search_query();
        assert_eq!(query.page_size, 50);
        assert_eq!(query.max_pages, 3);
        assert_eq!(query.time_window, "month");

        let sets = config.keyword_sets();
        assert!(sets.matches("i passed today"));
        assert!(!sets.matches("a buffer overflow question"), "Inactive category ignored");
    }

    #[test]
    fn test_missing_subreddit() {
        let result = AppConfig::from_toml("[keywords]\nexam = [\"passed\"]");
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "forum.subreddit"));
    }

    #[test]
    fn test_missing_keywords() {
        let result = AppConfig::from_toml("[forum]\nsubreddit = \"a\"\nsearch_query = \"b\"");
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "keywords"));
    }

    #[test]
    fn test_unknown_active_category() {
        let toml = format!("{}\n[filter]\nactive_categories = [\"nope\"]", MINIMAL);
        assert!(matches!(AppConfig::from_toml(&toml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let toml = format!("{}\n[runtime]\nworkers = 0", MINIMAL);
        let err = AppConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("runtime.workers"));
    }

    #[test]
    fn test_zero_busy_timeout_rejected() {
        let toml = format!("{}\n[runtime]\nbusy_timeout_secs = 0", MINIMAL);
        let err = AppConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("runtime.busy_timeout_secs"));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let toml = format!("{}\n[llm]\ntemperature = 3.0", MINIMAL);
        assert!(AppConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(AppConfig::from_toml("[forum"), Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        let rendered = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_summarizer_config_mapping() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        let summarizer = config.summarizer_config();
        assert_eq!(summarizer.max_input_chars, config.llm.max_input_tokens);
        assert_eq!(summarizer.max_output_tokens, config.llm.max_response_tokens);
        assert!(summarizer.validate().is_ok());
    }
}
