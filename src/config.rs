//! Configuration types for edgar-dl

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Archive endpoint configuration
///
/// Groups settings for the HTTP side of the pipeline. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the archive root; identifiers are appended verbatim
    /// (default: "https://www.sec.gov/Archives/")
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            archive_base_url: default_archive_base_url(),
            timeout: default_timeout(),
        }
    }
}

/// Working-directory layout
///
/// `<work_dir>/<index_subdir>/` holds externally-produced index artifacts;
/// `<work_dir>/<filings_subdir>/` holds raw temp containers and decomposed
/// output, nested according to the filename template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working directory for all saved data (default: "edgar")
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Subdirectory for filings data (default: "filings")
    #[serde(default = "default_filings_subdir")]
    pub filings_subdir: String,

    /// Subdirectory for index artifacts (default: "index")
    #[serde(default = "default_index_subdir")]
    pub index_subdir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            filings_subdir: default_filings_subdir(),
            index_subdir: default_index_subdir(),
        }
    }
}

/// Batch scheduling configuration (retry passes, pool size, chunking)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of fetch passes per batch (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Sleep between retry passes (default: 5 seconds)
    #[serde(default = "default_backoff", with = "duration_serde")]
    pub backoff: Duration,

    /// Add random jitter to the inter-pass sleep (default: false)
    #[serde(default)]
    pub jitter: bool,

    /// Maximum concurrent fetch workers (default: 8)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Identifiers per pipeline chunk (default: 100)
    ///
    /// Bounds how many raw containers are held on disk at once. A throughput
    /// and disk-usage knob, not a correctness parameter.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            jitter: false,
            concurrency: default_concurrency(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Decomposition behavior configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Keep only text documents; processing of a container stops at its
    /// first GRAPHIC segment (default: true)
    #[serde(default = "default_true")]
    pub text_only: bool,

    /// Keep the raw containers instead of decomposing them (default: false)
    #[serde(default)]
    pub keep_raw: bool,

    /// Filename template for decomposed output (default: "%Y%m%d_%company_")
    ///
    /// Supports `%org`, `%company`, and single-character chrono date
    /// directives applied to the filing date.
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            text_only: true,
            keep_raw: false,
            filename_template: default_filename_template(),
        }
    }
}

/// Main configuration for [`FilingDownloader`](crate::downloader::FilingDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`network`](NetworkConfig) — archive base URL, request timeout
/// - [`storage`](StorageConfig) — working-directory layout
/// - [`batch`](BatchConfig) — retry passes, worker pool, chunking
/// - [`processing`](ProcessingConfig) — decomposition behavior
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting) and every field has a serde default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Archive endpoint settings
    #[serde(flatten)]
    pub network: NetworkConfig,

    /// Working-directory layout
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// Batch scheduling settings
    #[serde(flatten)]
    pub batch: BatchConfig,

    /// Decomposition behavior
    #[serde(flatten)]
    pub processing: ProcessingConfig,
}

impl Config {
    /// Directory holding raw temp containers and decomposed output
    pub fn fetch_cache_dir(&self) -> PathBuf {
        self.storage.work_dir.join(&self.storage.filings_subdir)
    }

    /// Directory holding externally-produced index artifacts
    pub fn index_dir(&self) -> PathBuf {
        self.storage.work_dir.join(&self.storage.index_subdir)
    }

    /// Validate the configuration, returning the first offending key
    pub fn validate(&self) -> Result<()> {
        if self.batch.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("max_attempts".to_string()),
            });
        }
        if self.batch.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("concurrency".to_string()),
            });
        }
        if self.batch.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be at least 1".to_string(),
                key: Some("chunk_size".to_string()),
            });
        }
        if self.processing.filename_template.is_empty() {
            return Err(Error::Config {
                message: "filename_template must not be empty".to_string(),
                key: Some("filename_template".to_string()),
            });
        }
        if let Err(e) = url::Url::parse(&self.network.archive_base_url) {
            return Err(Error::Config {
                message: format!(
                    "archive_base_url '{}' is not a valid URL: {}",
                    self.network.archive_base_url, e
                ),
                key: Some("archive_base_url".to_string()),
            });
        }
        Ok(())
    }
}

fn default_archive_base_url() -> String {
    "https://www.sec.gov/Archives/".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("edgar")
}

fn default_filings_subdir() -> String {
    "filings".to_string()
}

fn default_index_subdir() -> String {
    "index".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_secs(5)
}

fn default_concurrency() -> usize {
    8
}

fn default_chunk_size() -> usize {
    100
}

fn default_filename_template() -> String {
    "%Y%m%d_%company_".to_string()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_archive_conventions() {
        let config = Config::default();
        assert_eq!(config.network.archive_base_url, "https://www.sec.gov/Archives/");
        assert_eq!(config.network.timeout, Duration::from_secs(30));
        assert_eq!(config.batch.max_attempts, 3);
        assert_eq!(config.batch.backoff, Duration::from_secs(5));
        assert!(!config.batch.jitter);
        assert_eq!(config.batch.chunk_size, 100);
        assert!(config.processing.text_only);
        assert!(!config.processing.keep_raw);
        assert_eq!(config.processing.filename_template, "%Y%m%d_%company_");
        assert_eq!(config.fetch_cache_dir(), PathBuf::from("edgar/filings"));
        assert_eq!(config.index_dir(), PathBuf::from("edgar/index"));
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut config = Config::default();
        config.batch.max_attempts = 7;
        config.batch.backoff = Duration::from_secs(1);
        config.processing.text_only = false;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn validate_rejects_zero_max_attempts() {
        let mut config = Config::default();
        config.batch.max_attempts = 0;
        let err = config.validate().unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("max_attempts")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_template() {
        let mut config = Config::default();
        config.processing.filename_template = String::new();
        let err = config.validate().unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("filename_template")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_unparseable_base_url() {
        let mut config = Config::default();
        config.network.archive_base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("archive_base_url")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }
}
