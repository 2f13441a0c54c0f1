use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, ScanError};

const LOCAL_CONFIG: &str = ".wordscout.yaml";
const GLOBAL_CONFIG: &str = "wordscout/config.yaml";

/// How to treat file contents that are not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Undecodable files are skipped and counted as failures
    #[default]
    FailFast,
    /// Invalid sequences are replaced with U+FFFD and the file is counted
    Lossy,
}

/// Tuning knobs for a scan run.
///
/// The search term and root directory are not part of the configuration;
/// they travel in a [`SearchRequest`](crate::results::SearchRequest).
///
/// # Configuration Locations
///
/// Files are merged in order of increasing precedence:
/// 1. Global `$CONFIG_DIR/wordscout/config.yaml`
/// 2. Local `.wordscout.yaml` in the current directory
/// 3. Custom config file passed via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Worker pool size (default: CPU cores, 1 = sequential)
/// thread_count: 4
///
/// # Per-file read timeout, humantime syntax
/// file_timeout: "2s"
///
/// # failfast or lossy
/// encoding_mode: failfast
///
/// # Follow symbolic links while walking
/// follow_links: false
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of worker threads reading and counting files
    pub thread_count: NonZeroUsize,

    /// Upper bound for reading a single file
    #[serde(
        serialize_with = "serialize_timeout",
        deserialize_with = "deserialize_timeout"
    )]
    pub file_timeout: Option<Duration>,

    /// Handling of non UTF-8 content
    pub encoding_mode: EncodingMode,

    /// Whether symbolic links are followed during enumeration
    pub follow_links: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Values supplied on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub thread_count: Option<NonZeroUsize>,
    pub file_timeout: Option<Duration>,
    pub encoding_mode: Option<EncodingMode>,
    pub follow_links: bool,
    pub log_level: Option<String>,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn serialize_timeout<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timeout {
        Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            thread_count: default_thread_count(),
            file_timeout: None,
            encoding_mode: EncodingMode::default(),
            follow_links: false,
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(ScanError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let config_files = [
            dirs::config_dir().map(|p| p.join(GLOBAL_CONFIG)),
            Some(PathBuf::from(LOCAL_CONFIG)),
            config_path.map(PathBuf::from),
        ];

        let mut builder = ConfigBuilder::builder();
        for path in config_files.iter().flatten() {
            if path.is_file() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but cannot drive a scan
    pub fn validate(&self) -> Result<()> {
        if self.file_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ScanError::config("file_timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ScanOverrides) -> Self {
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if cli.file_timeout.is_some() {
            self.file_timeout = cli.file_timeout;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if cli.follow_links {
            self.follow_links = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Configuration for a deterministic single-threaded run
    pub fn sequential() -> Self {
        Self {
            thread_count: NonZeroUsize::MIN,
            ..Self::default()
        }
    }
}
