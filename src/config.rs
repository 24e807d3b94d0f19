//! Configuration types for downunzip

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Download behavior configuration (source, destination, network hardening)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DownloadConfig {
    /// URL fetched by [`DownUnzip::start_download`](crate::DownUnzip::start_download)
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Directory the downloaded file lands in (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connection setup timeout in seconds (None = wait forever)
    #[serde(default, with = "optional_duration_serde")]
    pub connect_timeout: Option<Duration>,

    /// Maximum time to wait for a single chunk in seconds (None = wait forever)
    #[serde(default, with = "optional_duration_serde")]
    pub read_timeout: Option<Duration>,

    /// Emit a `DownloadFailed` notification instead of failing silently (default: false)
    ///
    /// Without this the observer cannot tell "still downloading" apart from "failed":
    /// progress simply stops and extraction never becomes available.
    #[serde(default)]
    pub report_failures: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            download_dir: default_download_dir(),
            user_agent: default_user_agent(),
            connect_timeout: None,
            read_timeout: None,
            report_failures: false,
        }
    }
}

/// Shared I/O settings for the download and extraction workers
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Size of a single read/write block in bytes for both workers (default: 2048)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Main configuration for [`DownUnzip`](crate::DownUnzip)
///
/// Sub-config fields are flattened, so the JSON format has no nesting:
///
/// ```json
/// { "source_url": "https://example.com/a.zip", "download_dir": "/tmp/dl", "chunk_size": 4096 }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Download settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Chunking settings shared with the extractor
    #[serde(flatten)]
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Chunk size used by both workers
    pub fn chunk_size(&self) -> usize {
        self.extraction.chunk_size
    }

    /// Load a JSON config file; missing keys fall back to their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the workers cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.extraction.chunk_size == 0 {
            return Err(Error::config("chunk size must be positive", "chunk_size"));
        }
        if let Err(e) = url::Url::parse(&self.download.source_url) {
            return Err(Error::config(
                format!("invalid source URL '{}': {}", self.download.source_url, e),
                "source_url",
            ));
        }
        if self.download.user_agent.trim().is_empty() {
            return Err(Error::config("user agent must not be empty", "user_agent"));
        }
        Ok(())
    }
}

fn default_source_url() -> String {
    "https://www.sqlite.org/2022/sqlite-tools-linux-x86-3380000.zip".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_user_agent() -> String {
    concat!("downunzip/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_chunk_size() -> usize {
    2048
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
