//! Error types for downunzip
//!
//! Errors never cross into the observer as raised faults. The worker tasks catch them at their
//! boundary and turn them into silence (downloader), an opt-in `DownloadFailed` notification, or
//! a `Failure` extraction result. The variants here carry enough context to log them usefully.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for downunzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for downunzip
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chunk_size")
        key: Option<String>,
    },

    /// Download-related error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Extraction-related error
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error (config files, notification payloads)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The task was cancelled through its handle
    #[error("operation cancelled")]
    Cancelled,

    /// A worker task panicked or was aborted by the runtime
    #[error("task failed: {0}")]
    TaskFailed(String),
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The connection could not be established or the transport failed before a response
    #[error("connection failed for {url}: {reason}")]
    Connection {
        /// The URL that was requested
        url: String,
        /// The reason the connection failed
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// The URL that was requested
        url: String,
        /// The status code returned by the server
        status: u16,
    },

    /// Reading the response body failed mid-stream
    #[error("response stream from {url} failed after {bytes_transferred} bytes: {reason}")]
    Stream {
        /// The URL that was being downloaded
        url: String,
        /// Bytes already written to disk when the fault occurred
        bytes_transferred: u64,
        /// The reason the stream failed
        reason: String,
    },

    /// Creating or writing the destination file failed
    #[error("failed to write {path}: {reason}")]
    Io {
        /// The destination file
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// No chunk arrived within the configured read timeout
    #[error("no data from {url} within {after:?}")]
    Timeout {
        /// The URL that was being downloaded
        url: String,
        /// The configured read timeout
        after: Duration,
    },
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive could not be opened or does not start with a zip entry
    #[error("cannot open archive {archive}: {reason}")]
    OpenFailed {
        /// The archive that could not be opened
        archive: PathBuf,
        /// The reason opening failed
        reason: String,
    },

    /// Reading an entry failed (corrupt data, checksum mismatch, truncation)
    #[error("failed to read entry '{entry}' of {archive}: {reason}")]
    EntryFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// The entry name as stored in the archive
        entry: String,
        /// The reason reading failed
        reason: String,
    },

    /// Writing extracted output failed
    #[error("failed to write {path}: {reason}")]
    WriteFailed {
        /// The output path that could not be written
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Download(e) => match e {
                DownloadError::Connection { .. } => "connection_failed",
                DownloadError::HttpStatus { .. } => "http_status",
                DownloadError::Stream { .. } => "stream_failed",
                DownloadError::Io { .. } => "download_io",
                DownloadError::Timeout { .. } => "timeout",
            },
            Error::Extraction(e) => match e {
                ExtractionError::OpenFailed { .. } => "archive_open_failed",
                ExtractionError::EntryFailed { .. } => "entry_failed",
                ExtractionError::WriteFailed { .. } => "extraction_io",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Cancelled => "cancelled",
            Error::TaskFailed(_) => "task_failed",
        }
    }
}
