//! # downunzip
//!
//! Download a zip archive over HTTP and extract it next to the download, reporting progress
//! and the extraction result through one ordered notification channel.
//!
//! ## How it fits together
//!
//! - The download task streams the response body to disk in fixed-size chunks and emits a
//!   progress notification after each chunk is flushed.
//! - The extraction task walks the archive entries in stored order and emits exactly one
//!   result notification.
//! - An [`Observer`] drains the channel on the caller's task and drives a [`DisplaySink`].
//!   Extraction becomes available once a download reports 100%.
//!
//! ## Quick Start
//!
//! ```no_run
//! use downunzip::{Config, DisplaySink, DownUnzip, Observer};
//! use std::path::Path;
//!
//! struct Stdout;
//!
//! impl DisplaySink for Stdout {
//!     fn set_progress(&mut self, percentage: Option<u8>) {
//!         println!("progress: {:?}", percentage);
//!     }
//!     fn set_file_name(&mut self, _file_name: &str) {}
//!     fn set_destination_path(&mut self, _path: &Path) {}
//!     fn set_extract_enabled(&mut self, _enabled: bool) {}
//!     fn set_result_text(&mut self, text: &str) {
//!         println!("{}", text);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     // Without this a failed download never ends `run_until_extracted`
//!     config.download.report_failures = true;
//!
//!     let (pipeline, mut notifications) = DownUnzip::new(config).await?;
//!
//!     pipeline.start_download();
//!     let (_sink, result) = Observer::new(Stdout)
//!         .run_until_extracted(&mut notifications, &pipeline)
//!         .await;
//!
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// HTTP download worker and the pipeline facade
pub mod downloader;
/// Error types
pub mod error;
/// Zip extraction
pub mod extraction;
/// Notification channel between workers and the observer
pub mod notify;
/// Observer and display contract
pub mod observer;
/// Handles to running tasks
pub mod task;
/// Notification payloads
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, ExtractionConfig};
pub use downloader::{DownUnzip, DownloadSummary, HttpDownloader};
pub use error::{DownloadError, Error, ExtractionError, Result};
pub use extraction::{ExtractionSummary, Extractor, ZipExtractor, extract_archive};
pub use notify::{Notifications, Notifier};
pub use observer::{DisplaySink, EXTRACTION_FAILED, EXTRACTION_SUCCEEDED, Observer};
pub use task::TaskHandle;
pub use types::{Event, Outcome, ProgressNotification, ResultNotification, TaskKind};
