//! Download side of the pipeline and the [`DownUnzip`] facade that ties it to extraction.
//!
//! - [`http`] - the streaming HTTP download worker

pub mod http;


pub use http::{DownloadSummary, HttpDownloader};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extraction::Extractor;
use crate::notify::{self, Notifications};
use crate::task::TaskHandle;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry point: starts downloads and extractions that report into one notification channel
///
/// Cloning is cheap; clones share the HTTP client and the channel. The channel stays open
/// while any clone or running task is alive.
#[derive(Clone)]
pub struct DownUnzip {
    config: Arc<Config>,
    http: HttpDownloader,
    extractor: Extractor,
}

impl DownUnzip {
    /// Validate `config`, create the download directory and wire up the channel
    ///
    /// Returns the facade together with the receiving end the observer drains.
    pub async fn new(config: Config) -> Result<(Self, Notifications)> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let (notifier, notifications) = notify::channel();
        let config = Arc::new(config);
        let http = HttpDownloader::new(Arc::clone(&config), notifier.clone())?;
        let extractor = Extractor::new(Arc::clone(&config), notifier);

        tracing::debug!(
            source_url = %config.download.source_url,
            download_dir = %config.download.download_dir.display(),
            chunk_size = config.chunk_size(),
            "pipeline ready"
        );

        Ok((
            Self {
                config,
                http,
                extractor,
            },
            notifications,
        ))
    }

    /// Download the configured source URL
    pub fn start_download(&self) -> TaskHandle {
        self.http.start(self.config.download.source_url.clone())
    }

    /// Download an arbitrary URL into the download directory
    pub fn start_download_from(&self, url: impl Into<String>) -> TaskHandle {
        self.http.start(url)
    }

    /// Extract an archive into the directory named after it
    pub fn start_extraction(&self, archive_path: impl Into<PathBuf>) -> TaskHandle {
        self.extractor.start(archive_path)
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}
