//! HTTP download worker
//!
//! Streams a response body to disk in fixed-size chunks and emits one progress notification
//! per chunk, after the chunk has been flushed. Faults end the task; they are logged and, only
//! when `report_failures` is set, turned into a `DownloadFailed` notification.

use crate::config::Config;
use crate::error::{DownloadError, Error, Result};
use crate::notify::Notifier;
use crate::task::TaskHandle;
use crate::types::{Event, ProgressNotification, TaskKind};
use crate::utils::{percentage, resolve_file_name};
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// What a finished download produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Resolved file name
    pub file_name: String,
    /// Absolute path of the written file
    pub destination: PathBuf,
    /// Bytes written to disk
    pub bytes_transferred: u64,
    /// Declared content length, if the server sent one
    pub total_bytes: Option<u64>,
    /// Number of chunks written (one progress notification each)
    pub chunks: u64,
}

/// Download worker, cheap to clone (the HTTP client and config are shared)
#[derive(Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    config: Arc<Config>,
    notifier: Notifier,
}

impl HttpDownloader {
    /// Build the worker and its HTTP client
    pub fn new(config: Arc<Config>, notifier: Notifier) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.download.user_agent.clone());
        if let Some(timeout) = config.download.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            notifier,
        })
    }

    /// Spawn a download task for `url`
    pub fn start(&self, url: impl Into<String>) -> TaskHandle {
        let url = url.into();
        let cancel = CancellationToken::new();
        let worker = self.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move { worker.run(url, token).await });
        TaskHandle::new(TaskKind::Download, cancel, handle)
    }

    async fn run(self, url: String, cancel: CancellationToken) {
        match self.download(&url, &cancel).await {
            Ok(summary) => {
                info!(
                    %url,
                    file = %summary.destination.display(),
                    bytes = summary.bytes_transferred,
                    chunks = summary.chunks,
                    "download complete"
                );
            }
            Err(e) => {
                if matches!(e, Error::Cancelled) {
                    info!(%url, "download cancelled");
                } else {
                    warn!(%url, error = %e, code = e.error_code(), "download failed");
                }
                if self.config.download.report_failures {
                    self.notifier.emit(Event::DownloadFailed {
                        url,
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Download `url` into the configured directory, emitting progress as chunks land
    ///
    /// Every chunk except the last is exactly `chunk_size` bytes. The partial file is left on
    /// disk when this returns an error.
    pub async fn download(&self, url: &str, cancel: &CancellationToken) -> Result<DownloadSummary> {
        debug!(%url, "connecting");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.get(url).send() => {
                response.map_err(|e| DownloadError::Connection {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let file_name = resolve_file_name(response.headers(), url);
        let destination = std::path::absolute(self.config.download_dir().join(&file_name))
            .map_err(|e| io_error(&self.config.download_dir().join(&file_name), e))?;
        let total_bytes = response.content_length();
        info!(%url, file = %destination.display(), ?total_bytes, "download started");

        let mut file = tokio::fs::File::create(&destination)
            .await
            .map_err(|e| io_error(&destination, e))?;

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader = StreamReader::new(Box::pin(body));
        let mut buf = vec![0u8; self.config.chunk_size()];
        let mut bytes_transferred = 0u64;
        let mut chunks = 0u64;

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                read = self.next_chunk(&mut reader, &mut buf, url, bytes_transferred) => read,
            };
            let n = read?;
            if n == 0 {
                break;
            }

            file.write_all(&buf[..n])
                .await
                .map_err(|e| io_error(&destination, e))?;
            file.flush().await.map_err(|e| io_error(&destination, e))?;

            bytes_transferred += n as u64;
            chunks += 1;
            let pct = percentage(bytes_transferred, total_bytes);
            trace!(bytes_transferred, ?pct, "chunk written");

            self.notifier.emit(Event::Progress(ProgressNotification {
                percentage: pct,
                file_name: file_name.clone(),
                destination_path: destination.clone(),
                bytes_transferred,
                total_bytes,
            }));
        }

        Ok(DownloadSummary {
            file_name,
            destination,
            bytes_transferred,
            total_bytes,
            chunks,
        })
    }

    async fn next_chunk<R>(
        &self,
        reader: &mut R,
        buf: &mut [u8],
        url: &str,
        bytes_transferred: u64,
    ) -> Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        let filled = match self.config.download.read_timeout {
            Some(after) => tokio::time::timeout(after, fill_chunk(reader, buf))
                .await
                .map_err(|_| DownloadError::Timeout {
                    url: url.to_string(),
                    after,
                })?,
            None => fill_chunk(reader, buf).await,
        };

        filled.map_err(|e| {
            DownloadError::Stream {
                url: url.to_string(),
                bytes_transferred,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Read until `buf` is full or the stream ends; returns the number of bytes read
async fn fill_chunk<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    DownloadError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
