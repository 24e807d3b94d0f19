//! Observer side of the pipeline: applies notifications to a display
//!
//! The front-end implements [`DisplaySink`]; [`Observer`] owns it and decides what each
//! notification means for the display (progress, enabling extraction, the result text).

use crate::downloader::DownUnzip;
use crate::notify::Notifications;
use crate::task::TaskHandle;
use crate::types::{Event, ResultNotification};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result text shown after a successful extraction
pub const EXTRACTION_SUCCEEDED: &str = "Extraction succeeded";

/// Result text shown after a failed extraction
pub const EXTRACTION_FAILED: &str = "Extraction failed";

/// Display surface driven by the observer
pub trait DisplaySink {
    /// Progress bar value; `None` means indeterminate
    fn set_progress(&mut self, percentage: Option<u8>);

    /// Name of the file being downloaded
    fn set_file_name(&mut self, file_name: &str);

    /// Where the file is being written
    fn set_destination_path(&mut self, path: &Path);

    /// Whether the "extract" action is available
    fn set_extract_enabled(&mut self, enabled: bool);

    /// Result line
    fn set_result_text(&mut self, text: &str);
}

/// Drains notifications on the caller's task and applies them to a [`DisplaySink`]
pub struct Observer<S> {
    sink: S,
    ready_archive: Option<PathBuf>,
}

impl<S: DisplaySink> Observer<S> {
    /// Wrap a display sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            ready_archive: None,
        }
    }

    /// The wrapped sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Give the sink back
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Archive that finished downloading and can be extracted, if any
    pub fn ready_archive(&self) -> Option<&Path> {
        self.ready_archive.as_deref()
    }

    /// Apply one notification
    ///
    /// Returns the archive path the first time a download reaches 100%, which is the moment
    /// extraction becomes available.
    pub fn handle(&mut self, event: &Event) -> Option<PathBuf> {
        match event {
            Event::Progress(progress) => {
                self.sink.set_progress(progress.percentage);
                self.sink.set_file_name(&progress.file_name);
                self.sink.set_destination_path(&progress.destination_path);

                if progress.is_complete() {
                    if self.ready_archive.as_deref() != Some(progress.destination_path.as_path()) {
                        debug!(archive = %progress.destination_path.display(), "download complete, extraction enabled");
                        self.ready_archive = Some(progress.destination_path.clone());
                        self.sink.set_extract_enabled(true);
                        return Some(progress.destination_path.clone());
                    }
                } else if self.ready_archive.take().is_some() {
                    self.sink.set_extract_enabled(false);
                }
                None
            }
            Event::Extraction(result) => {
                let text = if result.outcome.is_success() {
                    EXTRACTION_SUCCEEDED
                } else {
                    EXTRACTION_FAILED
                };
                self.sink.set_result_text(text);
                None
            }
            Event::DownloadFailed { error, .. } => {
                self.ready_archive = None;
                self.sink.set_extract_enabled(false);
                self.sink.set_result_text(&format!("Download failed: {}", error));
                None
            }
        }
    }

    /// Apply notifications until every sender is gone, then return the sink
    pub async fn run(mut self, mut notifications: Notifications) -> S {
        while let Some(event) = notifications.recv().await {
            self.handle(&event);
        }
        self.sink
    }

    /// Apply notifications and start extraction as soon as a download completes
    ///
    /// Returns once the extraction result arrives (`Some`), or on a `DownloadFailed`
    /// notification or a closed channel (`None`).
    ///
    /// `pipeline` holds a sender, so the channel cannot close while this runs. A failed
    /// download only ends the loop when `report_failures` is enabled; with the default config
    /// a 404 or a dropped connection leaves this waiting. Enable `report_failures` or wrap the
    /// call in `tokio::time::timeout`.
    pub async fn run_until_extracted(
        mut self,
        notifications: &mut Notifications,
        pipeline: &DownUnzip,
    ) -> (S, Option<ResultNotification>) {
        let mut extraction: Option<TaskHandle> = None;

        while let Some(event) = notifications.recv().await {
            if let Some(archive) = self.handle(&event)
                && extraction.is_none()
            {
                info!(archive = %archive.display(), "starting extraction");
                extraction = Some(pipeline.start_extraction(archive));
            }

            match event {
                Event::Extraction(result) => return (self.sink, Some(result)),
                Event::DownloadFailed { .. } => return (self.sink, None),
                Event::Progress(_) => {}
            }
        }
        (self.sink, None)
    }
}
