//! Archive extraction
//!
//! [`ZipExtractor`] does the blocking walk; [`Extractor`] runs it as a task and turns whatever
//! happened into exactly one [`ResultNotification`].

mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use self::zip::{ExtractionSummary, ZipExtractor};

use crate::config::Config;
use crate::error::Error;
use crate::notify::Notifier;
use crate::task::TaskHandle;
use crate::types::{Event, Outcome, ResultNotification, TaskKind};
use crate::utils::target_dir_for;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Extraction worker
#[derive(Clone)]
pub struct Extractor {
    config: Arc<Config>,
    notifier: Notifier,
}

impl Extractor {
    /// Create an extractor that reports to `notifier`
    pub fn new(config: Arc<Config>, notifier: Notifier) -> Self {
        Self { config, notifier }
    }

    /// Spawn an extraction task for `archive_path`
    ///
    /// The task emits one `Event::Extraction` when it ends, whether it succeeded, failed,
    /// was cancelled or panicked.
    pub fn start(&self, archive_path: impl Into<PathBuf>) -> TaskHandle {
        let archive_path = archive_path.into();
        let chunk_size = self.config.chunk_size();
        let notifier = self.notifier.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let result = extract_archive(archive_path, chunk_size, token).await;
            notifier.emit(Event::Extraction(result));
        });
        TaskHandle::new(TaskKind::Extraction, cancel, handle)
    }
}

/// Extract `archive_path` next to itself and describe the outcome
///
/// The target directory is the archive path with its extension stripped. Never fails: every
/// error ends up in the returned [`Outcome`].
pub async fn extract_archive(
    archive_path: PathBuf,
    chunk_size: usize,
    cancel: CancellationToken,
) -> ResultNotification {
    let target_dir = target_dir_for(&archive_path);
    info!(archive = %archive_path.display(), target = %target_dir.display(), "extraction started");

    let (archive, target) = (archive_path.clone(), target_dir.clone());
    let joined = tokio::task::spawn_blocking(move || {
        ZipExtractor::extract(&archive, &target, chunk_size, &cancel)
    })
    .await;

    let outcome = match joined {
        Ok(Ok(summary)) => Outcome::Success {
            files: summary.files.len(),
        },
        Ok(Err(e)) => {
            warn!(archive = %archive_path.display(), error = %e, "extraction failed");
            failure(&e)
        }
        Err(join_error) => {
            let e = Error::TaskFailed(format!("extraction worker: {}", join_error));
            error!(archive = %archive_path.display(), error = %e, "extraction worker died");
            failure(&e)
        }
    };

    ResultNotification {
        archive_path,
        target_dir,
        outcome,
    }
}

fn failure(e: &Error) -> Outcome {
    Outcome::Failure {
        code: e.error_code().to_string(),
        reason: e.to_string(),
    }
}
