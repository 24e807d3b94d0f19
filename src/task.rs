//! Handles to running worker tasks (the cancel/inspect points for a consumer)

use crate::error::{Error, Result};
use crate::types::TaskKind;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a spawned download or extraction task
///
/// Dropping the handle does not stop the task; call [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct TaskHandle {
    kind: TaskKind,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(kind: TaskKind, cancel: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            kind,
            cancel,
            handle,
        }
    }

    /// What this task does
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Ask the task to stop at its next chunk (download) or entry (extraction) boundary
    pub fn cancel(&self) {
        tracing::debug!(kind = %self.kind, "cancellation requested");
        self.cancel.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the task has run to its end
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to end
    ///
    /// Worker faults are reported through notifications, not here; an error means the task
    /// itself panicked or was aborted by the runtime.
    pub async fn join(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| Error::TaskFailed(format!("{} task: {}", self.kind, e)))
    }
}
