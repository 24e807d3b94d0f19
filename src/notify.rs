//! Ordered notification channel from the worker tasks to a single observer.
//!
//! The channel is an unbounded tokio mpsc queue: emission never blocks a worker, delivery is
//! FIFO, and each event is received exactly once. There is no backpressure; a slow observer
//! simply lets events queue up.

use crate::types::Event;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Create a connected notifier/receiver pair
pub fn channel() -> (Notifier, Notifications) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, Notifications { rx })
}

/// Sending half, shared by the downloader and the extractor
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Event>,
}

impl Notifier {
    /// Queue an event for the observer
    ///
    /// If the observer already dropped its receiver the event is discarded; workers keep
    /// running whether or not anyone is listening.
    pub fn emit(&self, event: Event) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            tracing::trace!(?event, "no observer attached, dropping notification");
        }
    }

    /// Whether the observer dropped its receiver
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the observer
#[derive(Debug)]
pub struct Notifications {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Notifications {
    /// Wait for the next event; `None` once every notifier is gone
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued right now
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl futures::Stream for Notifications {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}
