//! Delivery of notices to an external sink.
//!
//! Rendering a notice (a desktop toast, a tray balloon, a log line) can be slow
//! and may block on the OS. The session never calls the sink itself: notices go
//! through a bounded [`NoticeDispatcher`] queue drained by one worker task, and
//! the worker runs each delivery on the blocking pool.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::logging::targets;
use crate::protocol::Notice;

/// Error reported by a [`NotificationSink`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("notification error: {message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Create a sink error with a description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Consumer of decoded notices.
///
/// Called from the blocking pool, one notice at a time. Failures are logged by
/// the dispatcher and never reach the session.
pub trait NotificationSink: Send + Sync + 'static {
    /// Show or record one notice.
    fn notify(&self, title: &str, message: &str) -> Result<(), SinkError>;
}

impl<F> NotificationSink for F
where
    F: Fn(&str, &str) -> Result<(), SinkError> + Send + Sync + 'static,
{
    fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        self(title, message)
    }
}

/// A sink that writes notices to the log at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        info!(target: targets::DISPATCH, %title, %message, "notice");
        Ok(())
    }
}

/// Why a notice was not queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The queue is at capacity; the notice was dropped.
    #[error("notice queue full, dropped notice '{}'", .0.title)]
    Full(Notice),
    /// The worker has stopped.
    #[error("notice worker stopped, dropped notice '{}'", .0.title)]
    Closed(Notice),
}

/// Bounded queue feeding a [`NotificationSink`] from a dedicated worker task.
///
/// The worker lives until every `NoticeDispatcher` clone is dropped, then
/// drains whatever is still queued and exits. It is not cancelled together
/// with the session that feeds it.
#[derive(Clone)]
pub struct NoticeDispatcher {
    tx: mpsc::Sender<Notice>,
}

impl NoticeDispatcher {
    /// Spawn the worker on the current Tokio runtime.
    ///
    /// A `capacity` of zero is raised to one.
    pub fn spawn(sink: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notice>(capacity.max(1));

        tokio::spawn(async move {
            debug!(target: targets::DISPATCH, "notice worker started");
            while let Some(notice) = rx.recv().await {
                let sink = sink.clone();
                let title = notice.title.clone();
                let delivery =
                    tokio::task::spawn_blocking(move || sink.notify(&notice.title, &notice.message))
                        .await;
                match delivery {
                    Ok(Ok(())) => {
                        debug!(target: targets::DISPATCH, %title, "notice delivered");
                    }
                    Ok(Err(e)) => {
                        warn!(target: targets::DISPATCH, %title, error = %e, "sink rejected notice");
                    }
                    Err(e) => {
                        error!(target: targets::DISPATCH, %title, error = %e, "sink panicked");
                    }
                }
            }
            debug!(target: targets::DISPATCH, "notice worker finished");
        });

        Self { tx }
    }

    /// Queue a notice without waiting.
    ///
    /// # Errors
    ///
    /// Returns the notice back inside [`DispatchError`] when the queue is full
    /// or the worker is gone.
    pub fn try_dispatch(&self, notice: Notice) -> Result<(), DispatchError> {
        self.tx.try_send(notice).map_err(|e| match e {
            mpsc::error::TrySendError::Full(n) => DispatchError::Full(n),
            mpsc::error::TrySendError::Closed(n) => DispatchError::Closed(n),
        })
    }

    /// Number of free slots in the queue.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }
}

impl fmt::Debug for NoticeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeDispatcher")
            .field("remaining_capacity", &self.remaining_capacity())
            .finish()
    }
}
