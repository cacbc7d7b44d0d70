// Central Error Type for the Queue

use std::time::Duration;
use thiserror::Error;

/// Queue-level error type
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Queue already started: {0}")]
    AlreadyStarted(String),

    #[error("Queue already stopped: {0}")]
    Stopped(String),

    #[error("No tokio runtime available to spawn workers for queue: {0}")]
    NoRuntime(String),

    #[error("Workers of queue {0} were torn down before the buffer drained")]
    Abandoned(String),

    #[error("Queue {queue} did not drain within {timeout:?}")]
    StopTimeout { queue: String, timeout: Duration },
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

/// Error returned by [`TaskQueue::try_enqueue`](crate::TaskQueue::try_enqueue).
///
/// The rejected item is always handed back to the caller.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TryEnqueueError<T> {
    #[error("queue buffer is full")]
    Full(T),

    #[error("queue is closed")]
    Closed(T),
}

impl<T> TryEnqueueError<T> {
    /// Recover the item that was not enqueued
    pub fn into_inner(self) -> T {
        match self {
            TryEnqueueError::Full(item) | TryEnqueueError::Closed(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TryEnqueueError::Full(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TryEnqueueError::Closed(_))
    }
}
