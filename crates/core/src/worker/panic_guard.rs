// Panic isolation for worker safety
use std::any::Any;
use std::future::Future;
use tracing::error;

use super::constants::UNKNOWN_PANIC_MESSAGE;

/// Result of a panic-guarded handler invocation
#[derive(Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Handler returned normally
    Completed,
    /// Handler panicked
    Panicked(String),
    /// Handler task was cancelled (runtime shutting down)
    Cancelled,
}

/// Run a handler future with panic isolation
///
/// The future runs in its own task so a panic unwinds that task only and is
/// reported through the `JoinError` instead of killing the worker.
pub async fn execute_guarded<F>(future: F) -> HandlerOutcome
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(()) => HandlerOutcome::Completed,
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = panic_message(join_err.into_panic());
            error!(panic_msg = %panic_msg, "Handler panicked");
            HandlerOutcome::Panicked(panic_msg)
        }
        Err(join_err) => {
            error!(error = ?join_err, "Handler task cancelled");
            HandlerOutcome::Cancelled
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC_MESSAGE.to_string()
    }
}
