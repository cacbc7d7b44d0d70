// Task Handler Port
// Abstraction for the per-item work supplied by the embedding program

use async_trait::async_trait;
use std::future::Future;

/// Task Handler trait
///
/// Implementations:
/// - any `Fn(T)` closure (synchronous work)
/// - [`AsyncHandler`] built with [`handler_fn`] (asynchronous work)
/// - user types implementing the trait directly
///
/// The queue awaits `handle` inside the worker that dequeued the item. A
/// panic is caught and logged by the queue; any other error handling is the
/// implementation's business.
#[async_trait]
pub trait TaskHandler<T: Send + 'static>: Send + Sync + 'static {
    /// Process one item
    async fn handle(&self, item: T);
}

#[async_trait]
impl<T, F> TaskHandler<T> for F
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    async fn handle(&self, item: T) {
        self(item)
    }
}

/// Adapter turning an async closure into a [`TaskHandler`]
pub struct AsyncHandler<F> {
    f: F,
}

/// Wrap an async closure (`|item| async move { ... }`) as a handler
pub fn handler_fn<F>(f: F) -> AsyncHandler<F> {
    AsyncHandler { f }
}

#[async_trait]
impl<T, F, Fut> TaskHandler<T> for AsyncHandler<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, item: T) {
        (self.f)(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_closure_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler = move |n: usize| {
            counter.fetch_add(n, Ordering::SeqCst);
        };

        handler.handle(3).await;
        handler.handle(4).await;
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_async_handler_through_trait_object() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler: Arc<dyn TaskHandler<String>> = Arc::new(handler_fn(move |msg: String| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::task::yield_now().await;
                counter.fetch_add(msg.len(), Ordering::SeqCst);
            }
        }));

        handler.handle("hello".to_string()).await;
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }
}
