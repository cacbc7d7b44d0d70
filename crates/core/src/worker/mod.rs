// Worker - Item processing loop

pub mod constants;
mod panic_guard;
mod shutdown;

pub use panic_guard::{execute_guarded, HandlerOutcome};
pub use shutdown::{drain_channel, DrainNotifier, DrainWatcher};

use crate::handler::TaskHandler;
use crate::stats::QueueStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Receiving half of the buffer, shared by every worker of a queue
pub(crate) type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Worker drains items from a queue buffer until it is closed and empty
pub(crate) struct Worker<T: Send + 'static> {
    id: usize,
    queue: Arc<str>,
    receiver: SharedReceiver<T>,
    handler: Arc<dyn TaskHandler<T>>,
    interval: Duration,
    stats: Arc<QueueStats>,
}

impl<T: Send + 'static> Worker<T> {
    pub(crate) fn new(
        id: usize,
        queue: Arc<str>,
        receiver: SharedReceiver<T>,
        handler: Arc<dyn TaskHandler<T>>,
        interval: Duration,
        stats: Arc<QueueStats>,
    ) -> Self {
        Self {
            id,
            queue,
            receiver,
            handler,
            interval,
            stats,
        }
    }

    /// Run the drain loop; returns once the buffer is closed and empty
    pub(crate) async fn run(self) {
        debug!(queue = %self.queue, worker_id = self.id, "Worker started");
        let mut handled: u64 = 0;

        while let Some(item) = self.next_item().await {
            self.process(item).await;
            handled += 1;

            if !self.interval.is_zero() {
                sleep(self.interval).await;
            }
        }

        debug!(
            queue = %self.queue,
            worker_id = self.id,
            handled,
            "Worker drained and exited"
        );
    }

    /// `None` means the buffer is closed and drained
    async fn next_item(&self) -> Option<T> {
        let mut rx = self.receiver.lock().await;
        rx.recv().await
    }

    async fn process(&self, item: T) {
        let handler = Arc::clone(&self.handler);
        match execute_guarded(async move { handler.handle(item).await }).await {
            HandlerOutcome::Completed => self.stats.record_processed(),
            HandlerOutcome::Panicked(msg) => {
                self.stats.record_panicked();
                warn!(
                    queue = %self.queue,
                    worker_id = self.id,
                    panic_msg = %msg,
                    "Item handler panicked, worker continues"
                );
            }
            HandlerOutcome::Cancelled => {
                warn!(queue = %self.queue, worker_id = self.id, "Item handler cancelled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn collecting_worker(
        rx: mpsc::Receiver<u32>,
        interval: Duration,
    ) -> (Worker<u32>, Arc<StdMutex<Vec<u32>>>, Arc<QueueStats>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn TaskHandler<u32>> = Arc::new(move |n: u32| {
            if n == 13 {
                panic!("unlucky item");
            }
            sink.lock().unwrap().push(n);
        });
        let stats = Arc::new(QueueStats::default());
        let worker = Worker::new(
            0,
            Arc::from("test"),
            Arc::new(Mutex::new(rx)),
            handler,
            interval,
            Arc::clone(&stats),
        );
        (worker, seen, stats)
    }

    #[tokio::test]
    async fn test_worker_drains_closed_buffer_in_order() {
        let (tx, rx) = mpsc::channel(8);
        for n in 1..=5 {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        let (worker, seen, stats) = collecting_worker(rx, Duration::ZERO);
        worker.run().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(stats.snapshot().processed, 5);
    }

    #[tokio::test]
    async fn test_worker_survives_handler_panic() {
        let (tx, rx) = mpsc::channel(8);
        for n in [12, 13, 14] {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        let (worker, seen, stats) = collecting_worker(rx, Duration::ZERO);
        worker.run().await;

        assert_eq!(*seen.lock().unwrap(), vec![12, 14]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.panicked, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_paces_between_items() {
        let (tx, rx) = mpsc::channel(8);
        for n in 1..=3 {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        let (worker, _seen, _stats) = collecting_worker(rx, Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        worker.run().await;

        // One pause after each of the three items
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
