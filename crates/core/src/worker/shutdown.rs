// Drain completion signal

use tokio::sync::watch;

/// Observes whether the worker pool has fully drained
#[derive(Clone)]
pub struct DrainWatcher {
    rx: watch::Receiver<bool>,
}

impl DrainWatcher {
    /// Check if every worker has exited
    pub fn is_drained(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until every worker has exited
    ///
    /// Returns immediately if the pool already drained. Returns `false` if
    /// the notifier was dropped without firing.
    pub async fn wait(&mut self) -> bool {
        self.rx.wait_for(|drained| *drained).await.is_ok()
    }
}

/// Drain notifier, fired once by the pool supervisor
pub struct DrainNotifier {
    tx: watch::Sender<bool>,
}

impl DrainNotifier {
    /// Signal that all workers have exited
    pub fn notify_drained(self) {
        let _ = self.tx.send(true);
    }
}

/// Create a drain channel
pub fn drain_channel() -> (DrainNotifier, DrainWatcher) {
    let (tx, rx) = watch::channel(false);
    (DrainNotifier { tx }, DrainWatcher { rx })
}
