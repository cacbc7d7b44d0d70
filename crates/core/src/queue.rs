// Task Queue - bounded buffer, worker pool and graceful shutdown

use crate::config::QueueConfig;
use crate::error::{QueueError, Result, TryEnqueueError};
use crate::handler::TaskHandler;
use crate::stats::{QueueStats, StatsSnapshot};
use crate::worker::{drain_channel, DrainNotifier, DrainWatcher, SharedReceiver, Worker};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Lifecycle of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Constructed, workers not spawned yet
    Idle,
    /// Workers running, accepting items
    Running,
    /// Closed to new items, workers still draining
    Draining,
    /// Closed and every worker has exited
    Stopped,
}

/// Mutable lifecycle state. Guarded by one lock so the closed check and the
/// hand-out of a producer handle are atomic with respect to `stop`.
struct Gate<T> {
    sender: Option<mpsc::Sender<T>>,
    closed: bool,
    started: bool,
    pool: Option<WorkerPool>,
    notifier: Option<DrainNotifier>,
}

/// Running workers and the runtime they were spawned on
struct WorkerPool {
    runtime: Handle,
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Join every worker in a task on the pool's own runtime, then fire the
    /// drain signal. Dropping a `stop` future must never abort the workers,
    /// and `stop` may be awaited from outside that runtime.
    fn supervise(self, name: Arc<str>, notifier: DrainNotifier) {
        let WorkerPool {
            runtime,
            mut workers,
        } = self;
        runtime.spawn(async move {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    error!(queue = %name, error = ?e, "Worker task failed");
                }
            }
            info!(queue = %name, "Queue stopped, all workers exited");
            notifier.notify_drained();
        });
    }
}

struct Inner<T: Send + 'static> {
    config: QueueConfig,
    name: Arc<str>,
    handler: Arc<dyn TaskHandler<T>>,
    receiver: SharedReceiver<T>,
    gate: Mutex<Gate<T>>,
    drained: DrainWatcher,
    stats: Arc<QueueStats>,
}

/// Bounded in-process task queue with a fixed worker pool
///
/// Clones share the same queue, so one handle can be given to every
/// producer. Items accepted before [`stop`](Self::stop) are always handed to
/// the handler before `stop` returns.
///
/// ```no_run
/// # async fn demo() -> simple_queue_core::Result<()> {
/// use simple_queue_core::TaskQueue;
/// use std::time::Duration;
///
/// let queue = TaskQueue::new(10, 2, Duration::ZERO, |msg: String| {
///     println!("Processing: {msg}");
/// })?;
/// queue.start()?;
/// queue.enqueue("Message #1".to_string()).await;
/// queue.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct TaskQueue<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> TaskQueue<T> {
    /// Create a queue named after the default queue name
    pub fn new<H>(
        buffer_size: usize,
        worker_count: usize,
        interval: Duration,
        handler: H,
    ) -> Result<Self>
    where
        H: TaskHandler<T>,
    {
        let config = QueueConfig {
            buffer_size,
            worker_count,
            ..QueueConfig::default()
        }
        .with_interval(interval);
        Self::with_config(config, handler)
    }

    /// Create a queue from a full configuration
    pub fn with_config<H>(config: QueueConfig, handler: H) -> Result<Self>
    where
        H: TaskHandler<T>,
    {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.buffer_size);
        let (notifier, drained) = drain_channel();
        let name: Arc<str> = Arc::from(config.name.as_str());

        debug!(
            queue = %name,
            buffer_size = config.buffer_size,
            worker_count = config.worker_count,
            interval = ?config.interval,
            "Queue created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                handler: Arc::new(handler),
                receiver: Arc::new(tokio::sync::Mutex::new(rx)),
                gate: Mutex::new(Gate {
                    sender: Some(tx),
                    closed: false,
                    started: false,
                    pool: None,
                    notifier: Some(notifier),
                }),
                drained,
                stats: Arc::new(QueueStats::default()),
                config,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Spawn the worker pool on the current tokio runtime
    ///
    /// # Errors
    /// - `AlreadyStarted` on a second call
    /// - `Stopped` once `stop` has been called
    /// - `NoRuntime` outside a tokio runtime
    pub fn start(&self) -> Result<()> {
        let mut gate = self.lock_gate();
        if gate.closed {
            warn!(queue = %self.inner.name, "start called on a stopped queue");
            return Err(QueueError::Stopped(self.inner.name.to_string()));
        }
        if gate.started {
            warn!(queue = %self.inner.name, "start called twice");
            return Err(QueueError::AlreadyStarted(self.inner.name.to_string()));
        }
        let handle = Handle::try_current()
            .map_err(|_| QueueError::NoRuntime(self.inner.name.to_string()))?;

        gate.pool = Some(self.spawn_pool(handle));
        gate.started = true;

        info!(
            queue = %self.inner.name,
            workers = self.inner.config.worker_count,
            "Queue started"
        );
        Ok(())
    }

    /// Add an item, waiting for buffer space if the buffer is full
    ///
    /// Returns `false` without touching the buffer once the queue is closed.
    /// A producer that passed the closed check keeps the buffer open for its
    /// own push, so an item accepted here is drained even if `stop` runs
    /// while this call is still waiting for space.
    pub async fn enqueue(&self, item: T) -> bool {
        let Some(sender) = self.producer() else {
            return false;
        };
        match sender.send(item).await {
            Ok(()) => {
                self.inner.stats.record_accepted();
                true
            }
            Err(_) => self.reject(),
        }
    }

    /// Add an item without waiting; the item is handed back on failure
    pub fn try_enqueue(&self, item: T) -> std::result::Result<(), TryEnqueueError<T>> {
        let Some(sender) = self.producer() else {
            return Err(TryEnqueueError::Closed(item));
        };
        match sender.try_send(item) {
            Ok(()) => {
                self.inner.stats.record_accepted();
                Ok(())
            }
            Err(TrySendError::Full(item)) => Err(TryEnqueueError::Full(item)),
            Err(TrySendError::Closed(item)) => {
                self.reject();
                Err(TryEnqueueError::Closed(item))
            }
        }
    }

    /// Blocking variant of [`enqueue`](Self::enqueue) for producers on plain
    /// threads
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_enqueue(&self, item: T) -> bool {
        let Some(sender) = self.producer() else {
            return false;
        };
        match sender.blocking_send(item) {
            Ok(()) => {
                self.inner.stats.record_accepted();
                true
            }
            Err(_) => self.reject(),
        }
    }

    /// Close the queue and wait until every buffered item has been handled
    ///
    /// Idempotent: only the first call closes the buffer. Every call returns
    /// once all workers have exited. The returned future may be awaited on
    /// any executor once the queue has been started.
    ///
    /// # Errors
    /// - `NoRuntime` if the queue was never started and no tokio runtime is
    ///   available to drain it; the queue is left open
    /// - `Abandoned` if the runtime running the workers shut down first
    pub async fn stop(&self) -> Result<()> {
        self.close()?;
        let mut drained = self.inner.drained.clone();
        if drained.wait().await {
            Ok(())
        } else {
            error!(queue = %self.inner.name, "Workers torn down before the buffer drained");
            Err(QueueError::Abandoned(self.inner.name.to_string()))
        }
    }

    /// Like [`stop`](Self::stop), but give up waiting after `timeout`
    ///
    /// Draining carries on in the background after a timeout; a later `stop`
    /// waits for it to finish.
    pub async fn stop_timeout(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.stop()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(queue = %self.inner.name, ?timeout, "Queue did not drain in time");
                Err(QueueError::StopTimeout {
                    queue: self.inner.name.to_string(),
                    timeout,
                })
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock_gate().closed
    }

    pub fn state(&self) -> QueueState {
        let gate = self.lock_gate();
        match (gate.started, gate.closed) {
            (_, true) if self.inner.drained.is_drained() => QueueState::Stopped,
            (_, true) => QueueState::Draining,
            (true, false) => QueueState::Running,
            (false, false) => QueueState::Idle,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Producer handle, or `None` once closed
    fn producer(&self) -> Option<mpsc::Sender<T>> {
        let gate = self.lock_gate();
        if gate.closed {
            drop(gate);
            self.reject();
            return None;
        }
        gate.sender.clone()
    }

    fn reject(&self) -> bool {
        self.inner.stats.record_rejected();
        debug!(queue = %self.inner.name, "Enqueue rejected: queue closed");
        false
    }

    /// Close transition; hands the worker pool to a supervisor on first call
    fn close(&self) -> Result<()> {
        let mut gate = self.lock_gate();
        if gate.closed {
            return Ok(());
        }

        if !gate.started {
            // Items buffered before start still have to reach the handler
            let handle = Handle::try_current().map_err(|_| {
                warn!(queue = %self.inner.name, "stop called before start outside a runtime");
                QueueError::NoRuntime(self.inner.name.to_string())
            })?;
            warn!(queue = %self.inner.name, "stop called before start, draining buffer");
            gate.pool = Some(self.spawn_pool(handle));
            gate.started = true;
        }

        gate.closed = true;
        gate.sender = None;
        info!(queue = %self.inner.name, "Queue closed, draining buffer");

        // A started, not yet closed queue always holds both
        if let (Some(pool), Some(notifier)) = (gate.pool.take(), gate.notifier.take()) {
            pool.supervise(Arc::clone(&self.inner.name), notifier);
        }
        Ok(())
    }

    fn spawn_pool(&self, runtime: Handle) -> WorkerPool {
        let mut workers = JoinSet::new();
        for id in 0..self.inner.config.worker_count {
            let worker = Worker::new(
                id,
                Arc::clone(&self.inner.name),
                Arc::clone(&self.inner.receiver),
                Arc::clone(&self.inner.handler),
                self.inner.config.interval(),
                Arc::clone(&self.inner.stats),
            );
            workers.spawn_on(worker.run(), &runtime);
        }
        WorkerPool { runtime, workers }
    }

    fn lock_gate(&self) -> MutexGuard<'_, Gate<T>> {
        self.inner
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
