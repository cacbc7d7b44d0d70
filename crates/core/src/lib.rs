// Simple Queue Core - bounded task queue with a fixed worker pool
// NO binary-only dependencies (CLI, subscribers) in this crate

pub mod config;
pub mod error;
pub mod handler;
pub mod queue;
mod stats;
pub(crate) mod worker;

pub use config::QueueConfig;
pub use error::{QueueError, Result, TryEnqueueError};
pub use handler::{handler_fn, AsyncHandler, TaskHandler};
pub use queue::{QueueState, TaskQueue};
pub use stats::StatsSnapshot;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
