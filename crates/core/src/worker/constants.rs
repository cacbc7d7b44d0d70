// Queue constants (no magic values)

/// Queue name used when none is configured
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Default buffer capacity (items)
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Default number of concurrent workers
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Panic message used when the payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
