// Queue Configuration

use crate::error::{QueueError, Result};
use crate::worker::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_QUEUE_NAME, DEFAULT_WORKER_COUNT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue configuration
///
/// `interval` is the pause each worker takes after handling an item
/// (zero disables pacing). Serialized as whole milliseconds under
/// `interval_ms`; set it in code for sub-millisecond pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    pub buffer_size: usize,
    pub worker_count: usize,
    #[serde(rename = "interval_ms", with = "duration_millis")]
    pub interval: Duration,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, buffer_size: usize, worker_count: usize) -> Self {
        Self {
            name: name.into(),
            buffer_size,
            worker_count,
            interval: Duration::ZERO,
        }
    }

    /// Set the per-item pacing delay
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reject configurations that could never process an item
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::Config("queue name cannot be empty".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(QueueError::Config(format!(
                "buffer_size must be positive (queue: {})",
                self.name
            )));
        }
        if self.worker_count == 0 {
            return Err(QueueError::Config(format!(
                "worker_count must be positive (queue: {})",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME, DEFAULT_BUFFER_SIZE, DEFAULT_WORKER_COUNT)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_config_is_valid() {
        let config = QueueConfig::default();
        assert_ok!(config.validate());
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.interval(), Duration::ZERO);
    }

    #[test]
    fn test_validate_zero_buffer() {
        let err = assert_err!(QueueConfig::new("q", 0, 1).validate());
        assert!(err.to_string().contains("buffer_size"));
    }

    #[test]
    fn test_validate_zero_workers() {
        let err = assert_err!(QueueConfig::new("q", 4, 0).validate());
        assert!(err.to_string().contains("worker_count"));
    }

    #[test]
    fn test_validate_empty_name() {
        let err = assert_err!(QueueConfig::new("  ", 4, 1).validate());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_with_interval_keeps_sub_millisecond_precision() {
        let config = QueueConfig::new("q", 1, 1).with_interval(Duration::from_micros(500));
        assert_eq!(config.interval(), Duration::from_micros(500));

        let config = config.with_interval(Duration::from_micros(1500));
        assert_eq!(config.interval(), Duration::from_micros(1500));
    }

    #[test]
    fn test_interval_serializes_as_millis() {
        let config = QueueConfig::new("q", 1, 1).with_interval(Duration::from_secs(2));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["interval_ms"], 2000);
    }

    #[test]
    fn test_deserialize_partial_config_uses_defaults() {
        let config: QueueConfig =
            serde_json::from_str(r#"{"name": "emails", "interval_ms": 250}"#).unwrap();
        assert_eq!(config.name, "emails");
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(config.interval(), Duration::from_millis(250));
    }
}
