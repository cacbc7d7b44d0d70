//! Simple Queue - Demo Entry Point
//! Runs a TaskQueue with a logging handler, feeds it messages, drains on Ctrl+C

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use simple_queue_core::{QueueConfig, TaskQueue};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "simple_queue=info";

#[derive(Parser, Debug)]
#[command(name = "simple-queue")]
#[command(about = "Bounded task queue demo with graceful shutdown", long_about = None)]
#[command(version)]
struct Args {
    /// Queue name used in log output
    #[arg(long, env = "SIMPLE_QUEUE_NAME", default_value = "default")]
    name: String,

    /// Buffer capacity
    #[arg(long, env = "SIMPLE_QUEUE_BUFFER_SIZE", default_value = "10")]
    buffer_size: usize,

    /// Number of concurrent workers
    #[arg(long, env = "SIMPLE_QUEUE_WORKERS", default_value = "2")]
    workers: usize,

    /// Pause each worker takes after an item (0 = no pacing)
    #[arg(long, env = "SIMPLE_QUEUE_INTERVAL_MS", default_value = "1000")]
    interval_ms: u64,

    /// Number of simulated messages to send
    #[arg(long, env = "SIMPLE_QUEUE_MESSAGES", default_value = "5")]
    messages: usize,

    /// Delay between simulated sends
    #[arg(long, env = "SIMPLE_QUEUE_SEND_INTERVAL_MS", default_value = "300")]
    send_interval_ms: u64,

    /// Give up waiting for drain after this many seconds (0 = wait forever)
    #[arg(long, env = "SIMPLE_QUEUE_SHUTDOWN_TIMEOUT_SECS", default_value = "0")]
    shutdown_timeout_secs: u64,
}

impl Args {
    fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.name.clone(), self.buffer_size, self.workers)
            .with_interval(Duration::from_millis(self.interval_ms))
    }
}

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("SIMPLE_QUEUE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize logging
    init_logging()?;
    info!(
        "Simple Queue v{} (core v{}) starting...",
        VERSION,
        simple_queue_core::VERSION
    );

    // 2. Build the queue
    let config = args.queue_config();
    let queue = TaskQueue::with_config(config, |msg: String| {
        info!("Processing: {}", msg);
    })
    .context("Invalid queue configuration")?;
    queue.start()?;

    info!("System running... (Ctrl+C to stop)");

    // 3. Simulate a producer
    let producer_queue = queue.clone();
    let messages = args.messages;
    let send_interval = Duration::from_millis(args.send_interval_ms);
    let producer = tokio::spawn(async move {
        for i in 1..=messages {
            let msg = format!("Message #{}", i);
            if producer_queue.enqueue(msg.clone()).await {
                info!(" -> Enqueued: {}", msg);
            } else {
                warn!("Queue closed, dropped: {}", msg);
            }
            tokio::time::sleep(send_interval).await;
        }
    });

    // 4. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Stopping system...");
    producer.abort();

    // 5. Graceful shutdown
    if args.shutdown_timeout_secs > 0 {
        let timeout = Duration::from_secs(args.shutdown_timeout_secs);
        if let Err(e) = queue.stop_timeout(timeout).await {
            warn!(error = %e, "Exiting before the queue fully drained");
        }
    } else {
        queue.stop().await?;
    }

    let stats = serde_json::to_string(&queue.stats())?;
    info!(stats = %stats, "System stopped.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_match_demo_setup() {
        let args = Args::parse_from(["simple-queue"]);
        let config = args.queue_config();
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(args.messages, 5);
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from([
            "simple-queue",
            "--workers",
            "4",
            "--interval-ms",
            "0",
            "--name",
            "emails",
        ]);
        let config = args.queue_config();
        assert_eq!(config.name, "emails");
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.interval(), Duration::ZERO);
    }
}
