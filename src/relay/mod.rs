//! Line relay: reads line-protocol input and feeds it to a write client.

mod statistics;

pub use statistics::print_delivery_statistics;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::client::WriteClient;
use crate::config::Config;
use crate::error_handling::BatchOutcome;
use crate::sink::{HttpWriteSink, SendOutcome};

/// Results of a relay run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReport {
    /// Non-blank, non-comment lines read from the input
    pub lines_read: usize,
    /// Lines refused by the client (e.g. embedded carriage returns)
    pub lines_rejected: usize,
    /// Lines the server accepted
    pub lines_delivered: usize,
    /// Lines lost to failed or rejected batches
    pub lines_dropped: usize,
    /// Requests that succeeded
    pub batches_delivered: usize,
    /// Requests that failed
    pub batches_dropped: usize,
    /// Whether the run was cut short by Ctrl-C
    pub interrupted: bool,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

/// Relays every line of `config.input` to the configured endpoint.
///
/// Blank lines and lines starting with `#` are skipped. The run ends at end
/// of input or on Ctrl-C; either way pending lines are flushed once more
/// before returning.
///
/// # Errors
///
/// This function will return an error if:
/// - The input file cannot be opened
/// - The HTTP client cannot be built
/// - The startup test write finds the endpoint misconfigured
///
/// # Example
///
/// ```no_run
/// use influx_relay::{run_relay, Config, EndpointConfig};
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config {
///     input: PathBuf::from("samples.lp"),
///     endpoint: EndpointConfig::new("http://localhost:8086", "acme", "metrics"),
///     ..Default::default()
/// };
/// let report = run_relay(config).await?;
/// println!("{} lines delivered", report.lines_delivered);
/// # Ok(())
/// # }
/// ```
pub async fn run_relay(config: Config) -> Result<RelayReport> {
    let start = Instant::now();

    let sink = Arc::new(
        HttpWriteSink::new(config.endpoint.clone())
            .context("Failed to initialize HTTP client")?,
    );
    debug!("Endpoint configuration:\n{}", config.endpoint);

    if config.connection_test {
        match sink
            .check_connection()
            .await
            .context("Endpoint configuration is invalid")?
        {
            SendOutcome::Delivered { .. } => {
                info!("Connected to {}", config.endpoint.redacted_host_url())
            }
            SendOutcome::Dropped { failure, .. } => {
                warn!(
                    "Test write to {} failed ({}); relaying anyway",
                    config.endpoint.redacted_host_url(), failure
                )
            }
            SendOutcome::Skipped => {}
        }
    }

    let client = WriteClient::with_grace_period(
        sink.clone(),
        config.flush_interval,
        config.stop_grace_period,
    )
    .context("Failed to create write client")?;

    if config.enabled {
        client.start_writing();
    } else {
        info!("Writing disabled; lines are held until the final flush");
    }

    let mut lines = open_input(&config.input).await?.lines();
    let mut lines_read = 0usize;
    let mut lines_rejected = 0usize;
    let mut interrupted = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let line = tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted; flushing pending lines");
                interrupted = true;
                break;
            }
            line = lines.next_line() => line.context("Failed to read input")?,
        };

        let Some(line) = line else {
            break;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        lines_read += 1;
        if let Err(e) = client.queue(trimmed) {
            warn!("Skipping input line {}: {}", lines_read, e);
            lines_rejected += 1;
        }
    }

    debug!("Input finished after {} lines", lines_read);
    client.shutdown().await;

    let stats = client.stats();
    print_delivery_statistics(stats);

    Ok(RelayReport {
        lines_read,
        lines_rejected,
        lines_delivered: stats.lines_delivered(),
        lines_dropped: stats.lines_dropped(),
        batches_delivered: stats.batch_count(BatchOutcome::Delivered),
        batches_dropped: stats.batch_count(BatchOutcome::Dropped)
            + stats.batch_count(BatchOutcome::Rejected),
        interrupted,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    })
}

async fn open_input(path: &Path) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path.as_os_str() == "-" {
        info!("Reading lines from stdin");
        Ok(Box::new(BufReader::new(tokio::io::stdin())))
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        info!("Reading lines from {}", path.display());
        Ok(Box::new(BufReader::new(file)))
    }
}
