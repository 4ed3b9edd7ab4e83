//! Producer-facing write client.
//!
//! [`WriteClient`] is the one object application code talks to. It owns a
//! [`ThrottleBuffer`] of [`Record`]s and hands every drained batch to a
//! [`WriteSink`]:
//!
//! ```text
//! queue/write -> buffer.add -> (tick | flush) -> encode -> sink.send
//! ```
//!
//! Producers only ever see contract violations on their own input. Delivery
//! problems are logged and counted in [`DeliveryStats`], never returned to
//! the producing thread.

mod record;

pub use record::Record;

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::runtime::Handle;

use crate::config::STOP_GRACE_PERIOD;
use crate::error_handling::{
    BatchOutcome, DeliveryError, DeliveryStats, InitializationError, QueueError,
};
use crate::line_protocol;
use crate::point::Point;
use crate::sink::{SendOutcome, WriteSink};
use crate::throttle::{Batch, FlushHandle, ThrottleBuffer};

use record::encode_records;

/// Buffers lines and points and ships them to a sink on a fixed interval.
///
/// The client starts out stopped. Items queued while stopped are kept and go
/// out on the first tick after [`start_writing`](Self::start_writing), or on
/// an explicit [`flush`](Self::flush).
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use influx_relay::{EndpointConfig, HttpWriteSink, Point, WriteClient};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = EndpointConfig::new("http://localhost:8086", "my-org", "telemetry")
///     .with_token("my-token");
/// let sink = Arc::new(HttpWriteSink::new(config)?);
/// let client = WriteClient::new(sink, Duration::from_secs(10))?;
///
/// client.start_writing();
/// client.write(Point::now("cpu").tag("host", "a").field("load", 0.5))?;
/// client.queue("cpu,host=b load=0.25")?;
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct WriteClient {
    buffer: ThrottleBuffer<Record>,
    sink: Arc<dyn WriteSink>,
    stats: Arc<DeliveryStats>,
    stop_grace_period: Duration,
}

impl WriteClient {
    /// Creates a stopped client on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::RuntimeError` when called outside a runtime.
    pub fn new(sink: Arc<dyn WriteSink>, interval: Duration) -> Result<Self, InitializationError> {
        Self::with_grace_period(sink, interval, STOP_GRACE_PERIOD)
    }

    /// Like [`new`](Self::new), with a custom bound on how long
    /// [`stop_writing`](Self::stop_writing) waits for in-flight sends.
    pub fn with_grace_period(
        sink: Arc<dyn WriteSink>,
        interval: Duration,
        stop_grace_period: Duration,
    ) -> Result<Self, InitializationError> {
        let runtime = Handle::try_current().map_err(|_| InitializationError::RuntimeError)?;
        Ok(Self::with_runtime(sink, interval, stop_grace_period, runtime))
    }

    /// Creates a stopped client whose timer and sends run on `runtime`.
    pub fn with_runtime(
        sink: Arc<dyn WriteSink>,
        interval: Duration,
        stop_grace_period: Duration,
        runtime: Handle,
    ) -> Self {
        let stats = Arc::new(DeliveryStats::new());
        let on_flush = {
            let sink = Arc::clone(&sink);
            let stats = Arc::clone(&stats);
            move |batch: Batch<Record>| deliver(Arc::clone(&sink), Arc::clone(&stats), batch)
        };

        WriteClient {
            buffer: ThrottleBuffer::new(interval, runtime, on_flush),
            sink,
            stats,
            stop_grace_period,
        }
    }

    /// Queues one pre-encoded line-protocol line.
    ///
    /// Trailing line endings are stripped. The line itself is not
    /// parsed; the server reports malformed lines when the batch is sent.
    ///
    /// # Errors
    ///
    /// - `QueueError::EmptyLine` for an empty or whitespace-only line
    /// - `QueueError::MultiLine` if the line contains a line break
    pub fn queue(&self, line: impl Into<String>) -> Result<(), QueueError> {
        let mut line = line.into();
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);

        if line.trim().is_empty() {
            return Err(QueueError::EmptyLine);
        }
        if line.contains(['\n', '\r']) {
            return Err(QueueError::MultiLine);
        }

        self.buffer.add(Record::Line(line));
        Ok(())
    }

    /// Queues one point. It is encoded when its batch is flushed.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidPoint` if the point could never be encoded.
    pub fn write(&self, point: Point) -> Result<(), QueueError> {
        point.validate()?;
        self.buffer.add(Record::Point(point));
        Ok(())
    }

    /// Queues several points so that they land in the same batch.
    ///
    /// Nothing is queued if any point is invalid.
    pub fn write_all<I>(&self, points: I) -> Result<(), QueueError>
    where
        I: IntoIterator<Item = Point>,
    {
        let points: Vec<Point> = points.into_iter().collect();
        for point in &points {
            point.validate()?;
        }
        self.buffer.add_all(points.into_iter().map(Record::Point));
        Ok(())
    }

    /// Sends one point immediately in its own request, bypassing the buffer.
    ///
    /// # Errors
    ///
    /// - `DeliveryError::NotRunning` while writing is stopped
    /// - `DeliveryError::Encode` if the point cannot be encoded
    /// - `DeliveryError::Config` if the endpoint is misconfigured
    pub async fn send_now(&self, point: Point) -> Result<SendOutcome, DeliveryError> {
        if !self.is_running() {
            return Err(DeliveryError::NotRunning);
        }

        let line = line_protocol::encode(&point, self.sink.precision())?;
        let outcome = self.sink.send(&[line]).await?;
        self.stats.record(outcome.batch_outcome(), outcome.lines());
        Ok(outcome)
    }

    /// Starts the flush timer. Returns `false` if it was already running.
    pub fn start_writing(&self) -> bool {
        if self.buffer.start() {
            log::debug!("Started writing every {:?}", self.buffer.interval());
            true
        } else {
            log::warn!("Aborted starting; already started");
            false
        }
    }

    /// Stops the flush timer and ships whatever is pending.
    ///
    /// Waits for the final send, and any send still in flight, for at most
    /// the grace period. Returns `false` without flushing if writing was not
    /// running.
    pub async fn stop_writing(&self) -> bool {
        if !self.buffer.stop() {
            log::warn!("Aborted stopping; not running");
            return false;
        }

        let handle = self.buffer.flush();
        log::debug!("Stopped writing; flushed {} items", handle.batch_len());

        if !self.buffer.wait_idle(self.stop_grace_period).await {
            log::warn!(
                "{} sends still in flight {:?} after stopping",
                self.buffer.in_flight(),
                self.stop_grace_period
            );
        }
        true
    }

    /// Starts or stops writing to match `enabled`.
    pub async fn set_running(&self, enabled: bool) -> bool {
        if enabled {
            self.start_writing()
        } else {
            self.stop_writing().await
        }
    }

    /// Ships everything pending now, whether or not writing is running.
    pub fn flush(&self) -> FlushHandle {
        self.buffer.flush()
    }

    /// Stops writing, flushes once more, waits for in-flight sends within the
    /// grace period, then closes the sink.
    pub async fn shutdown(&self) {
        self.buffer.stop();
        let handle = self.buffer.flush();
        log::debug!("Shutting down; flushed {} items", handle.batch_len());

        if !self.buffer.wait_idle(self.stop_grace_period).await {
            log::warn!(
                "Cancelling {} sends still in flight at shutdown",
                self.buffer.in_flight()
            );
        }
        self.sink.close();
    }

    pub fn is_running(&self) -> bool {
        self.buffer.is_running()
    }

    /// Number of items waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.buffer.pending_len()
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    pub fn sink(&self) -> &Arc<dyn WriteSink> {
        &self.sink
    }
}

/// Flush callback: encodes the batch and returns its send.
fn deliver(
    sink: Arc<dyn WriteSink>,
    stats: Arc<DeliveryStats>,
    batch: Batch<Record>,
) -> BoxFuture<'static, ()> {
    if batch.is_empty() {
        stats.record(BatchOutcome::Skipped, 0);
        return future::ready(()).boxed();
    }

    let (lines, rejected) = encode_records(batch, sink.precision());
    if rejected > 0 {
        stats.record_rejected_points(rejected);
    }

    async move {
        match sink.send(&lines).await {
            Ok(outcome) => stats.record(outcome.batch_outcome(), outcome.lines()),
            Err(e) => {
                log::error!("Failed to deliver {} lines: {}", lines.len(), e);
                stats.record(BatchOutcome::Rejected, lines.len());
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ConfigError, DeliveryFailure, EncodeError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink that records every batch it is given.
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<String>>>,
        delay: Option<Duration>,
        closed: std::sync::atomic::AtomicBool,
    }

    impl RecordingSink {
        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WriteSink for RecordingSink {
        async fn send(&self, lines: &[String]) -> Result<SendOutcome, DeliveryError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.batches.lock().unwrap().push(lines.to_vec());
            Ok(SendOutcome::Delivered { lines: lines.len() })
        }

        fn close(&self) {
            self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    /// Sink whose endpoint always answers 500.
    struct FailingSink;

    #[async_trait]
    impl WriteSink for FailingSink {
        async fn send(&self, lines: &[String]) -> Result<SendOutcome, DeliveryError> {
            Ok(SendOutcome::Dropped {
                lines: lines.len(),
                failure: DeliveryFailure::Status {
                    status: 500,
                    reason: "Internal Server Error".to_string(),
                    body: None,
                },
            })
        }
    }

    /// Sink with a missing bucket.
    struct MisconfiguredSink;

    #[async_trait]
    impl WriteSink for MisconfiguredSink {
        async fn send(&self, _lines: &[String]) -> Result<SendOutcome, DeliveryError> {
            Err(ConfigError::MissingField("bucket").into())
        }
    }

    const LONG: Duration = Duration::from_secs(3600);

    fn client_with(sink: Arc<RecordingSink>) -> WriteClient {
        WriteClient::new(sink, LONG).unwrap()
    }

    #[tokio::test]
    async fn test_queue_rejects_empty_and_multi_line_input() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        assert!(matches!(client.queue(""), Err(QueueError::EmptyLine)));
        assert!(matches!(client.queue("   \n"), Err(QueueError::EmptyLine)));
        assert!(matches!(
            client.queue("a x=1i\nb x=2i"),
            Err(QueueError::MultiLine)
        ));
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_queue_strips_trailing_line_ending() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        client.queue("cpu load=1i\r\n").unwrap();
        client.flush().join().await;

        assert_eq!(sink.batches(), vec![vec!["cpu load=1i".to_string()]]);
    }

    #[tokio::test]
    async fn test_invalid_point_is_refused_at_the_call_site() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        let result = client.write(Point::measurement("").field("x", 1));
        assert!(matches!(result, Err(QueueError::InvalidPoint(_))));

        let result = client.write(Point::measurement("m").tag("path", r"C:\").field("x", 1));
        assert!(matches!(
            result,
            Err(QueueError::InvalidPoint(EncodeError::DanglingBackslash(_)))
        ));

        let result = client.write_all(vec![
            Point::measurement("ok").field("x", 1),
            Point::measurement("bad").field("x", f64::NAN),
        ]);
        assert!(result.is_err());
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_lines_and_points_share_one_batch() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        client.queue("raw x=1i").unwrap();
        client
            .write(Point::measurement("measurement").tag("a", "b").field("x", 1))
            .unwrap();
        client.flush().join().await;

        assert_eq!(
            sink.batches(),
            vec![vec![
                "raw x=1i".to_string(),
                "measurement,a=b x=1i".to_string()
            ]]
        );
        assert_eq!(client.stats().lines_delivered(), 2);
    }

    #[tokio::test]
    async fn test_empty_flush_does_not_send() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        client.flush().join().await;

        assert!(sink.batches().is_empty());
        assert_eq!(client.stats().batch_count(BatchOutcome::Skipped), 1);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        assert!(!client.stop_writing().await);
        assert!(client.start_writing());
        assert!(!client.start_writing());
        assert!(client.is_running());
        assert!(client.stop_writing().await);
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_stop_writing_twice_sends_once() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        client.start_writing();
        client.queue("a x=1i").unwrap();

        assert!(client.stop_writing().await);
        assert!(!client.stop_writing().await);

        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_writing_waits_for_the_final_send() {
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let client = client_with(Arc::clone(&sink));

        client.start_writing();
        client.queue("a x=1i").unwrap();
        client.stop_writing().await;

        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_writing_gives_up_after_grace_period() {
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let client = WriteClient::with_grace_period(
            sink.clone() as Arc<dyn WriteSink>,
            LONG,
            Duration::from_millis(20),
        )
        .unwrap();

        client.start_writing();
        client.queue("a x=1i").unwrap();

        let started = std::time::Instant::now();
        assert!(client.stop_writing().await);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn test_timer_ships_while_running() {
        let sink = Arc::new(RecordingSink::default());
        let client = WriteClient::new(
            sink.clone() as Arc<dyn WriteSink>,
            Duration::from_millis(20),
        )
        .unwrap();

        client.queue("a x=1i").unwrap();
        client.start_writing();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(sink.batches(), vec![vec!["a x=1i".to_string()]]);
        client.stop_writing().await;
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_affect_producers() {
        let client = WriteClient::new(Arc::new(FailingSink), LONG).unwrap();

        client.queue("a x=1i").unwrap();
        client.flush().join().await;
        client.queue("b x=1i").unwrap();

        assert_eq!(client.stats().batch_count(BatchOutcome::Dropped), 1);
        assert_eq!(client.stats().lines_dropped(), 1);
        assert_eq!(client.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_sink_error_is_logged_not_propagated() {
        let client = WriteClient::new(Arc::new(MisconfiguredSink), LONG).unwrap();

        client.queue("a x=1i").unwrap();
        client.flush().join().await;

        assert_eq!(client.stats().batch_count(BatchOutcome::Rejected), 1);
        assert!(client.queue("b x=1i").is_ok());
    }

    #[tokio::test]
    async fn test_send_now_requires_running() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));
        let point = Point::measurement("m").field("x", 1);

        let result = client.send_now(point.clone()).await;
        assert!(matches!(result, Err(DeliveryError::NotRunning)));

        client.start_writing();
        let outcome = client.send_now(point).await.unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(sink.batches(), vec![vec!["m x=1i".to_string()]]);
        client.stop_writing().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_closes_sink() {
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(Arc::clone(&sink));

        client.queue("queued_while_stopped x=1i").unwrap();
        client.shutdown().await;

        assert_eq!(sink.batches().len(), 1);
        assert!(sink.closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = WriteClient::new(Arc::new(FailingSink), LONG);
        assert!(matches!(result, Err(InitializationError::RuntimeError)));
    }
}
