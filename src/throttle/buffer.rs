//! Time-windowed batching buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::batch::{Batch, FlushHandle};

/// Consumer of drained batches.
///
/// Called synchronously during the drain with the batch; the returned future
/// is the delivery, spawned on the runtime so that neither the timer nor the
/// flushing caller waits on it.
pub type FlushCallback<T> = dyn Fn(Batch<T>) -> BoxFuture<'static, ()> + Send + Sync;

/// Thread-safe accumulator that hands its contents to a callback on a fixed
/// interval or on demand.
///
/// - [`add`](Self::add) takes a short lock and never performs I/O. Items are
///   accepted whether or not the buffer is running; items added while stopped
///   wait for the first tick after the next [`start`](Self::start), or for an
///   explicit [`flush`](Self::flush).
/// - [`start`](Self::start) / [`stop`](Self::stop) arm and disarm the timer
///   and report `false` when there was nothing to do.
/// - Drains are serialized and swap the whole pending list at once, so every
///   item lands in exactly one batch.
pub struct ThrottleBuffer<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    interval: Duration,
    runtime: Handle,
    pending: Mutex<Vec<T>>,
    drain_lock: Mutex<()>,
    // Some(token) while running
    timer: Mutex<Option<CancellationToken>>,
    deliveries: TaskTracker,
    on_flush: Box<FlushCallback<T>>,
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> ThrottleBuffer<T> {
    /// Creates a stopped buffer.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between timer-driven flushes while running
    /// * `runtime` - Runtime that runs the timer and the deliveries
    /// * `on_flush` - Receives each drained batch, including empty ones
    pub fn new<F>(interval: Duration, runtime: Handle, on_flush: F) -> Self
    where
        F: Fn(Batch<T>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let deliveries = TaskTracker::new();
        // A closed tracker still accepts tasks; `wait` then means "idle".
        deliveries.close();

        ThrottleBuffer {
            shared: Arc::new(Shared {
                interval,
                runtime,
                pending: Mutex::new(Vec::new()),
                drain_lock: Mutex::new(()),
                timer: Mutex::new(None),
                deliveries,
                on_flush: Box::new(on_flush),
            }),
        }
    }

    /// Appends an item to the pending list.
    pub fn add(&self, item: T) {
        lock(&self.shared.pending).push(item);
    }

    /// Appends several items under one lock; they stay contiguous in the batch.
    pub fn add_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        lock(&self.shared.pending).extend(items);
    }

    /// Arms the periodic timer.
    ///
    /// Returns `false` without doing anything if the buffer is already running.
    pub fn start(&self) -> bool {
        let mut timer = lock(&self.shared.timer);
        if timer.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        self.shared.runtime.spawn(run_timer(
            Arc::downgrade(&self.shared),
            token.clone(),
            self.shared.interval,
        ));
        *timer = Some(token);
        true
    }

    /// Disarms the periodic timer. Pending items stay pending.
    ///
    /// Returns `false` without doing anything if the buffer is not running.
    /// Once this returns, no timer-driven drain begins; one that had already
    /// begun completes and its delivery is tracked like any other.
    pub fn stop(&self) -> bool {
        match lock(&self.shared.timer).take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drains the pending list and hands it to the callback, running or not.
    ///
    /// The drain is complete when this returns; the delivery may still be in
    /// flight and can be awaited through the returned handle.
    pub fn flush(&self) -> FlushHandle {
        self.shared.drain()
    }

    /// Waits until no delivery is in flight, for at most `timeout`.
    ///
    /// Returns `false` if deliveries were still running at the timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.shared.deliveries.wait())
            .await
            .is_ok()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.timer).is_some()
    }

    /// Number of items waiting for the next drain.
    pub fn pending_len(&self) -> usize {
        lock(&self.shared.pending).len()
    }

    /// Number of deliveries that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.shared.deliveries.len()
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }
}

impl<T> Drop for ThrottleBuffer<T> {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.shared.timer).take() {
            token.cancel();
        }
    }
}

impl<T: Send + 'static> Shared<T> {
    fn drain(&self) -> FlushHandle {
        let _serial = lock(&self.drain_lock);
        self.swap_and_deliver()
    }

    /// Timer variant of `drain`: skips the drain if `token` was cancelled
    /// before the drain lock was acquired.
    fn drain_unless_cancelled(&self, token: &CancellationToken) {
        let _serial = lock(&self.drain_lock);
        if token.is_cancelled() {
            return;
        }
        let _ = self.swap_and_deliver();
    }

    // caller holds drain_lock
    fn swap_and_deliver(&self) -> FlushHandle {
        let items = std::mem::take(&mut *lock(&self.pending));
        let batch_len = items.len();
        log::trace!("Draining {} pending items", batch_len);

        let delivery = (self.on_flush)(Batch::new(items));
        let task = self.deliveries.spawn_on(delivery, &self.runtime);
        FlushHandle::new(task, batch_len)
    }
}

async fn run_timer<T: Send + 'static>(
    shared: Weak<Shared<T>>,
    token: CancellationToken,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.drain_unless_cancelled(&token);
            }
        }
    }

    log::debug!("Flush timer stopped");
}
