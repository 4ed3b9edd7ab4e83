//! Drained batches and the handle to their delivery.

use std::ops::Deref;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Every item accepted since the previous drain, in acceptance order.
///
/// A batch is produced once per flush cycle and is read-only after that:
/// it can be viewed as a slice or consumed by value, never appended to.
#[derive(Debug)]
pub struct Batch<T> {
    items: Vec<T>,
}

impl<T> Batch<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Batch { items }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for Batch<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for Batch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Completion handle for the delivery started by one flush.
///
/// Dropping the handle detaches the delivery; it still runs to completion.
#[derive(Debug)]
pub struct FlushHandle {
    task: JoinHandle<()>,
    batch_len: usize,
}

impl FlushHandle {
    pub(crate) fn new(task: JoinHandle<()>, batch_len: usize) -> Self {
        FlushHandle { task, batch_len }
    }

    /// Number of items in the drained batch.
    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the delivery to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            log::error!("Flush delivery task failed: {}", e);
        }
    }

    /// Waits for the delivery to finish, for at most `timeout`.
    ///
    /// Returns `false` if the delivery was still running when the timeout
    /// elapsed. The delivery is not cancelled in that case.
    pub async fn wait(self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.join()).await.is_ok()
    }
}
