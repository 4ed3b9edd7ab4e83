//! Batch delivery.
//!
//! A [`WriteSink`] takes one batch of already-encoded lines and delivers it in
//! at most one request. [`HttpWriteSink`] is the InfluxDB implementation.
//!
//! Delivery policy:
//! - an empty batch is skipped without a request
//! - an invalid endpoint configuration is an error returned to the caller
//! - a transport failure or non-2xx response is logged (unless suppressed)
//!   and the batch is dropped; nothing is retried or requeued

mod endpoint;
mod http;
mod report;

pub use endpoint::{authenticate, write_url};
pub use http::HttpWriteSink;
pub use report::failure_report;

use async_trait::async_trait;

use crate::error_handling::{BatchOutcome, DeliveryError, DeliveryFailure};
use crate::point::Precision;

/// What happened to a batch handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The batch was empty; no request was made.
    Skipped,
    /// The server accepted every line.
    Delivered { lines: usize },
    /// The batch was lost. It has already been logged (unless suppressed).
    Dropped {
        lines: usize,
        failure: DeliveryFailure,
    },
}

impl SendOutcome {
    pub fn batch_outcome(&self) -> BatchOutcome {
        match self {
            SendOutcome::Skipped => BatchOutcome::Skipped,
            SendOutcome::Delivered { .. } => BatchOutcome::Delivered,
            SendOutcome::Dropped { .. } => BatchOutcome::Dropped,
        }
    }

    /// Number of lines the outcome applies to.
    pub fn lines(&self) -> usize {
        match self {
            SendOutcome::Skipped => 0,
            SendOutcome::Delivered { lines } | SendOutcome::Dropped { lines, .. } => *lines,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered { .. })
    }
}

/// Delivers batches of line-protocol lines.
#[async_trait]
pub trait WriteSink: Send + Sync {
    /// Delivers `lines` in a single request.
    ///
    /// # Errors
    ///
    /// Only for problems retrying cannot fix, such as a missing bucket.
    /// Delivery failures are reported as [`SendOutcome::Dropped`].
    async fn send(&self, lines: &[String]) -> Result<SendOutcome, DeliveryError>;

    /// Timestamp precision the sink tells the server to expect.
    fn precision(&self) -> Precision {
        Precision::Milliseconds
    }

    /// Aborts in-flight requests and refuses new ones.
    fn close(&self) {}
}
