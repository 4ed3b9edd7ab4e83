//! Time-windowed batching.
//!
//! This module decouples the rate at which items are produced from the rate
//! at which they are delivered:
//! - producers call `add` from any thread without blocking
//! - a timer drains everything accepted so far once per interval
//! - each drained batch goes to one callback, whose delivery runs on the
//!   Tokio runtime and can be awaited through a [`FlushHandle`]
//!
//! The buffer knows nothing about what it holds; encoding and sending are
//! up to the callback.

mod batch;
mod buffer;

pub use batch::{Batch, FlushHandle};
pub use buffer::{FlushCallback, ThrottleBuffer};
