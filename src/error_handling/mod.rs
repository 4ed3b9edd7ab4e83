//! Error handling and delivery statistics.
//!
//! This module provides:
//! - Error type definitions for each layer (initialization, configuration,
//!   encoding, queueing, delivery)
//! - Classification of transport failures
//! - Delivery statistics tracking
//!
//! Errors fall into four groups:
//! - **Contract violations** (`QueueError`, `EncodeError`): returned at the call site
//! - **Configuration errors** (`ConfigError`): fatal at first use, never retried
//! - **Delivery failures** (`DeliveryFailure`): logged and dropped
//! - **Lifecycle misuse**: not an error; logged as a warning

mod stats;
mod types;

// Re-export public API
pub use stats::DeliveryStats;
pub use types::{
    BatchOutcome, ConfigError, DeliveryError, DeliveryFailure, EncodeError, InitializationError,
    QueueError,
};
