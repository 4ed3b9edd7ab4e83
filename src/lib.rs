//! influx_relay library: batched line-protocol writes to InfluxDB
//!
//! This library ships metric samples produced at any rate, from any thread,
//! to InfluxDB over HTTP while bounding the number of requests it makes:
//!
//! - [`Point`] and [`line_protocol::encode`] render samples in the InfluxDB
//!   line protocol
//! - [`ThrottleBuffer`] batches arbitrary items on a fixed interval
//! - [`WriteSink`] / [`HttpWriteSink`] deliver one batch per request
//! - [`WriteClient`] ties them together and is what producers talk to
//! - [`run_relay`] feeds a client from stdin or a file (the binary's job)
//!
//! Failed batches are logged (with the token redacted) and dropped. Nothing
//! is retried or persisted.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use influx_relay::{EndpointConfig, HttpWriteSink, Point, WriteClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = EndpointConfig::new("http://localhost:8086", "acme", "telemetry")
//!     .with_token("secret-token");
//! let sink = Arc::new(HttpWriteSink::new(endpoint)?);
//! let client = WriteClient::new(sink, Duration::from_secs(10))?;
//!
//! client.start_writing();
//! client.write(Point::now("requests").tag("route", "/").field("count", 1))?;
//!
//! client.shutdown().await;
//! println!("{} lines delivered", client.stats().lines_delivered());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. The flush timer and every send run
//! on the runtime the client was created on.

#![warn(missing_docs)]

mod client;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod line_protocol;
mod point;
mod relay;
mod sink;
mod throttle;
pub mod utils;

// Re-export public API
pub use client::{Record, WriteClient};
pub use config::{ApiVersion, Config, EndpointConfig, LogFormat, LogLevel};
pub use error_handling::{
    BatchOutcome, ConfigError, DeliveryError, DeliveryFailure, DeliveryStats, EncodeError,
    InitializationError, QueueError,
};
pub use point::{FieldValue, Point, Precision};
pub use relay::{print_delivery_statistics, run_relay, RelayReport};
pub use sink::{authenticate, failure_report, write_url, HttpWriteSink, SendOutcome, WriteSink};
pub use throttle::{Batch, FlushCallback, FlushHandle, ThrottleBuffer};
