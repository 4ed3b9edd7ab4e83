//! Configuration constants.
//!
//! This module defines the defaults used when a setting is not supplied,
//! along with the fixed parts of the InfluxDB write API.

use std::time::Duration;

/// Default interval between two timer-driven flushes.
///
/// Every sample accepted during one interval goes out in a single HTTP
/// request, so this bounds the request rate to one per interval.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Longest time `stop_writing` waits for the final flush to be delivered.
///
/// This is a bound, not a sleep: the wait returns as soon as every in-flight
/// delivery has completed.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Per-request timeout for the write endpoint in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Number of leading characters of a credential shown in logs.
/// Everything after the prefix is masked with `*`.
pub const CREDENTIAL_VISIBLE_PREFIX: usize = 4;

/// Maximum length of a server error body quoted in a failure report (chars)
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;

/// Measurement name of the point written by the startup connection test.
pub const CONNECTION_TEST_MEASUREMENT: &str = "writer_init";

// InfluxDB write API paths
/// InfluxDB 2.x write path
pub const WRITE_PATH_V2: &str = "/api/v2/write";
/// InfluxDB 1.x write path (also served by 2.x for compatibility)
pub const WRITE_PATH_V1: &str = "/write";

/// User-Agent sent with every write request.
pub const USER_AGENT: &str = concat!("influx_relay/", env!("CARGO_PKG_VERSION"));
