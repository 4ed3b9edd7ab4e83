//! Timestamp precision.

use chrono::{DateTime, Utc};
use clap::ValueEnum;

/// Unit of the integer timestamp written at the end of a line.
///
/// The same value must be used to encode points and to build the write URL,
/// otherwise the server misreads every timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Precision {
    #[value(name = "s")]
    Seconds,
    #[default]
    #[value(name = "ms")]
    Milliseconds,
    #[value(name = "us")]
    Microseconds,
    #[value(name = "ns")]
    Nanoseconds,
}

impl Precision {
    /// Value of the `precision` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Seconds => "s",
            Precision::Milliseconds => "ms",
            Precision::Microseconds => "us",
            Precision::Nanoseconds => "ns",
        }
    }

    /// Converts `time` to an integer count of this unit since the Unix epoch.
    ///
    /// Returns `None` only for nanoseconds outside roughly 1677..2262.
    pub fn timestamp(&self, time: &DateTime<Utc>) -> Option<i64> {
        match self {
            Precision::Seconds => Some(time.timestamp()),
            Precision::Milliseconds => Some(time.timestamp_millis()),
            Precision::Microseconds => Some(time.timestamp_micros()),
            Precision::Nanoseconds => time.timestamp_nanos_opt(),
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
