//! Error type definitions.
//!
//! This module defines the error types used throughout the crate, grouped by
//! the layer that reports them.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The write client was built outside of a Tokio runtime.
    #[error("Runtime error: a Tokio runtime is required to drive the flush timer")]
    RuntimeError,
}

/// Endpoint configuration errors.
///
/// These are fatal: the request is not attempted and nothing is retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is empty.
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    /// The host URL does not parse.
    #[error("Invalid host URL {url:?}: {source}")]
    InvalidHostUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The host URL is not http or https.
    #[error("Unsupported host URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
}

/// A point that cannot be rendered as a line-protocol line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("measurement name is empty")]
    EmptyMeasurement,

    #[error("tag key is empty")]
    EmptyTagKey,

    #[error("tag {0:?} has an empty value")]
    EmptyTagValue(String),

    #[error("field key is empty")]
    EmptyFieldKey,

    #[error("field {0:?} is not a finite number")]
    NonFiniteFloat(String),

    #[error("{0:?} contains a line break")]
    LineBreak(String),

    #[error("{0:?} has a backslash that would escape the next separator")]
    DanglingBackslash(String),

    #[error("measurement {0:?} starts with '#' and would be read as a comment")]
    CommentMeasurement(String),

    #[error("timestamp does not fit the requested precision")]
    TimestampOutOfRange,
}

/// Caller contract violations on the producer-facing API.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("line is empty")]
    EmptyLine,

    #[error("line contains a line break; queue each line separately")]
    MultiLine,

    #[error("invalid point: {0}")]
    InvalidPoint(#[from] EncodeError),
}

/// Errors a sink returns to its caller.
///
/// Transient failures (network, non-2xx) are not errors at this level: they
/// are reported as [`crate::SendOutcome::Dropped`].
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// A direct write was attempted while writing is disabled.
    #[error("Writing is not enabled")]
    NotRunning,
}

/// Why a batch could not be delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The server answered with a non-2xx status.
    #[error("{status}: {reason:?}")]
    Status {
        status: u16,
        reason: String,
        body: Option<String>,
    },

    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The host could not be reached.
    #[error("could not connect: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The sink was closed while the request was in flight.
    #[error("request cancelled")]
    Cancelled,
}

impl DeliveryFailure {
    /// Maps a transport-level `reqwest::Error` onto a failure kind.
    ///
    /// The request URL is dropped from the message since it may carry
    /// credentials.
    pub fn from_reqwest(error: ReqwestError) -> Self {
        let (timeout, connect) = (error.is_timeout(), error.is_connect());
        let message = error.without_url().to_string();
        if timeout {
            DeliveryFailure::Timeout(message)
        } else if connect {
            DeliveryFailure::Connect(message)
        } else {
            DeliveryFailure::Transport(message)
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome of one flush cycle, as counted by [`crate::DeliveryStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum BatchOutcome {
    /// The server accepted the batch.
    Delivered,
    /// The batch was lost to a transport failure or a non-2xx response.
    Dropped,
    /// The batch was empty; no request was made.
    Skipped,
    /// The batch was not attempted because the endpoint is misconfigured.
    Rejected,
}

impl std::fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOutcome::Delivered => "delivered",
            BatchOutcome::Dropped => "dropped",
            BatchOutcome::Skipped => "skipped",
            BatchOutcome::Rejected => "rejected",
        }
    }
}
