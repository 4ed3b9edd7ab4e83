//! Configuration types.
//!
//! This module defines the endpoint configuration used by the HTTP sink and
//! the library-level `Config` consumed by the binary. Neither type depends on
//! the CLI parser.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use url::Url;

use crate::config::constants::{
    CREDENTIAL_VISIBLE_PREFIX, DEFAULT_FLUSH_INTERVAL, DEFAULT_REQUEST_TIMEOUT_SECS,
    STOP_GRACE_PERIOD,
};
use crate::error_handling::ConfigError;
use crate::point::Precision;
use crate::utils::redact::hide_credential;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Shape of the write API exposed by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ApiVersion {
    /// `POST /api/v2/write?org=..&bucket=..&precision=..`
    #[default]
    V2,
    /// `POST /write?db=..&precision=..` (InfluxDB 1.8 compatibility API)
    V1,
}

/// Connection settings for the write endpoint.
///
/// Host URL, organization and bucket are required; they are checked by
/// [`EndpointConfig::validate`] before every request rather than at
/// construction, so the settings can be filled in after the sink exists.
///
/// The `Debug` and `Display` output never contain the full token or password.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Base URL of the server, e.g. `http://localhost:8086`
    pub host_url: String,

    /// Organization name (v2 API)
    pub organization: String,

    /// Bucket name; used as the database name on the v1 API
    pub bucket: String,

    /// API token sent as `Authorization: Token ..` when present
    pub auth_token: Option<String>,

    /// Username for basic auth on the v1 API
    pub username: Option<String>,

    /// Password for basic auth on the v1 API
    pub password: Option<String>,

    /// Do not log failed deliveries
    pub suppress_response_errors: bool,

    /// Include every line of a failed batch in the failure report
    pub log_failed_lines: bool,

    /// Which write API shape to target
    pub api: ApiVersion,

    /// Timestamp precision advertised to the server
    pub precision: Precision,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host_url: String::new(),
            organization: String::new(),
            bucket: String::new(),
            auth_token: None,
            username: None,
            password: None,
            suppress_response_errors: false,
            log_failed_lines: true,
            api: ApiVersion::V2,
            precision: Precision::Milliseconds,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl EndpointConfig {
    /// Creates a configuration with the three required settings.
    pub fn new(
        host_url: impl Into<String>,
        organization: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            host_url: host_url.into(),
            organization: organization.into(),
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Sets the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Checks that host URL, organization and bucket are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` naming the first empty setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("host_url", &self.host_url)?;
        require_non_empty("organization", &self.organization)?;
        require_non_empty("bucket", &self.bucket)?;
        Ok(())
    }

    /// Returns the token when one is configured and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns the token with everything past the visible prefix masked.
    pub fn redacted_token(&self) -> Option<String> {
        self.token()
            .map(|t| hide_credential(t, CREDENTIAL_VISIBLE_PREFIX))
    }

    /// Returns the host URL with any `user:password@` part removed.
    ///
    /// A host that does not parse is returned as written.
    pub fn redacted_host_url(&self) -> String {
        match Url::parse(self.host_url.trim()) {
            Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
                // Only fails for URLs that cannot carry credentials at all
                let _ = url.set_password(None);
                let _ = url.set_username("");
                url.to_string()
            }
            _ => self.host_url.clone(),
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field));
    }
    Ok(())
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host_url", &self.redacted_host_url())
            .field("organization", &self.organization)
            .field("bucket", &self.bucket)
            .field("auth_token", &self.redacted_token())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("suppress_response_errors", &self.suppress_response_errors)
            .field("log_failed_lines", &self.log_failed_lines)
            .field("api", &self.api)
            .field("precision", &self.precision)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Host URL: {}", self.redacted_host_url())?;
        writeln!(f, "Bucket: {}", self.bucket)?;
        writeln!(f, "Organization: {}", self.organization)?;
        if let Some(token) = self.redacted_token() {
            writeln!(f, "Authentication Token: {}", token)?;
        }
        Ok(())
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use influx_relay::{Config, EndpointConfig};
/// use std::time::Duration;
///
/// let config = Config {
///     endpoint: EndpointConfig::new("http://localhost:8086", "my-org", "metrics"),
///     flush_interval: Duration::from_secs(5),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Where relayed lines are read from (`-` for stdin)
    pub input: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Write endpoint settings
    pub endpoint: EndpointConfig,

    /// Interval between timer-driven flushes
    pub flush_interval: Duration,

    /// Upper bound on the wait for in-flight deliveries when writing stops
    pub stop_grace_period: Duration,

    /// Start writing immediately
    pub enabled: bool,

    /// Write a test point directly before relaying starts
    pub connection_test: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("-"),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            endpoint: EndpointConfig::default(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            stop_grace_period: STOP_GRACE_PERIOD,
            enabled: true,
            connection_test: true,
        }
    }
}
