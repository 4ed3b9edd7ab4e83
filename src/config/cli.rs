//! Command-line options.
//!
//! Every option can also be supplied through an `INFLUX_*` environment
//! variable, which lets `.env` files carry the credentials.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::config::types::{ApiVersion, Config, EndpointConfig, LogFormat, LogLevel};
use crate::point::Precision;

/// Relay line-protocol samples from stdin (or a file) to InfluxDB in batches.
#[derive(Debug, Clone, Parser)]
#[command(name = "influx_relay", version, about)]
pub struct Opt {
    /// File to read lines from (`-` for stdin)
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Base URL of the InfluxDB server
    #[arg(long, env = "INFLUX_HOST_URL")]
    pub host_url: String,

    /// Organization to write into
    #[arg(long, env = "INFLUX_ORG")]
    pub org: String,

    /// Bucket to write into (database name for --api v1)
    #[arg(long, env = "INFLUX_BUCKET")]
    pub bucket: String,

    /// API token
    #[arg(long, env = "INFLUX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Username for the v1 API
    #[arg(long, env = "INFLUX_USERNAME")]
    pub username: Option<String>,

    /// Password for the v1 API
    #[arg(long, env = "INFLUX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Write API shape
    #[arg(long, value_enum, default_value_t = ApiVersion::V2, env = "INFLUX_API")]
    pub api: ApiVersion,

    /// Timestamp precision of written points
    #[arg(long, value_enum, default_value_t = Precision::Milliseconds, env = "INFLUX_PRECISION")]
    pub precision: Precision,

    /// Seconds between flushes
    #[arg(long, default_value_t = 10, env = "INFLUX_INTERVAL_SECS")]
    pub interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "INFLUX_TIMEOUT_SECS")]
    pub timeout_seconds: u64,

    /// Do not log failed deliveries
    #[arg(long, env = "INFLUX_SUPPRESS_RESPONSE_ERRORS")]
    pub suppress_response_errors: bool,

    /// Leave the individual lines out of failure reports
    #[arg(long)]
    pub no_log_failed_lines: bool,

    /// Skip the startup test write
    #[arg(long)]
    pub skip_connection_test: bool,

    /// Start with writing disabled (lines are buffered until the final flush)
    #[arg(long)]
    pub disabled: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        let endpoint = EndpointConfig {
            host_url: opt.host_url,
            organization: opt.org,
            bucket: opt.bucket,
            auth_token: opt.token,
            username: opt.username,
            password: opt.password,
            suppress_response_errors: opt.suppress_response_errors,
            log_failed_lines: !opt.no_log_failed_lines,
            api: opt.api,
            precision: opt.precision,
            request_timeout: Duration::from_secs(opt.timeout_seconds),
        };

        Config {
            input: opt.input,
            log_level: opt.log_level,
            log_format: opt.log_format,
            endpoint,
            flush_interval: Duration::from_secs(opt.interval_secs.max(1)),
            enabled: !opt.disabled,
            connection_test: !opt.skip_connection_test,
            ..Default::default()
        }
    }
}
