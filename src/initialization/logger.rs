//! Logger initialization.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` in either plain (colored) or JSON format. `level`
/// applies to this crate and everything else, with the HTTP stack capped at
/// `info`. Directives in `RUST_LOG` are applied last and win, so
/// `RUST_LOG=reqwest=debug` still works for digging into the HTTP layer.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Trace every batch body
/// influx_relay --log-level trace --host-url http://localhost:8086 --org o --bucket b
///
/// # Machine-readable output
/// influx_relay --log-format json ...
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::new();
    apply_filters(&mut builder, level, std::env::var("RUST_LOG").ok().as_deref());

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init: tests may install a logger more than once
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Default filters first, then any `RUST_LOG` directives on top.
fn apply_filters(builder: &mut env_logger::Builder, level: LevelFilter, env: Option<&str>) {
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("influx_relay", level);

    if let Some(directives) = env.filter(|d| !d.trim().is_empty()) {
        builder.parse_filters(directives);
    }
}
