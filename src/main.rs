//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `influx_relay` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use influx_relay::config::Opt;
use influx_relay::initialization::init_logger_with;
use influx_relay::{run_relay, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // so INFLUX_TOKEN does not have to be exported by hand.
    // Try the current directory first, then the executable's directory.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    // Parse command-line arguments into Config
    let config = Config::from(Opt::parse());

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_relay(config).await {
        Ok(report) => {
            println!(
                "Relayed {} line{} ({} delivered, {} dropped) in {:.1}s{}",
                report.lines_read,
                if report.lines_read == 1 { "" } else { "s" },
                report.lines_delivered,
                report.lines_dropped,
                report.elapsed_seconds,
                if report.interrupted { " (interrupted)" } else { "" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("influx_relay error: {:#}", e);
            process::exit(1);
        }
    }
}
