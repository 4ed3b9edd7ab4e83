//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (intervals, timeouts, write paths)
//! - Endpoint and client configuration types
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::Opt;
pub use constants::*;
pub use types::{ApiVersion, Config, EndpointConfig, LogFormat, LogLevel};
