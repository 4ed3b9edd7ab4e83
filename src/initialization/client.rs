//! HTTP client initialization.

use reqwest::ClientBuilder;

use crate::config::USER_AGENT;

/// Initializes the HTTP client used by the write sink.
///
/// Creates a `reqwest::Client` with:
/// - the crate's User-Agent
/// - pooled keep-alive connections, so one connection serves every flush
///
/// Timeouts are not set here: they come from the endpoint configuration on
/// each request, so a configuration update applies to the next flush.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client() -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new().user_agent(USER_AGENT).build()
}
