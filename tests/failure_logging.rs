//! Integration tests for what a failed delivery writes to the log.
//!
//! These tests verify:
//! - A non-2xx response logs exactly one error, with the token redacted
//! - Suppressed response errors log nothing at error level
//!
//! A capturing logger is installed once for this test binary. Tests run in
//! parallel, so each one filters the records by its own bucket name.

use influx_relay::{EndpointConfig, HttpWriteSink, WriteSink};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Keeps every record this crate emits.
struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("influx_relay")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

fn logger() -> &'static CapturingLogger {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger in this test binary");
        log::set_max_level(LevelFilter::Trace);
    });
    &LOGGER
}

/// Error-level messages that mention `bucket`.
fn errors_for(bucket: &str) -> Vec<String> {
    let needle = format!("Bucket: {}", bucket);
    logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == Level::Error && message.contains(&needle))
        .map(|(_, message)| message.clone())
        .collect()
}

async fn failing_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("engine: out of memory"))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_server_error_logs_once_with_redacted_token() {
    logger();
    let server = failing_server(500).await;

    let config = EndpointConfig::new(server.uri(), "acme", "logged_bucket").with_token("abcdefgh");
    let sink = HttpWriteSink::new(config).unwrap();
    let outcome = sink.send(&["cpu load=1i".to_string()]).await.unwrap();
    assert!(!outcome.is_delivered());

    let errors = errors_for("logged_bucket");
    assert_eq!(errors.len(), 1, "expected one error record, got {:?}", errors);
    assert!(errors[0].contains("abcd****"));
    assert!(errors[0].contains("engine: out of memory"));

    // The full token appears in no record at any level
    let leaked = logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .any(|(_, message)| message.contains("abcdefgh"));
    assert!(!leaked);
}

#[tokio::test]
async fn test_suppressed_response_errors_are_not_logged() {
    logger();
    let server = failing_server(401).await;

    let mut config =
        EndpointConfig::new(server.uri(), "acme", "quiet_bucket").with_token("abcdefgh");
    config.suppress_response_errors = true;
    let sink = HttpWriteSink::new(config).unwrap();
    let outcome = sink.send(&["cpu load=1i".to_string()]).await.unwrap();

    assert_eq!(outcome.lines(), 1);
    assert!(!outcome.is_delivered());
    assert!(errors_for("quiet_bucket").is_empty());
}
