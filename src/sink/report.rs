//! Failure report formatting.

use std::fmt::Write;

use crate::config::EndpointConfig;
use crate::error_handling::DeliveryFailure;

/// Formats the diagnostic logged for one failed delivery.
///
/// The report carries the endpoint context (host, bucket, organization and
/// the redacted token), the server's error body when there was one, and the
/// lines of the batch when `config.log_failed_lines` is set. The full token
/// never appears.
pub fn failure_report(
    config: &EndpointConfig,
    failure: &DeliveryFailure,
    lines: &[String],
) -> String {
    let mut report = String::new();

    // Writing into a String cannot fail
    let _ = match failure {
        DeliveryFailure::Status { status, reason, .. } => {
            writeln!(report, "Failed to write ({}: {:?});", status, reason)
        }
        other => writeln!(report, "Failed to send: \"{}\"", other),
    };
    let _ = write!(report, "{}", config);

    if let DeliveryFailure::Status {
        body: Some(body), ..
    } = failure
    {
        let _ = writeln!(report, "Response: {}", body);
    }

    if config.log_failed_lines {
        for line in lines {
            let _ = writeln!(report, "Line: {}", line);
        }
    } else {
        let _ = writeln!(report, "Lines dropped: {}", lines.len());
    }

    report
}
