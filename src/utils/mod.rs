//! Small helpers shared by the sink and configuration code.
//!
//! - Credential redaction for logs
//! - Sanitizing server messages before they are logged

pub mod redact;
pub mod sanitize;
