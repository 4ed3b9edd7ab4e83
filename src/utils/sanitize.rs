//! Utilities for sanitizing text quoted in logs.
//!
//! Server error bodies are echoed into failure reports. Control characters
//! are stripped and long bodies truncated so a misbehaving endpoint cannot
//! flood or garble the log.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Sanitizes a message by removing control characters.
///
/// Newline, tab and carriage return are kept; other characters below 0x20
/// are dropped. Non-ASCII text passes through unchanged.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 // Printable ASCII starts at 0x20 (space)
                || code == 0x09 // Tab
                || code == 0x0A // Newline
                || code == 0x0D // Carriage return
        })
        .filter(|c| *c != '\u{7f}')
        .collect()
}

/// Sanitizes and truncates a message to `MAX_ERROR_MESSAGE_LENGTH` characters.
///
/// A truncated message ends with a note giving the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let char_count = sanitized.chars().count();

    if char_count > MAX_ERROR_MESSAGE_LENGTH {
        // leave room for the truncation note
        let keep = MAX_ERROR_MESSAGE_LENGTH.saturating_sub(50);
        let truncated: String = sanitized.chars().take(keep).collect();
        format!(
            "{}... (truncated, original length: {} chars)",
            truncated, char_count
        )
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_error_message_removes_control_chars() {
        let input = "Error\x00message\x01with\x02control\x03chars\x7f";
        let output = sanitize_error_message(input);
        assert_eq!(output, "Errormessagewithcontrolchars");
    }

    #[test]
    fn test_sanitize_error_message_preserves_whitespace() {
        let input = "Error\nmessage\twith\r\nwhitespace";
        assert_eq!(sanitize_error_message(input), input);
    }

    #[test]
    fn test_sanitize_error_message_preserves_unicode() {
        let input = "Error message with unicode: 测试 🚀";
        assert_eq!(sanitize_error_message(input), input);
    }

    #[test]
    fn test_truncate_leaves_short_messages_alone() {
        let input = r#"{"code":"invalid","message":"unable to parse 'x'"}"#;
        assert_eq!(sanitize_and_truncate_error_message(input), input);
    }

    #[test]
    fn test_truncate_long_message() {
        let input = "é".repeat(MAX_ERROR_MESSAGE_LENGTH + 10);
        let output = sanitize_and_truncate_error_message(&input);
        assert!(output.starts_with(&"é".repeat(MAX_ERROR_MESSAGE_LENGTH - 50)));
        assert!(output.ends_with(&format!(
            "(truncated, original length: {} chars)",
            MAX_ERROR_MESSAGE_LENGTH + 10
        )));
    }
}
