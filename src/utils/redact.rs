//! Credential masking for log output.

/// Shows the first `visible` characters of `credential` and masks the rest
/// with `*`, one per hidden character.
///
/// A credential no longer than `visible` is masked entirely, since showing
/// the prefix would show all of it.
///
/// ```
/// use influx_relay::utils::redact::hide_credential;
///
/// assert_eq!(hide_credential("abcdefgh", 4), "abcd****");
/// assert_eq!(hide_credential("abc", 4), "***");
/// ```
pub fn hide_credential(credential: &str, visible: usize) -> String {
    let len = credential.chars().count();
    if len <= visible {
        return "*".repeat(len);
    }

    let mut masked: String = credential.chars().take(visible).collect();
    masked.push_str(&"*".repeat(len - visible));
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_shown_rest_masked() {
        assert_eq!(hide_credential("abcdefgh", 4), "abcd****");
        assert_eq!(hide_credential("abcde", 4), "abcd*");
    }

    #[test]
    fn test_short_credentials_fully_masked() {
        assert_eq!(hide_credential("abcd", 4), "****");
        assert_eq!(hide_credential("", 4), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(hide_credential("ключ-секрет", 4), "ключ*******");
    }
}
