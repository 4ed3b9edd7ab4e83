//! Escaping rules for the individual parts of a line.

/// Measurement names: commas and spaces end the name unless escaped.
pub(crate) fn measurement(out: &mut String, s: &str) {
    escape_chars(out, s, &[',', ' ']);
}

/// Tag keys, tag values and field keys additionally escape `=`.
pub(crate) fn key(out: &mut String, s: &str) {
    escape_chars(out, s, &[',', '=', ' ']);
}

/// String field values are double-quoted; quotes and backslashes inside
/// them are escaped.
pub(crate) fn string_field(out: &mut String, s: &str) {
    out.push('"');
    escape_chars(out, s, &['"', '\\']);
    out.push('"');
}

fn escape_chars(out: &mut String, s: &str, special: &[char]) {
    out.reserve(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
