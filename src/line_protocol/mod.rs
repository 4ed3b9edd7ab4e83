//! Line-protocol encoding.
//!
//! Renders a [`Point`] as one line of the InfluxDB text format:
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...][ timestamp]
//! ```
//!
//! - tags and fields keep their insertion order, so output is stable
//! - integers carry an `i` suffix; floats are written in shortest
//!   round-trip form; booleans as `true`/`false`
//! - string fields are quoted with `"` and `\` escaped inside
//! - the timestamp, when present, is an integer at the requested precision
//!
//! Encoding is pure. A point the server would reject (or that would corrupt
//! the surrounding batch) is refused with an [`EncodeError`].

mod escape;

use std::fmt::Write;

use crate::error_handling::EncodeError;
use crate::point::{FieldValue, Point, Precision};

/// Encodes one point as a single line (without a trailing newline).
///
/// A point with no fields is rendered as its measurement and tags only.
///
/// # Errors
///
/// Any failure of [`Point::validate`], or a timestamp that cannot be
/// represented at `precision`.
///
/// # Example
///
/// ```
/// use influx_relay::{line_protocol, Point, Precision};
///
/// let point = Point::measurement("measurement").tag("a", "b").field("x", 1);
/// let line = line_protocol::encode(&point, Precision::Milliseconds).unwrap();
/// assert_eq!(line, "measurement,a=b x=1i");
/// ```
pub fn encode(point: &Point, precision: Precision) -> Result<String, EncodeError> {
    point.validate()?;

    let mut line = String::with_capacity(64);
    escape::measurement(&mut line, point.measurement_name());

    for (key, value) in point.tags() {
        line.push(',');
        escape::key(&mut line, key);
        line.push('=');
        escape::key(&mut line, value);
    }

    for (i, (key, value)) in point.fields().iter().enumerate() {
        line.push(if i == 0 { ' ' } else { ',' });
        escape::key(&mut line, key);
        line.push('=');
        write_field_value(&mut line, value);
    }

    if let Some(time) = point.timestamp() {
        let ts = precision
            .timestamp(time)
            .ok_or(EncodeError::TimestampOutOfRange)?;
        let _ = write!(line, " {}", ts);
    }

    Ok(line)
}

fn write_field_value(out: &mut String, value: &FieldValue) {
    // Writing into a String cannot fail
    let _ = match value {
        FieldValue::Integer(v) => write!(out, "{}i", v),
        FieldValue::Float(v) => write!(out, "{}", v),
        FieldValue::Boolean(v) => write!(out, "{}", v),
        FieldValue::String(v) => {
            escape::string_field(out, v);
            Ok(())
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ms(point: &Point) -> String {
        encode(point, Precision::Milliseconds).expect("point should encode")
    }

    /// Splits on unescaped `sep`, honoring backslash escapes and quotes, then
    /// unescapes each part. Mirrors how the server tokenizes a line.
    fn split_unescaped(s: &str, sep: char) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars();
        let mut in_quotes = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(c);
                }
                c if c == sep && !in_quotes => parts.push(std::mem::take(&mut current)),
                c => current.push(c),
            }
        }
        parts.push(current);
        parts
    }

    #[test]
    fn test_integer_field_with_tag() {
        let point = Point::measurement("measurement").tag("a", "b").field("x", 1);
        assert_eq!(ms(&point), "measurement,a=b x=1i");
    }

    #[test]
    fn test_all_field_types_in_order() {
        let point = Point::measurement("m")
            .field("i", -42i64)
            .field("f", 1.5)
            .field("whole", 2.0)
            .field("b", true)
            .field("s", "text");
        assert_eq!(ms(&point), "m i=-42i,f=1.5,whole=2,b=true,s=\"text\"");
    }

    #[test]
    fn test_timestamp_at_requested_precision() {
        let time = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let point = Point::measurement("m").field("x", 1).time(time);

        assert_eq!(ms(&point), "m x=1i 1700000000123");
        assert_eq!(
            encode(&point, Precision::Seconds).unwrap(),
            "m x=1i 1700000000"
        );
        assert_eq!(
            encode(&point, Precision::Nanoseconds).unwrap(),
            "m x=1i 1700000000123000000"
        );
    }

    #[test]
    fn test_tag_and_key_escaping() {
        let point = Point::measurement("cpu load")
            .tag("host name", "web,01")
            .tag("k=v", "a=b")
            .field("field key", 1);
        assert_eq!(
            ms(&point),
            r"cpu\ load,host\ name=web\,01,k\=v=a\=b field\ key=1i"
        );
    }

    #[test]
    fn test_escaped_values_survive_reparsing() {
        let original_tag = "eu west, rack=3";
        let original_field = r#"he said "a, b" \o/"#;
        let point = Point::measurement("m")
            .tag("loc", original_tag)
            .field("msg", original_field);
        let line = ms(&point);

        // measurement+tags, then fields
        let sections = split_unescaped(&line, ' ');
        assert_eq!(sections.len(), 2, "line was {line}");

        let raw_tags = &line[..line.find(" msg=").unwrap()];
        let tag_parts = split_unescaped(raw_tags, ',');
        assert_eq!(tag_parts[0], "m");
        let tag_value = tag_parts[1].strip_prefix("loc=").unwrap();
        assert_eq!(tag_value, original_tag);

        let field_value = sections[1].strip_prefix("msg=").unwrap();
        let unquoted = field_value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap();
        assert_eq!(unquoted, original_field);
    }

    #[test]
    fn test_fieldless_point_renders_deterministically() {
        let point = Point::measurement("m").tag("k", "v");
        assert_eq!(ms(&point), "m,k=v");
        assert_eq!(ms(&point), ms(&point.clone()));
    }

    #[test]
    fn test_malformed_points_fail_fast() {
        assert_eq!(
            encode(&Point::measurement("").field("x", 1), Precision::Milliseconds),
            Err(EncodeError::EmptyMeasurement)
        );
        assert_eq!(
            encode(
                &Point::measurement("m").field("x", f64::INFINITY),
                Precision::Milliseconds
            ),
            Err(EncodeError::NonFiniteFloat("x".to_string()))
        );
    }

    #[test]
    fn test_backslash_that_would_split_the_line_is_rejected() {
        let point = Point::measurement("m").tag("path", r"C:\").field("x", 1);
        assert_eq!(
            encode(&point, Precision::Milliseconds),
            Err(EncodeError::DanglingBackslash(r"C:\".to_string()))
        );
    }

    #[test]
    fn test_inner_backslash_keeps_line_structure() {
        let point = Point::measurement("m")
            .tag("path", r"C:\temp")
            .field("x", 1);
        let line = ms(&point);
        assert_eq!(line, r"m,path=C:\temp x=1i");
        assert_eq!(split_unescaped(&line, ' ').len(), 2, "line was {line}");
    }

    #[test]
    fn test_comment_measurement_is_rejected() {
        assert_eq!(
            encode(&Point::measurement("#temp").field("x", 1), Precision::Milliseconds),
            Err(EncodeError::CommentMeasurement("#temp".to_string()))
        );
    }

    #[test]
    fn test_nanosecond_overflow_is_rejected() {
        let far_future = Utc.with_ymd_and_hms(2500, 1, 1, 0, 0, 0).unwrap();
        let point = Point::measurement("m").field("x", 1).time(far_future);
        assert_eq!(
            encode(&point, Precision::Nanoseconds),
            Err(EncodeError::TimestampOutOfRange)
        );
        assert!(encode(&point, Precision::Milliseconds).is_ok());
    }
}
