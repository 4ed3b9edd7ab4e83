//! Structured metric samples.
//!
//! A [`Point`] is one sample: a measurement name, ordered tags, ordered typed
//! fields and an optional timestamp. Points are assembled with a builder and
//! are not modified once handed to a client.

mod precision;

pub use precision::Precision;

use chrono::{DateTime, Utc};

use crate::error_handling::EncodeError;

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(f64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// One measurement sample.
///
/// # Example
///
/// ```
/// use influx_relay::Point;
///
/// let point = Point::measurement("players")
///     .tag("server", "eu-1")
///     .field("online", 42)
///     .field("tps", 19.5);
/// assert_eq!(point.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<DateTime<Utc>>,
}

impl Point {
    /// Starts a point without a timestamp; the server assigns ingest time.
    pub fn measurement(name: impl Into<String>) -> Self {
        Point {
            measurement: name.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// Starts a point stamped with the current time.
    pub fn now(name: impl Into<String>) -> Self {
        Self::measurement(name).time(Utc::now())
    }

    /// Adds a tag. A key that is already present keeps its position and
    /// takes the new value.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.tags.push((key, value)),
        }
        self
    }

    /// Adds a field, with the same replace-in-place rule as [`Point::tag`].
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    /// Sets the timestamp.
    pub fn time(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn measurement_name(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn timestamp(&self) -> Option<&DateTime<Utc>> {
        self.timestamp.as_ref()
    }

    /// Checks everything the encoder would reject, without encoding.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in measurement, tag, field order.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.measurement.is_empty() {
            return Err(EncodeError::EmptyMeasurement);
        }
        if self.measurement.starts_with('#') {
            return Err(EncodeError::CommentMeasurement(self.measurement.clone()));
        }
        check_unquoted(&self.measurement, MEASUREMENT_SEPARATORS)?;

        for (key, value) in &self.tags {
            if key.is_empty() {
                return Err(EncodeError::EmptyTagKey);
            }
            if value.is_empty() {
                return Err(EncodeError::EmptyTagValue(key.clone()));
            }
            check_unquoted(key, KEY_SEPARATORS)?;
            check_unquoted(value, KEY_SEPARATORS)?;
        }

        for (key, value) in &self.fields {
            if key.is_empty() {
                return Err(EncodeError::EmptyFieldKey);
            }
            check_unquoted(key, KEY_SEPARATORS)?;
            match value {
                FieldValue::Float(f) if !f.is_finite() => {
                    return Err(EncodeError::NonFiniteFloat(key.clone()));
                }
                FieldValue::String(s) => reject_line_break(s)?,
                _ => {}
            }
        }

        Ok(())
    }
}

fn reject_line_break(s: &str) -> Result<(), EncodeError> {
    if s.contains(['\n', '\r']) {
        return Err(EncodeError::LineBreak(s.to_string()));
    }
    Ok(())
}

const MEASUREMENT_SEPARATORS: &[char] = &[',', ' '];
const KEY_SEPARATORS: &[char] = &[',', '=', ' '];

/// Checks a measurement, key or tag value, which are written unquoted.
///
/// A `\` at the end, or right before a character the encoder escapes, would
/// pair with the escape or separator written after it and split the line in
/// the wrong place.
fn check_unquoted(s: &str, separators: &[char]) -> Result<(), EncodeError> {
    reject_line_break(s)?;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().map_or(true, |next| separators.contains(next)) {
            return Err(EncodeError::DanglingBackslash(s.to_string()));
        }
    }
    Ok(())
}
