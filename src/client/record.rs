//! Items held by the write client's buffer.

use crate::line_protocol;
use crate::point::{Point, Precision};

/// One accepted sample, either already encoded or still structured.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A line-protocol line produced elsewhere, sent as-is.
    Line(String),
    /// A point, encoded when its batch is flushed.
    Point(Point),
}

/// Encodes a drained batch into lines, keeping acceptance order.
///
/// Points that fail to encode are logged and left out; the second value is
/// how many were left out.
pub(crate) fn encode_records<I>(records: I, precision: Precision) -> (Vec<String>, usize)
where
    I: IntoIterator<Item = Record>,
{
    let mut rejected = 0;
    let lines = records
        .into_iter()
        .filter_map(|record| match record {
            Record::Line(line) => Some(line),
            Record::Point(point) => match line_protocol::encode(&point, precision) {
                Ok(line) => Some(line),
                Err(e) => {
                    log::warn!(
                        "Dropping point {:?} that cannot be encoded: {}",
                        point.measurement_name(),
                        e
                    );
                    rejected += 1;
                    None
                }
            },
        })
        .collect();
    (lines, rejected)
}
