// src/process/interval.rs
use arrow::array::TimestampMillisecondArray;
use chrono::Duration;

use super::date_parser::{to_market_time, NEM_TZ};
use crate::catalog::Frequency;

pub const INTERVAL_START: &str = "interval-start";
pub const INTERVAL_END: &str = "interval-end";

/// Derive `(interval-start, interval-end)` from the interval column.
///
/// The interval column holds the end of each interval; the start is the end
/// minus the table frequency in force at that end. Null stays null.
pub fn derive_intervals(
    interval_end: &[Option<i64>],
    frequency: &Frequency,
) -> (TimestampMillisecondArray, TimestampMillisecondArray) {
    let starts: Vec<Option<i64>> = interval_end
        .iter()
        .map(|end| {
            let end = (*end)?;
            let minutes = frequency.minutes_at(to_market_time(end)?);
            Some(end - Duration::minutes(i64::from(minutes)).num_milliseconds())
        })
        .collect();

    (
        TimestampMillisecondArray::from(starts).with_timezone(NEM_TZ),
        TimestampMillisecondArray::from(interval_end.to_vec()).with_timezone(NEM_TZ),
    )
}
