// src/process/date_parser.rs
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

/// NEM market time: AEST, no daylight saving.
pub const NEM_TZ: &str = "+10:00";

pub fn nem_offset() -> FixedOffset {
    FixedOffset::east_opt(10 * 3600).expect("+10:00 is a valid offset")
}

/// Fast parse of `"YYYY/MM/DD HH:MM:SS"` (market time) → millis UTC.
///
/// Falls back to `YYYY-MM-DD HH:MM:SS` and bare dates.
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    let naive = parse_fixed_layout(s).or_else(|| parse_loose(s))?;
    to_millis(naive)
}

fn parse_fixed_layout(s: &str) -> Option<NaiveDateTime> {
    // exact layout only; fractional seconds and anything else go to parse_loose
    if !s.is_ascii() || s.len() != 19 || &s[4..5] != "/" || &s[7..8] != "/" || &s[10..11] != " " {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;
    let hour: u32 = s[11..13].parse().ok()?;
    let min: u32 = s[14..16].parse().ok()?;
    let sec: u32 = s[17..19].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, min, sec)
}

fn parse_loose(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y/%m/%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y/%m/%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Market-time wall clock → millis UTC.
pub fn to_millis(naive: NaiveDateTime) -> Option<i64> {
    nem_offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis())
}

/// Millis UTC → market-time wall clock.
pub fn to_market_time(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&nem_offset()).naive_local())
}
