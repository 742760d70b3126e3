//! Date/time validation and CDA `TS` conversion.
//!
//! ISO 8601 extended values pass through unchanged. CDA basic timestamps
//! (`YYYY[MM[DD[HH[MM[SS[.f]]]]]][+/-ZZZZ]`) are rewritten in extended form,
//! keeping their precision.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parsed precision of a CDA basic timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampPrecision {
    Year(i32),
    YearMonth { year: i32, month: u32 },
    Date(NaiveDate),
    Minute(NaiveDateTime),
    Second(NaiveDateTime),
    Fractional(NaiveDateTime),
}

impl TimestampPrecision {
    pub fn to_iso8601(&self) -> String {
        match self {
            TimestampPrecision::Year(year) => format!("{year:04}"),
            TimestampPrecision::YearMonth { year, month } => format!("{year:04}-{month:02}"),
            TimestampPrecision::Date(date) => date.format("%Y-%m-%d").to_string(),
            TimestampPrecision::Minute(dt) | TimestampPrecision::Second(dt) => {
                dt.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            TimestampPrecision::Fractional(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }

    fn has_time(&self) -> bool {
        matches!(
            self,
            TimestampPrecision::Minute(_)
                | TimestampPrecision::Second(_)
                | TimestampPrecision::Fractional(_)
        )
    }
}

/// Returns the extended form of `value`, or `None` when it is neither
/// ISO 8601 extended nor a CDA basic timestamp.
pub fn normalize_date_time(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_iso8601_extended(trimmed) {
        return Some(trimmed.to_string());
    }
    let (stamp, offset) = split_offset(trimmed)?;
    let precision = parse_basic(stamp)?;
    match offset {
        Some(offset) if precision.has_time() => {
            Some(format!("{}{}", precision.to_iso8601(), format_offset(offset)?))
        }
        // a zone on a date-only value carries nothing an extended date can hold
        Some(offset) => format_offset(offset).map(|_| precision.to_iso8601()),
        None => Some(precision.to_iso8601()),
    }
}

fn is_iso8601_extended(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.len() {
        4 => bytes.iter().all(u8::is_ascii_digit),
        7 => {
            bytes[4] == b'-'
                && NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_ok()
        }
        10 => bytes[4] == b'-' && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        len if len > 10 && bytes[4] == b'-' && bytes[10] == b'T' => {
            chrono::DateTime::parse_from_rfc3339(value).is_ok()
                || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        _ => false,
    }
}

fn split_offset(value: &str) -> Option<(&str, Option<&str>)> {
    match value.find(['+', '-']) {
        Some(index) => Some((&value[..index], Some(&value[index..]))),
        None if value.is_empty() => None,
        None => Some((value, None)),
    }
}

fn format_offset(offset: &str) -> Option<String> {
    let bytes = offset.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let hours: u32 = offset[1..3].parse().ok()?;
    let minutes: u32 = offset[3..5].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(format!("{}{:02}:{:02}", &offset[..1], hours, minutes))
}

fn parse_basic(stamp: &str) -> Option<TimestampPrecision> {
    let (digits, fraction) = match stamp.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (stamp, None),
    };
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let number = |range: std::ops::Range<usize>| digits.get(range)?.parse::<u32>().ok();
    let year = i32::try_from(number(0..4)?).ok()?;

    let precision = match (digits.len(), fraction) {
        (4, None) => TimestampPrecision::Year(year),
        (6, None) => {
            let month = number(4..6)?;
            NaiveDate::from_ymd_opt(year, month, 1)?;
            TimestampPrecision::YearMonth { year, month }
        }
        (8, None) => TimestampPrecision::Date(NaiveDate::from_ymd_opt(
            year,
            number(4..6)?,
            number(6..8)?,
        )?),
        (12 | 14, _) => {
            let date = NaiveDate::from_ymd_opt(year, number(4..6)?, number(6..8)?)?;
            let hour = number(8..10)?;
            let minute = number(10..12)?;
            let second = if digits.len() == 14 { number(12..14)? } else { 0 };
            let time = match fraction {
                Some(fraction) if digits.len() == 14 => {
                    if fraction.is_empty() || !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
                        return None;
                    }
                    let nanos: u32 = format!("{fraction:0<9}").get(..9)?.parse().ok()?;
                    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?
                }
                Some(_) => return None,
                None => NaiveTime::from_hms_opt(hour, minute, second)?,
            };
            let date_time = date.and_time(time);
            match (digits.len(), fraction) {
                (12, _) => TimestampPrecision::Minute(date_time),
                (_, Some(_)) => TimestampPrecision::Fractional(date_time),
                _ => TimestampPrecision::Second(date_time),
            }
        }
        _ => return None,
    };
    Some(precision)
}
