//! ISO-8601 rendering of date/time types
//!
//! Fractional seconds are written with six digits when present and omitted
//! otherwise. `infinity` and `-infinity` dates and timestamps keep their
//! PostgreSQL spelling.
//!
//! Calendar dates are computed from PostgreSQL's day count on `i64`, so the
//! whole server range (4713 BC to 5874897 AD) renders. Years use
//! astronomical numbering (1 BC is `0000`) and years past 9999 carry a `+`.

use std::fmt::Write;

use postgres_protocol::types::{date_from_sql, time_from_sql, timestamp_from_sql};

use super::BoxError;

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR as i64;

/// Days from 1970-01-01 to 2000-01-01, the PostgreSQL epoch
const UNIX_TO_PG_EPOCH_DAYS: i64 = 10_957;

/// Proleptic Gregorian `(year, month, day)` for a day count relative to
/// 1970-01-01
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// `YYYY-MM-DD` for days since 2000-01-01
fn date_text(pg_days: i64) -> String {
    let (year, month, day) = civil_from_days(pg_days + UNIX_TO_PG_EPOCH_DAYS);
    let year = match year {
        0..=9999 => format!("{:04}", year),
        y if y < 0 => format!("-{:04}", -y),
        y => format!("+{}", y),
    };
    format!("{}-{:02}-{:02}", year, month, day)
}

/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` for microseconds since 2000-01-01
fn datetime_text(pg_micros: i64) -> String {
    let days = pg_micros.div_euclid(MICROS_PER_DAY);
    let clock = pg_micros.rem_euclid(MICROS_PER_DAY);
    format!("{}T{}", date_text(days), clock_text(clock))
}

/// `HH:MM:SS[.ffffff]` from microseconds since midnight. 24:00:00 is kept.
fn clock_text(micros: i64) -> String {
    let micros = micros.max(0) as u64;
    let hours = micros / MICROS_PER_HOUR;
    let minutes = (micros % MICROS_PER_HOUR) / MICROS_PER_MINUTE;
    let seconds = (micros % MICROS_PER_MINUTE) / MICROS_PER_SECOND;
    let frac = micros % MICROS_PER_SECOND;

    if frac == 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}.{:06}", hours, minutes, seconds, frac)
    }
}

fn read_i32(raw: &[u8], at: usize) -> Result<i32, BoxError> {
    raw.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| "truncated time value".into())
}

pub fn date(raw: &[u8]) -> Result<String, BoxError> {
    match date_from_sql(raw)? {
        i32::MAX => Ok("infinity".to_string()),
        i32::MIN => Ok("-infinity".to_string()),
        days => Ok(date_text(i64::from(days))),
    }
}

pub fn time(raw: &[u8]) -> Result<String, BoxError> {
    Ok(clock_text(time_from_sql(raw)?))
}

/// `timetz`: microseconds since midnight, then the zone as seconds west of UTC
pub fn timetz(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 12 {
        return Err("invalid timetz length".into());
    }
    let micros = time_from_sql(&raw[..8])?;
    let east = -read_i32(raw, 8)?;

    let sign = if east < 0 { '-' } else { '+' };
    let abs = east.unsigned_abs();
    let mut out = clock_text(micros);
    write!(out, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)?;
    if abs % 60 != 0 {
        write!(out, ":{:02}", abs % 60)?;
    }
    Ok(out)
}

pub fn timestamp(raw: &[u8]) -> Result<String, BoxError> {
    match timestamp_from_sql(raw)? {
        i64::MAX => Ok("infinity".to_string()),
        i64::MIN => Ok("-infinity".to_string()),
        micros => Ok(datetime_text(micros)),
    }
}

/// `timestamptz` arrives in UTC and is rendered with an explicit `+00:00`
pub fn timestamptz(raw: &[u8]) -> Result<String, BoxError> {
    match timestamp_from_sql(raw)? {
        i64::MAX => Ok("infinity".to_string()),
        i64::MIN => Ok("-infinity".to_string()),
        micros => Ok(format!("{}+00:00", datetime_text(micros))),
    }
}

/// `interval` as an ISO-8601 duration, each component carrying its own sign
pub fn interval(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err("invalid interval length".into());
    }
    let micros = time_from_sql(&raw[..8])?;
    let days = read_i32(raw, 8)?;
    let total_months = read_i32(raw, 12)?;

    let years = total_months / 12;
    let months = total_months % 12;

    let mut out = String::from("P");
    if years != 0 {
        write!(out, "{}Y", years)?;
    }
    if months != 0 {
        write!(out, "{}M", months)?;
    }
    if days != 0 {
        write!(out, "{}D", days)?;
    }

    if micros != 0 {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let hours = abs / MICROS_PER_HOUR;
        let minutes = (abs % MICROS_PER_HOUR) / MICROS_PER_MINUTE;
        let seconds = (abs % MICROS_PER_MINUTE) / MICROS_PER_SECOND;
        let frac = abs % MICROS_PER_SECOND;

        out.push('T');
        if hours != 0 {
            write!(out, "{}{}H", sign, hours)?;
        }
        if minutes != 0 {
            write!(out, "{}{}M", sign, minutes)?;
        }
        if seconds != 0 || frac != 0 {
            write!(out, "{}{}", sign, seconds)?;
            if frac != 0 {
                let digits = format!("{:06}", frac);
                write!(out, ".{}", digits.trim_end_matches('0'))?;
            }
            out.push('S');
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    Ok(out)
}
