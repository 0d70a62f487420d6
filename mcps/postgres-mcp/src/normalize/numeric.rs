//! Exact text rendering of `numeric` and `money`
//!
//! `numeric` is rendered from its binary form as a decimal string so no
//! precision is lost on the way to JSON.

use std::fmt::Write;

use postgres_protocol::types::int8_from_sql;

use super::BoxError;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

fn read_u16(raw: &[u8], at: usize) -> Result<u16, BoxError> {
    raw.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated numeric value".into())
}

/// Decode a binary `numeric` into its decimal text
///
/// Layout: ndigits, weight, sign, dscale (16 bits each) followed by
/// `ndigits` base-10000 digits. `weight` is the power of 10000 of the first
/// digit.
pub fn numeric_to_string(raw: &[u8]) -> Result<String, BoxError> {
    let ndigits = read_u16(raw, 0)? as usize;
    let weight = read_u16(raw, 2)? as i16 as i32;
    let sign = read_u16(raw, 4)?;
    let dscale = read_u16(raw, 6)? as usize;

    let digits = (0..ndigits)
        .map(|i| read_u16(raw, 8 + i * 2).map(|d| d as i16))
        .collect::<Result<Vec<_>, _>>()?;

    let negative = match sign {
        NUMERIC_POS => false,
        NUMERIC_NEG => true,
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        other => return Err(format!("invalid numeric sign 0x{:04x}", other).into()),
    };

    let digit_at = |idx: i32| -> i16 {
        if idx >= 0 {
            digits.get(idx as usize).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut out = String::new();
    if negative && !digits.is_empty() {
        out.push('-');
    }

    if weight < 0 || digits.is_empty() {
        out.push('0');
    } else {
        for idx in 0..=weight {
            if idx == 0 {
                write!(out, "{}", digit_at(idx))?;
            } else {
                write!(out, "{:04}", digit_at(idx))?;
            }
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut idx = weight + 1;
        while frac.len() < dscale {
            write!(frac, "{:04}", digit_at(idx))?;
            idx += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }

    Ok(out)
}

/// Decode `money` (a count of cents) as a two-place decimal string
pub fn money_to_string(raw: &[u8]) -> Result<String, BoxError> {
    let cents = int8_from_sql(raw)?;
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    Ok(format!("{}{}.{:02}", sign, abs / 100, abs % 100))
}
