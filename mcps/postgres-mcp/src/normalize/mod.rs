//! Result normalization - driver values to JSON
//!
//! [`normalize`] maps every value PostgreSQL can send in binary format onto
//! the JSON type universe:
//!
//! | PostgreSQL | JSON |
//! |---|---|
//! | `bool` | boolean |
//! | `int2`, `int4`, `int8`, `oid` | number |
//! | `float4`, `float8` | number, or `"NaN"` / `"Infinity"` / `"-Infinity"` |
//! | `numeric`, `money` | exact decimal string |
//! | `date`, `time`, `timetz`, `timestamp`, `timestamptz`, `interval` | ISO-8601 string |
//! | `uuid` | lowercase hyphenated string |
//! | `bytea` | base64 string |
//! | `json`, `jsonb` | the embedded value |
//! | text-like types and enums | string |
//! | `inet`, `cidr`, `macaddr`, `macaddr8`, `bit`, `varbit` | string |
//! | arrays | array, nested per dimension |
//! | composites and `record` | object |
//! | ranges | object |
//! | NULL, `void` | null |
//!
//! Anything else becomes its UTF-8 text when the payload is valid UTF-8 and
//! base64 otherwise. A value of a known type that fails to decode is always
//! base64, never reinterpreted as text, so one odd cell never fails a whole
//! result set.

mod numeric;
mod temporal;

use std::error::Error;
use std::net::IpAddr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fallible_iterator::FallibleIterator;
use postgres_protocol::types::{
    array_from_sql, bool_from_sql, char_from_sql, float4_from_sql, float8_from_sql,
    inet_from_sql, int2_from_sql, int4_from_sql, int8_from_sql, oid_from_sql, range_from_sql,
    text_from_sql, varbit_from_sql, Range, RangeBound,
};
use serde_json::{Map, Number, Value};
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::Row;

pub use numeric::{money_to_string, numeric_to_string};

pub(crate) type BoxError = Box<dyn Error + Sync + Send>;

/// A column value already converted to JSON
///
/// Accepts every type, so `row.try_get::<_, JsonCell>(i)` never fails on a
/// type mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonCell(pub Value);

impl<'a> FromSql<'a> for JsonCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(JsonCell(normalize(ty, Some(raw))))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(JsonCell(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Convert one binary value of type `ty` to JSON. `None` is SQL NULL.
pub fn normalize(ty: &Type, raw: Option<&[u8]>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };

    match decode(ty, raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(type_name = ty.name(), error = %e, "Undecodable value, using base64");
            Value::String(STANDARD.encode(raw))
        }
    }
}

/// Convert a row into an object keyed by column name, in column order
pub fn row_to_object(row: &Row) -> Result<Map<String, Value>, tokio_postgres::Error> {
    let mut object = Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let JsonCell(value) = row.try_get::<_, JsonCell>(idx)?;
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn decode(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    match ty.kind() {
        Kind::Array(member) => return decode_array(member, raw),
        Kind::Domain(base) => return decode(base, raw),
        Kind::Enum(_) => return Ok(Value::String(text_from_sql(raw)?.to_string())),
        Kind::Range(subtype) => return decode_range(subtype, raw),
        Kind::Composite(fields) => {
            let names = fields.iter().map(|f| f.name().to_string());
            let types = fields.iter().map(|f| Some(f.type_().clone()));
            return decode_composite(raw, names.zip(types).collect());
        }
        _ => {}
    }

    let value = match *ty {
        Type::BOOL => Value::Bool(bool_from_sql(raw)?),
        Type::INT2 => Value::from(int2_from_sql(raw)?),
        Type::INT4 => Value::from(int4_from_sql(raw)?),
        Type::INT8 => Value::from(int8_from_sql(raw)?),
        Type::OID => Value::from(oid_from_sql(raw)?),
        // via the shortest f32 text, so 0.1 stays 0.1 instead of its f64 widening
        Type::FLOAT4 => float(float4_from_sql(raw)?.to_string().parse()?),
        Type::FLOAT8 => float(float8_from_sql(raw)?),
        Type::NUMERIC => Value::String(numeric_to_string(raw)?),
        Type::MONEY => Value::String(money_to_string(raw)?),
        Type::CHAR => Value::String((char_from_sql(raw)? as u8 as char).to_string()),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::XML => {
            Value::String(text_from_sql(raw)?.to_string())
        }
        Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
        Type::UUID => Value::String(uuid::Uuid::from_sql(ty, raw)?.to_string()),
        Type::BYTEA => Value::String(STANDARD.encode(raw)),
        Type::DATE => Value::String(temporal::date(raw)?),
        Type::TIME => Value::String(temporal::time(raw)?),
        Type::TIMETZ => Value::String(temporal::timetz(raw)?),
        Type::TIMESTAMP => Value::String(temporal::timestamp(raw)?),
        Type::TIMESTAMPTZ => Value::String(temporal::timestamptz(raw)?),
        Type::INTERVAL => Value::String(temporal::interval(raw)?),
        Type::INET => Value::String(inet_text(raw, false)?),
        Type::CIDR => Value::String(inet_text(raw, true)?),
        Type::MACADDR | Type::MACADDR8 => Value::String(mac_text(raw)?),
        Type::BIT | Type::VARBIT => Value::String(bit_text(raw)?),
        Type::VOID => Value::Null,
        Type::RECORD => decode_record(raw)?,
        _ => fallback(raw),
    };
    Ok(value)
}

/// Text when the payload is UTF-8 (citext, enums, most extension types),
/// base64 otherwise
fn fallback(raw: &[u8]) -> Value {
    match std::str::from_utf8(raw) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::String(STANDARD.encode(raw)),
    }
}

fn float(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(n) => Value::Number(n),
        None if value.is_nan() => Value::String("NaN".to_string()),
        None if value > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

fn inet_text(raw: &[u8], is_cidr: bool) -> Result<String, BoxError> {
    let inet = inet_from_sql(raw)?;
    let full = match inet.addr() {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if is_cidr || inet.netmask() != full {
        Ok(format!("{}/{}", inet.addr(), inet.netmask()))
    } else {
        Ok(inet.addr().to_string())
    }
}

fn mac_text(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 6 && raw.len() != 8 {
        return Err("invalid mac address length".into());
    }
    Ok(raw
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}

fn bit_text(raw: &[u8]) -> Result<String, BoxError> {
    let varbit = varbit_from_sql(raw)?;
    let bytes = varbit.bytes();
    Ok((0..varbit.len())
        .map(|i| {
            if bytes[i / 8] & (0x80 >> (i % 8)) != 0 {
                '1'
            } else {
                '0'
            }
        })
        .collect())
}

fn decode_array(member: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let array = array_from_sql(raw)?;
    let dims: Vec<usize> = array
        .dimensions()
        .map(|d| Ok(d.len.max(0) as usize))
        .collect()?;
    let mut values = array
        .values()
        .map(|v| Ok(normalize(member, v)))
        .collect::<Vec<Value>>()?
        .into_iter();

    if dims.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(nest(&dims, &mut values))
}

/// Rebuild nesting from the flat, row-major element list
fn nest(dims: &[usize], values: &mut impl Iterator<Item = Value>) -> Value {
    match dims {
        [] => values.next().unwrap_or(Value::Null),
        [len] => Value::Array(values.by_ref().take(*len).collect()),
        [len, rest @ ..] => Value::Array((0..*len).map(|_| nest(rest, &mut *values)).collect()),
    }
}

/// Composite wire format: field count, then per field its type OID, length
/// (-1 for NULL) and payload
fn decode_composite(raw: &[u8], fields: Vec<(String, Option<Type>)>) -> Result<Value, BoxError> {
    let mut buf = raw;
    let count = take_i32(&mut buf)?;
    if count < 0 || count as usize != fields.len() {
        return Err(format!("expected {} fields, found {}", fields.len(), count).into());
    }

    let mut object = Map::with_capacity(fields.len());
    for (name, ty) in fields {
        let oid = take_i32(&mut buf)? as u32;
        let len = take_i32(&mut buf)?;
        let payload = if len < 0 {
            None
        } else {
            let len = len as usize;
            if buf.len() < len {
                return Err("truncated composite value".into());
            }
            let (head, tail) = buf.split_at(len);
            buf = tail;
            Some(head)
        };

        let value = match ty.or_else(|| Type::from_oid(oid)) {
            Some(ty) => normalize(&ty, payload),
            None => payload.map(fallback).unwrap_or(Value::Null),
        };
        object.insert(name, value);
    }
    Ok(Value::Object(object))
}

/// Anonymous `ROW(...)` values: fields named `f1`, `f2`, ... with types
/// resolved from their OIDs
fn decode_record(raw: &[u8]) -> Result<Value, BoxError> {
    let mut peek = raw;
    let count = take_i32(&mut peek)?;
    if count < 0 {
        return Err("negative record field count".into());
    }
    let fields = (1..=count as usize)
        .map(|i| (format!("f{}", i), None))
        .collect();
    decode_composite(raw, fields)
}

fn decode_range(subtype: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    fn bound(subtype: &Type, bound: RangeBound<Option<&[u8]>>) -> (Value, bool) {
        match bound {
            RangeBound::Inclusive(v) => (normalize(subtype, v), true),
            RangeBound::Exclusive(v) => (normalize(subtype, v), false),
            RangeBound::Unbounded => (Value::Null, false),
        }
    }

    match range_from_sql(raw)? {
        Range::Empty => Ok(serde_json::json!({ "empty": true })),
        Range::Nonempty(lower, upper) => {
            let (lower, lower_inclusive) = bound(subtype, lower);
            let (upper, upper_inclusive) = bound(subtype, upper);
            Ok(serde_json::json!({
                "lower": lower,
                "upper": upper,
                "lower_inclusive": lower_inclusive,
                "upper_inclusive": upper_inclusive,
            }))
        }
    }
}

fn take_i32(buf: &mut &[u8]) -> Result<i32, BoxError> {
    if buf.len() < 4 {
        return Err("truncated composite value".into());
    }
    let (head, tail) = buf.split_at(4);
    *buf = tail;
    Ok(i32::from_be_bytes([head[0], head[1], head[2], head[3]]))
}
