//! Reading driver rows back into JSON
//!
//! Each column is decoded according to its [`ValueFamily`]. Dates, times,
//! numerics, uuids and the other non-JSON scalars become strings, inside
//! arrays too. Types with no dedicated family are accepted only when their
//! wire form is readable text (enum labels are); anything else becomes
//! `null` and a warning is logged.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde_json::{Map, Number, Value};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgRow, PgValueFormat, PgValueRef, Postgres};
use sqlx::types::Json;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo, ValueRef};

use crate::sql::{value_family, ValueFamily};
use crate::types::{FieldDescription, Row};

/// Name and type oid of every column in `row`.
pub fn describe_columns(row: &PgRow) -> Vec<FieldDescription> {
    row.columns()
        .iter()
        .map(|column| {
            let type_id = column.type_info().oid().map(|oid| oid.0).unwrap_or(0);
            FieldDescription::new(column.name(), type_id)
        })
        .collect()
}

/// Decode a full row into an ordered JSON map keyed by column name.
pub fn row_to_json(row: &PgRow) -> Row {
    let mut record = Map::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.type_info().name());
        record.insert(column.name().to_string(), value);
    }
    record
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw,
        _ => return Value::Null,
    };

    let decoded = match value_family(type_name) {
        ValueFamily::Boolean => row.try_get::<bool, _>(index).map(Value::Bool),
        ValueFamily::SmallInt => row.try_get::<i16, _>(index).map(Value::from),
        ValueFamily::Integer => row.try_get::<i32, _>(index).map(Value::from),
        ValueFamily::BigInt => row.try_get::<i64, _>(index).map(Value::from),
        ValueFamily::Real => row.try_get::<f32, _>(index).map(real),
        ValueFamily::Double => row.try_get::<f64, _>(index).map(float),
        ValueFamily::Numeric => row.try_get::<rust_decimal::Decimal, _>(index).map(display),
        ValueFamily::Oid => row
            .try_get::<sqlx::postgres::types::Oid, _>(index)
            .map(|oid| Value::from(oid.0)),
        ValueFamily::Text => row.try_get_unchecked::<String, _>(index).map(Value::String),
        ValueFamily::Json => row.try_get::<Value, _>(index),
        ValueFamily::Uuid => row.try_get::<uuid::Uuid, _>(index).map(display),
        ValueFamily::Timestamp => row.try_get::<chrono::NaiveDateTime, _>(index).map(timestamp),
        ValueFamily::TimestampTz => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .map(timestamptz),
        ValueFamily::Date => row.try_get::<chrono::NaiveDate, _>(index).map(display),
        ValueFamily::Time => row.try_get::<chrono::NaiveTime, _>(index).map(display),
        ValueFamily::Interval => row.try_get::<PgInterval, _>(index).map(interval),
        ValueFamily::Bytea => row.try_get::<Vec<u8>, _>(index).map(|bytes| bytea(&bytes)),
        ValueFamily::Inet => inet(raw),
        ValueFamily::MacAddr => macaddr(raw),
        ValueFamily::TextArray => list::<String>(row, index, Value::String),
        ValueFamily::SmallIntArray => list::<i16>(row, index, Value::from),
        ValueFamily::IntegerArray => list::<i32>(row, index, Value::from),
        ValueFamily::BigIntArray => list::<i64>(row, index, Value::from),
        ValueFamily::BooleanArray => list::<bool>(row, index, Value::Bool),
        ValueFamily::RealArray => list::<f32>(row, index, real),
        ValueFamily::DoubleArray => list::<f64>(row, index, float),
        ValueFamily::NumericArray => list::<rust_decimal::Decimal>(row, index, display),
        ValueFamily::UuidArray => list::<uuid::Uuid>(row, index, display),
        ValueFamily::JsonArray => list::<Json<Value>>(row, index, |json| json.0),
        ValueFamily::DateArray => list::<chrono::NaiveDate>(row, index, display),
        ValueFamily::TimeArray => list::<chrono::NaiveTime>(row, index, display),
        ValueFamily::TimestampArray => list::<chrono::NaiveDateTime>(row, index, timestamp),
        ValueFamily::TimestampTzArray => {
            list::<chrono::DateTime<chrono::Utc>>(row, index, timestamptz)
        }
        ValueFamily::OtherArray => text_list(row, index, type_name),
        ValueFamily::Other => text(raw, type_name),
    };

    match decoded {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                "could not decode column {} of type {}: {}",
                index,
                type_name,
                error
            );
            Value::Null
        }
    }
}

/// One-dimensional array with `NULL` elements kept as `null`
fn list<T>(
    row: &PgRow,
    index: usize,
    convert: impl Fn(T) -> Value,
) -> Result<Value, sqlx::Error>
where
    Vec<Option<T>>: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    let items = row.try_get::<Vec<Option<T>>, _>(index)?;
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map(&convert).unwrap_or(Value::Null))
            .collect(),
    ))
}

/// Array of a type without a dedicated family. Element payloads are taken
/// as text only when every one of them reads as text.
fn text_list(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let items = row.try_get_unchecked::<Vec<Option<String>>, _>(index)?;
    if items.iter().flatten().any(|item| !readable(item.as_bytes())) {
        return Err(undecodable(type_name));
    }
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map(Value::String).unwrap_or(Value::Null))
            .collect(),
    ))
}

fn text(raw: PgValueRef<'_>, type_name: &str) -> Result<Value, sqlx::Error> {
    if raw.format() == PgValueFormat::Text {
        return raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .map_err(sqlx::Error::Decode);
    }
    let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
    if readable(bytes) {
        // Enum labels and other text-like types send their label as is
        Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
    } else {
        Err(undecodable(type_name))
    }
}

fn readable(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok_and(|s| !s.chars().any(char::is_control))
}

fn undecodable(type_name: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("no text form for binary {} value", type_name).into())
}

fn display(value: impl ToString) -> Value {
    Value::String(value.to_string())
}

fn timestamp(ts: chrono::NaiveDateTime) -> Value {
    Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn timestamptz(ts: chrono::DateTime<chrono::Utc>) -> Value {
    Value::String(ts.to_rfc3339())
}

/// ISO 8601 duration, e.g. `P1M2DT3H4M5.5S`
fn interval(value: PgInterval) -> Value {
    let micros = value.microseconds;
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let hours = micros / 3_600_000_000;
    let minutes = micros / 60_000_000 % 60;
    let seconds = micros % 60_000_000;
    let mut out = format!("P{}M{}DT", value.months, value.days);
    out.push_str(&format!("{sign}{hours}H{sign}{minutes}M{sign}{}", seconds / 1_000_000));
    if seconds % 1_000_000 != 0 {
        let fraction = format!("{:06}", seconds % 1_000_000);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('S');
    Value::String(out)
}

/// Hex form PostgreSQL prints by default, `\x0a1b`
fn bytea(bytes: &[u8]) -> Value {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    Value::String(out)
}

/// `inet`/`cidr` binary form: family, prefix bits, is-cidr flag, address
/// length, address bytes
fn inet(raw: PgValueRef<'_>) -> Result<Value, sqlx::Error> {
    if raw.format() == PgValueFormat::Text {
        return text(raw, "inet");
    }
    let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
    let address = match bytes {
        [2, _, _, 4, a, b, c, d] => IpAddr::V4(Ipv4Addr::new(*a, *b, *c, *d)),
        [3, _, _, 16, rest @ ..] if rest.len() == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(rest);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return Err(undecodable("inet")),
    };
    let bits = bytes[1];
    let is_cidr = bytes[2] != 0;
    let full = if address.is_ipv4() { 32 } else { 128 };
    if is_cidr || bits != full {
        Ok(Value::String(format!("{}/{}", address, bits)))
    } else {
        Ok(Value::String(address.to_string()))
    }
}

fn macaddr(raw: PgValueRef<'_>) -> Result<Value, sqlx::Error> {
    if raw.format() == PgValueFormat::Text {
        return text(raw, "macaddr");
    }
    let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
    if bytes.len() != 6 {
        return Err(undecodable("macaddr"));
    }
    let parts: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(Value::String(parts.join(":")))
}

fn real(value: f32) -> Value {
    float(f64::from(value))
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interval_renders_as_iso_duration() {
        let value = PgInterval {
            months: 14,
            days: 3,
            microseconds: 3_723_500_000,
        };
        assert_eq!(interval(value), Value::String("P14M3DT1H2M3.5S".to_string()));

        let negative = PgInterval {
            months: 0,
            days: 0,
            microseconds: -90_000_000,
        };
        assert_eq!(interval(negative), Value::String("P0M0DT-0H-1M-30S".to_string()));
    }

    #[test]
    fn bytea_renders_as_hex() {
        assert_eq!(bytea(&[0x0a, 0xff, 0x00]), Value::String("\\x0aff00".to_string()));
        assert_eq!(bytea(&[]), Value::String("\\x".to_string()));
    }

    #[test]
    fn only_printable_payloads_read_as_text() {
        assert!(readable(b"happy"));
        assert!(readable("caf\u{e9}".as_bytes()));
        assert!(!readable(&[0, 0, 0, 1, 0, 0, 0, 2]));
        assert!(!readable(&[0xff, 0xfe]));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(float(f64::NAN), Value::Null);
        assert_eq!(real(1.5), Value::from(1.5));
    }
}
