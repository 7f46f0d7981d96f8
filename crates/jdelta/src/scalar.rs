//! Logical subtypes of JSON scalars.
//!
//! A JSON number or string can stand for a more specific value: an integer,
//! a decimal, a timestamp, a GUID, a base64 blob. Semantic comparison first
//! materializes each side into a [`Scalar`] and then compares by subtype, so
//! `1` equals `1.0` and `"2024-05-01T10:00:00Z"` equals
//! `"2024-05-01T12:00:00+02:00"`.
//!
//! Materialization preference:
//!
//! - numbers: integer, then decimal, then double
//! - strings: date-time with offset, then date-time, then GUID, then byte
//!   blob, then plain string

use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use uuid::Uuid;

/// A scalar value materialized to its most specific logical subtype.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Integer(i128),
    Decimal(Decimal),
    Double(f64),
    DateTimeOffset(DateTime<FixedOffset>),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Bytes(Vec<u8>),
    String(&'a str),
}

impl<'a> Scalar<'a> {
    /// Materialize a JSON value. Returns `None` for arrays and objects.
    pub fn materialize(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(materialize_number(n)),
            Value::String(s) => Some(materialize_str(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Whether this is one of the numeric subtypes.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Scalar::Integer(_) | Scalar::Decimal(_) | Scalar::Double(_)
        )
    }

    /// Whether this is a date-time subtype.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Scalar::DateTimeOffset(_) | Scalar::DateTime(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(d),
            Scalar::Double(f) => Some(*f),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Scalar::Integer(i) => Decimal::from_i128(*i),
            Scalar::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

/// Materialize a JSON number from its literal text.
pub fn materialize_number(n: &Number) -> Scalar<'static> {
    let text = n.to_string();
    if is_integer_literal(&text) {
        if let Ok(i) = text.parse::<i128>() {
            return Scalar::Integer(i);
        }
    }
    let decimal = if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text).ok()
    } else {
        Decimal::from_str(&text).ok()
    };
    if let Some(d) = decimal {
        return Scalar::Decimal(d);
    }
    let f = n
        .as_f64()
        .or_else(|| text.parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    Scalar::Double(f)
}

/// Materialize a JSON string.
pub fn materialize_str(s: &str) -> Scalar<'_> {
    if let Some(dt) = parse_date_time_offset(s) {
        return Scalar::DateTimeOffset(dt);
    }
    if let Some(dt) = parse_date_time(s) {
        return Scalar::DateTime(dt);
    }
    if let Some(guid) = parse_guid(s) {
        return Scalar::Guid(guid);
    }
    if let Some(bytes) = parse_base64(s) {
        return Scalar::Bytes(bytes);
    }
    Scalar::String(s)
}

/// Whether a string is plain text rather than a date, GUID or blob.
pub fn is_plain_text(s: &str) -> bool {
    matches!(materialize_str(s), Scalar::String(_))
}

/// Compare two materialized scalars by subtype.
///
/// Numeric subtypes are normalized to a shared domain before comparing;
/// date-times compare as instants; every other pairing of different
/// subtypes is unequal.
pub fn scalars_equal(a: &Scalar<'_>, b: &Scalar<'_>) -> bool {
    match (a, b) {
        (Scalar::Null, Scalar::Null) => true,
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        (x, y) if x.is_number() && y.is_number() => numbers_equal(x, y),
        (x, y) if x.is_temporal() && y.is_temporal() => instants_equal(x, y),
        (Scalar::Guid(x), Scalar::Guid(y)) => x == y,
        (Scalar::Bytes(x), Scalar::Bytes(y)) => x == y,
        (Scalar::String(x), Scalar::String(y)) => x == y,
        _ => false,
    }
}

/// Normalize two numbers to a shared domain and compare once.
///
/// Integers compare exactly. If either side is decimal-capable both are
/// widened to [`Decimal`]; otherwise both are compared as doubles within
/// `(|x| + |y| + 10) * 2^-52`.
pub fn numbers_equal(a: &Scalar<'_>, b: &Scalar<'_>) -> bool {
    if let (Scalar::Integer(x), Scalar::Integer(y)) = (a, b) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => doubles_equal(x, y),
        _ => false,
    }
}

/// Epsilon-tolerant double comparison.
pub fn doubles_equal(x: f64, y: f64) -> bool {
    if x == y {
        return true;
    }
    if x.is_nan() || y.is_nan() || x.is_infinite() || y.is_infinite() {
        return false;
    }
    (x - y).abs() <= (x.abs() + y.abs() + 10.0) * f64::EPSILON
}

fn instants_equal(a: &Scalar<'_>, b: &Scalar<'_>) -> bool {
    match (a, b) {
        (Scalar::DateTimeOffset(x), Scalar::DateTimeOffset(y)) => x == y,
        (Scalar::DateTime(x), Scalar::DateTime(y)) => x == y,
        // A naive date-time is read as UTC against an offset form.
        (Scalar::DateTimeOffset(x), Scalar::DateTime(y))
        | (Scalar::DateTime(y), Scalar::DateTimeOffset(x)) => x.naive_utc() == *y,
        _ => false,
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_date_time_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    if !looks_like_date(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s).ok()
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    if !looks_like_date(s) {
        return None;
    }
    if s.len() == 10 {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn looks_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[7] == b'-'
}

fn parse_guid(s: &str) -> Option<Uuid> {
    // Only the canonical hyphenated form is a GUID.
    if s.len() != 36 {
        return None;
    }
    Uuid::parse_str(s).ok()
}

fn parse_base64(s: &str) -> Option<Vec<u8>> {
    if s.len() % 4 != 0 {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(s).ok()
}
