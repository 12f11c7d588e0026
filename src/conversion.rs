//! The built-in conversions behind the seeded rules. Each one sees the input
//! only after the absence and same-type guards of its rule, so `Nil` and
//! already typed values rarely get here.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::datatype::{Decimal, Value};
use crate::error::{CastError, Result};
use crate::rule::CastContext;
use crate::template::Conversion;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(
        r"^[+-]?(?:0[xX][0-9a-fA-F]+(?:_[0-9a-fA-F]+)*|0[bB][01]+(?:_[01]+)*|0[oO][0-7]+(?:_[0-7]+)*|\d+(?:_\d+)*)$"
    ).expect("valid regex");
    static ref FLOAT: Regex = Regex::new(
        r"^[+-]?\d+(?:_\d+)*(?:\.\d+(?:_\d+)*)?(?:[eE][+-]?\d+)?$"
    ).expect("valid regex");
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"];

/// Looks up a built-in conversion by the name templates call it with.
pub fn builtin(name: &str) -> Option<Conversion> {
    let conversion: Conversion = match name {
        "text" => Arc::new(to_text),
        "integer" => Arc::new(to_integer),
        "float" => Arc::new(to_float),
        "list" => Arc::new(to_list),
        "date" => Arc::new(to_date),
        "time" => Arc::new(to_time),
        "date_time" => Arc::new(to_date_time),
        "decimal" => Arc::new(to_decimal),
        "array_of" => Arc::new(to_array_of),
        "set_of" => Arc::new(to_set_of),
        _ => return None,
    };
    Some(conversion)
}

fn unconvertible<T>(value: &Value, target: &str) -> Result<T> {
    Err(CastError::Unconvertible(format!("cannot convert {} `{}` to {}", value.type_name(), value, target)))
}

// ------------- Scalars -------------
pub fn to_text(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    match value {
        Value::Text(s) => Ok(Value::Text(s.clone())),
        Value::List(_) | Value::Set(_) | Value::Map(_) | Value::Object(_) => unconvertible(value, "text"),
        scalar => Ok(Value::Text(scalar.to_string())),
    }
}

pub fn to_integer(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Float(x) if x.is_finite() && x.trunc().abs() < i64::MAX as f64 => Ok(Value::Integer(x.trunc() as i64)),
        Value::Decimal(d) => d.to_i64().map(Value::Integer).map_or_else(|| unconvertible(value, "integer"), Ok),
        Value::Text(s) => parse_integer(s).map(Value::Integer).map_or_else(|| unconvertible(value, "integer"), Ok),
        _ => unconvertible(value, "integer"),
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if !INTEGER.is_match(text) {
        return None;
    }
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match digits.as_bytes().first() {
        Some(b'-') => (true, &digits[1..]),
        Some(b'+') => (false, &digits[1..]),
        _ => (false, &digits[..]),
    };
    let (radix, digits) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        _ => (10, digits),
    };
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

pub fn to_float(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    match value {
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Decimal(d) => d.to_f64().map(Value::Float).map_or_else(|| unconvertible(value, "float"), Ok),
        Value::Text(s) => parse_float(s).map(Value::Float).map_or_else(|| unconvertible(value, "float"), Ok),
        _ => unconvertible(value, "float"),
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if !FLOAT.is_match(text) {
        return None;
    }
    text.replace('_', "").parse().ok()
}

// Input must be readable as a float, but the digits are kept exactly.
pub fn to_decimal(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    let decimal = match value {
        Value::Decimal(d) => Some(d.clone()),
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Float(x) if x.is_finite() => Decimal::parse(&format!("{:?}", x)),
        Value::Text(s) => {
            let text = s.trim();
            parse_float(text).and_then(|_| BigDecimal::from_str(&text.replace('_', "")).ok()).map(Decimal::from)
        }
        _ => None,
    };
    decimal.map(Value::Decimal).map_or_else(|| unconvertible(value, "decimal"), Ok)
}

pub fn to_list(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    Ok(Value::List(into_items(value)))
}

fn into_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Nil => Vec::new(),
        Value::List(items) => items.clone(),
        Value::Set(items) => items.iter().cloned().collect(),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| Value::List(vec![Value::Text(k.clone()), v.clone()]))
            .collect(),
        scalar => vec![scalar.clone()],
    }
}

// ------------- Temporal -------------
pub fn to_date(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    let date = match value {
        Value::Date(d) => Some(*d),
        Value::Time(t) => Some(t.date_naive()),
        Value::DateTime(t) => Some(t.date_naive()),
        Value::Text(s) => parse_date(s.trim()),
        _ => None,
    };
    date.map(Value::Date).map_or_else(|| unconvertible(value, "date"), Ok)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| parse_offset(text).map(|t| t.date_naive()))
        .or_else(|| parse_naive(text).map(|t| t.date()))
}

pub fn to_time(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    let time = match value {
        Value::Time(t) => Some(*t),
        Value::DateTime(t) => Some(t.with_timezone(&Local)),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).and_then(|naive| Local.from_local_datetime(&naive).earliest()),
        Value::Text(s) => {
            let text = s.trim();
            match parse_offset(text) {
                Some(t) => Some(t.with_timezone(&Local)),
                None => parse_naive(text)
                    .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest()),
            }
        }
        _ => None,
    };
    time.map(Value::Time).map_or_else(|| unconvertible(value, "time"), Ok)
}

// Without an explicit offset a date-time is taken to be UTC.
pub fn to_date_time(value: &Value, _: &CastContext<'_>) -> Result<Value> {
    let utc = Utc.fix();
    let date_time = match value {
        Value::DateTime(t) => Some(*t),
        Value::Time(t) => Some(t.with_timezone(&t.offset().fix())),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|naive| utc.from_utc_datetime(&naive)),
        Value::Text(s) => {
            let text = s.trim();
            parse_offset(text).or_else(|| {
                parse_naive(text)
                    .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
                    .map(|naive| utc.from_utc_datetime(&naive))
            })
        }
        _ => None,
    };
    date_time.map(Value::DateTime).map_or_else(|| unconvertible(value, "date-time"), Ok)
}

fn parse_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        OFFSET_DATE_TIME_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(text, format).ok())
    })
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

// ------------- Collections -------------
/// Coerces every member with the rule of the element type, which is looked
/// up when the value arrives rather than when the attribute is declared.
fn coerce_elements(value: &Value, context: &CastContext<'_>) -> Result<Vec<Value>> {
    let element = context.element()?;
    let rule = context.registry.lookup(element).ok_or_else(|| CastError::UnsupportedType {
        type_name: element.to_string(),
    })?;
    let coercion = rule.compile(context.attribute, element);
    into_items(value)
        .into_iter()
        .map(|item| coercion.apply(item, context.registry))
        .collect()
}

pub fn to_array_of(value: &Value, context: &CastContext<'_>) -> Result<Value> {
    coerce_elements(value, context).map(Value::List)
}

pub fn to_set_of(value: &Value, context: &CastContext<'_>) -> Result<Value> {
    coerce_elements(value, context).map(Value::set)
}
