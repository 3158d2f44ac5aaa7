//! Lenient deserializers for tool arguments.
//!
//! LLM clients frequently send scalars as strings (`"true"`, `"900"`) and
//! lists as JSON-encoded strings (`"[2,4]"`). These helpers accept both the
//! native and the string form; use them with `#[serde(deserialize_with)]`.

use chrono::{DateTime, FixedOffset};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};

/// Parse `true`/`false`/`1`/`0` (case-insensitive, surrounding whitespace ignored).
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBool {
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInteger {
    Int(u64),
    Num(f64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    List(Vec<T>),
    Str(String),
}

// Cast is exact: the value is integral and in range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn integral(n: f64) -> Option<u64> {
    (n.fract() == 0.0 && n >= 0.0 && n <= u64::MAX as f64).then(|| n as u64)
}

/// `Option<bool>` from a boolean, `0`/`1`, or a boolean string.
pub fn option_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawBool>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawBool::Bool(b)) => Ok(Some(b)),
        Some(RawBool::Int(0)) => Ok(Some(false)),
        Some(RawBool::Int(1)) => Ok(Some(true)),
        Some(RawBool::Int(n)) => Err(D::Error::custom(format!("expected a boolean, got {n}"))),
        Some(RawBool::Str(s)) => parse_bool(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a boolean, got \"{s}\""))),
    }
}

/// `Option<f64>` from a number or a numeric string.
pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawNumber::Num(n)) => Ok(Some(n)),
        Some(RawNumber::Str(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got \"{s}\""))),
    }
}

/// `Option<u64>` from a non-negative integer, integral float, or numeric string.
pub fn option_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<RawInteger>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawInteger::Int(n)) => Some(n),
        Some(RawInteger::Num(n)) => integral(n),
        Some(RawInteger::Str(ref s)) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
    };
    value
        .map(Some)
        .ok_or_else(|| D::Error::custom("expected a non-negative integer"))
}

/// `u64` with the same leniency as [`option_u64`]. Pair with `#[serde(default = ...)]`.
pub fn integer<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    option_u64(deserializer)?.ok_or_else(|| D::Error::custom("expected a non-negative integer"))
}

/// `Option<Vec<T>>` from an array or a JSON-encoded array string.
pub fn option_vec<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<RawList<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawList::List(items)) => Ok(Some(items)),
        Some(RawList::Str(s)) => serde_json::from_str::<Vec<T>>(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("expected a list: {e}"))),
    }
}

/// RFC 3339 timestamp. The offset is mandatory: a bare local time is ambiguous.
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(s.trim()).map_err(|_| {
        D::Error::custom(format!(
            "expected an RFC 3339 timestamp with a time zone (e.g. 2024-05-01T08:00:00-04:00), got \"{s}\""
        ))
    })
}
