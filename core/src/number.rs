//! Deserializers for gateway fields that arrive either as JSON numbers or as
//! numeric strings (`"12.50"`). Used through `#[serde(deserialize_with)]`.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Only finite values pass; `"NaN"` and `"inf"` parse as `f64` but are not
/// amounts.
fn loose_to_f64<E: de::Error>(value: Loose) -> Result<f64, E> {
    let parsed = match value {
        Loose::Int(i) => i as f64,
        Loose::Float(f) => f,
        Loose::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid number: {s:?}")))?,
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(E::custom(format!("non-finite number: {parsed}")))
    }
}

fn loose_to_i64<E: de::Error>(value: Loose) -> Result<i64, E> {
    match value {
        Loose::Int(i) => Ok(i),
        Loose::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        Loose::Float(f) => Err(E::custom(format!("expected integer, got {f}"))),
        Loose::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid integer: {s:?}"))),
    }
}

pub fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    loose_to_f64(Loose::deserialize(deserializer)?)
}

/// Like `f64_lenient` but accepts `null`, absent (with `#[serde(default)]`)
/// and the empty string as `None`.
pub fn opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => loose_to_f64(v).map(Some),
    }
}

pub fn i64_lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    loose_to_i64(Loose::deserialize(deserializer)?)
}

pub fn opt_i64_lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => loose_to_i64(v).map(Some),
    }
}

/// Durations such as `expires_in`; negative values are rejected.
pub fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = loose_to_i64(Loose::deserialize(deserializer)?)?;
    u64::try_from(value).map_err(|_| de::Error::custom(format!("expected non-negative integer, got {value}")))
}

/// Identifiers come back as strings from some services and as integers from
/// others; both are held as `String`.
pub fn id_lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Loose::deserialize(deserializer)? {
        Loose::Int(i) => Ok(i.to_string()),
        Loose::Float(f) => Ok(f.to_string()),
        Loose::Text(s) => Ok(s),
    }
}

pub fn opt_id_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?.map(|v| match v {
        Loose::Int(i) => i.to_string(),
        Loose::Float(f) => f.to_string(),
        Loose::Text(s) => s,
    }))
}
