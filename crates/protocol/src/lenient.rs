//! Lenient field deserializers for loosely-typed server payloads.
//!
//! Both helpers accept any JSON value and map it to `None` when it is
//! absent, of the wrong type, or "falsy" (empty string, zero).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a non-empty string. Numbers are accepted and rendered as text.
pub fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_of))
}

/// Reads a non-zero unsigned integer. Numeric strings are accepted.
pub fn non_zero_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(u64_of))
}

/// Extracts a non-empty string from an arbitrary JSON value.
pub fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts a non-zero unsigned integer from an arbitrary JSON value.
pub fn u64_of(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.filter(|n| *n != 0)
}
