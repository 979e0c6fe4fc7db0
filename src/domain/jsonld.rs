//! Lenient field readers for linked-data documents.
//!
//! Federated servers disagree on shapes: a reference may be a bare URL, an
//! object with an `id`, or a list of either. These helpers fold all of them
//! into the single value the rest of the crate works with.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// First usable URL in a reference value.
pub fn link_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => ["id", "href", "url"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(link_of),
        Value::Array(items) => items.iter().find_map(link_of),
        _ => None,
    }
}

pub fn opt_link<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(link_of))
}

/// Strings only, with the empty string treated as absent.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

pub fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

pub fn opt_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        _ => None,
    })
}

/// A single object or a list of them. Entries that fail to parse are dropped.
pub fn one_or_many<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Some(item @ Value::Object(_)) => serde_json::from_value(item).ok().into_iter().collect(),
        _ => Vec::new(),
    })
}
