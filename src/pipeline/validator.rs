//! Shape rules for ids, names, keys and values.
//!
//! Every check returns the first violation as `TrackError::IllegalData`
//! and never touches its input.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::PropertyValue;
use crate::error::{TrackError, TrackResult};

pub const MAX_ID_LEN: usize = 255;
pub const MAX_KEY_LEN: usize = 255;
pub const MAX_STRING_VALUE_LEN: usize = 8191;

/// Identifier grammar shared by event names, property keys, identity keys and item types.
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$][a-zA-Z0-9_$]{0,99}$").expect("name pattern compiles"));

const RESERVED_WORDS: &[&str] = &[
    "distinct_id",
    "original_id",
    "time",
    "properties",
    "id",
    "first_id",
    "second_id",
    "users",
    "events",
    "event",
    "user_id",
    "date",
    "datetime",
];

const RESERVED_PREFIXES: &[&str] = &["user_group", "user_tag"];

/// Reserved words are matched case-insensitively.
pub fn is_reserved(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_WORDS.contains(&lower.as_str()) || RESERVED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name) && !is_reserved(name)
}

pub fn check_distinct_id(distinct_id: Option<&str>) -> TrackResult<&str> {
    let id = match distinct_id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(TrackError::illegal("property [distinct_id] must not be empty")),
    };
    if id.len() > MAX_ID_LEN {
        return Err(TrackError::illegal(format!("the max length of [distinct_id] is {MAX_ID_LEN}")));
    }
    Ok(id)
}

pub fn check_original_id(original_id: Option<&str>) -> TrackResult<&str> {
    let id = match original_id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(TrackError::illegal("property [original_id] must not be empty")),
    };
    if id.len() > MAX_ID_LEN {
        return Err(TrackError::illegal(format!("the max length of [original_id] is {MAX_ID_LEN}")));
    }
    Ok(id)
}

pub fn check_event_name(name: Option<&str>) -> TrackResult<&str> {
    match name {
        Some(name) if is_valid_name(name) => Ok(name),
        Some(name) => Err(TrackError::illegal(format!(
            "event name must be a valid variable name. [name='{name}']"
        ))),
        None => Err(TrackError::illegal("event name must not be empty")),
    }
}

pub fn check_item_type(item_type: &str) -> TrackResult<()> {
    if !is_valid_name(item_type) {
        return Err(TrackError::illegal(format!(
            "item_type must be a valid variable name. [item_type='{item_type}']"
        )));
    }
    Ok(())
}

pub fn check_item_id(item_id: &str) -> TrackResult<()> {
    if item_id.is_empty() {
        return Err(TrackError::illegal("item_id must not be empty"));
    }
    if item_id.len() > MAX_ID_LEN {
        return Err(TrackError::illegal(format!("the max length of item_id is {MAX_ID_LEN}")));
    }
    Ok(())
}

pub fn check_property_key(key: &str) -> TrackResult<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(TrackError::illegal(format!(
            "the max length of property key is {MAX_KEY_LEN}. [key='{key}']"
        )));
    }
    if !is_valid_name(key) {
        return Err(TrackError::illegal(format!(
            "property key must be a valid variable name. [key='{key}']"
        )));
    }
    Ok(())
}

/// Accepts string, number, boolean, date-like, or a plain list of strings.
pub fn check_property_value(key: &str, value: &PropertyValue) -> TrackResult<()> {
    match value {
        PropertyValue::Bool(_) | PropertyValue::Int(_) | PropertyValue::DateTime(_) => Ok(()),
        PropertyValue::Float(f) if f.is_finite() => Ok(()),
        PropertyValue::String(s) => {
            if s.len() > MAX_STRING_VALUE_LEN {
                return Err(TrackError::illegal(format!(
                    "the max length of property value is {MAX_STRING_VALUE_LEN}. [key='{key}']"
                )));
            }
            Ok(())
        }
        PropertyValue::Map(_) => Err(TrackError::illegal(format!(
            "[list] property must not be associative. [key='{key}']"
        ))),
        PropertyValue::List(items) => {
            for item in items {
                match item {
                    PropertyValue::String(s) if s.len() <= MAX_STRING_VALUE_LEN => {}
                    PropertyValue::String(_) => {
                        return Err(TrackError::illegal(format!(
                            "the max length of property value is {MAX_STRING_VALUE_LEN}. [key='{key}']"
                        )))
                    }
                    other => {
                        return Err(TrackError::illegal(format!(
                            "[list] property's value must be a str. [value='{}']",
                            other.describe()
                        )))
                    }
                }
            }
            Ok(())
        }
        PropertyValue::Null | PropertyValue::Float(_) => Err(TrackError::illegal(format!(
            "property value must be a str/int/float/datetime/list. [key='{key}']"
        ))),
    }
}

pub fn check_identity_key(key: &str) -> TrackResult<()> {
    if key.is_empty() {
        return Err(TrackError::illegal("identity key is empty or null"));
    }
    if key.len() > MAX_KEY_LEN || !is_valid_name(key) {
        return Err(TrackError::illegal(format!(
            "identity key must be a valid variable key. [key='{key}']"
        )));
    }
    Ok(())
}

pub fn check_identity_value(key: &str, value: &str) -> TrackResult<()> {
    if value.is_empty() {
        return Err(TrackError::illegal(format!("identity value is empty or null. [key='{key}']")));
    }
    if value.len() > MAX_ID_LEN {
        return Err(TrackError::illegal(format!("identity value is too long. [key='{key}']")));
    }
    Ok(())
}

const TIME_ERROR: &str = "property [time] must be a timestamp in microseconds";

/// Coerces a `$time` input to epoch milliseconds.
///
/// Ten digits are seconds and get scaled; eleven to thirteen pass through untouched.
pub fn normalize_time(value: &PropertyValue) -> TrackResult<i64> {
    let raw = match value {
        PropertyValue::Int(i) => *i,
        PropertyValue::Float(f) if f.is_finite() => f.trunc() as i64,
        PropertyValue::String(s) => parse_integer_part(s).ok_or_else(|| TrackError::illegal(TIME_ERROR))?,
        PropertyValue::DateTime(dt) => dt.timestamp_millis(),
        _ => return Err(TrackError::illegal(TIME_ERROR)),
    };
    check_time_digits(raw)
}

pub fn check_time_digits(ts: i64) -> TrackResult<i64> {
    if ts < 0 {
        return Err(TrackError::illegal(TIME_ERROR));
    }
    match ts.to_string().len() {
        10 => Ok(ts * 1000),
        11..=13 => Ok(ts),
        _ => Err(TrackError::illegal(TIME_ERROR)),
    }
}

fn parse_integer_part(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let int_part = trimmed.split('.').next().unwrap_or(trimmed);
    int_part.parse().ok()
}
