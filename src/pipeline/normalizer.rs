use serde_json::{Map, Number, Value};

use super::identity::{assert_identities, Identity};
use super::types::{EventRecord, EventType, LibInfo, Properties, PropertyValue};
use super::validator;
use crate::error::{TrackError, TrackResult};

pub const TIME_KEY: &str = "$time";
pub const PROJECT_KEY: &str = "$project";
pub const TOKEN_KEY: &str = "$token";
pub const APP_VERSION_KEY: &str = "$app_version";
pub const LOGIN_FLAG_KEY: &str = "$is_login_id";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S.0";

/// Call arguments of one API call, not yet checked.
#[derive(Debug, Clone)]
pub struct RawEvent<'a> {
    pub kind: EventType,
    pub event: Option<&'a str>,
    pub distinct_id: Option<&'a str>,
    pub is_login_id: bool,
    pub original_id: Option<&'a str>,
    pub item_type: Option<&'a str>,
    pub item_id: Option<&'a str>,
    pub properties: &'a Properties,
    pub identities: Option<&'a Identity>,
}

impl<'a> RawEvent<'a> {
    pub fn new(kind: EventType, properties: &'a Properties) -> Self {
        Self {
            kind,
            event: None,
            distinct_id: None,
            is_login_id: false,
            original_id: None,
            item_type: None,
            item_id: None,
            properties,
            identities: None,
        }
    }
}

/// Per-call facts owned by the facade.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext<'a> {
    pub now_millis: i64,
    pub super_properties: Option<&'a Properties>,
    pub project: Option<&'a str>,
    pub lib: LibInfo,
}

/// Turns raw call arguments into a wire-ready record or the first rule it breaks.
pub fn normalize(raw: &RawEvent<'_>, ctx: &NormalizeContext<'_>) -> TrackResult<EventRecord> {
    let mut caller = raw.properties.clone();
    let user_time = caller.remove(TIME_KEY);
    let project = take_string(&mut caller, PROJECT_KEY).or_else(|| ctx.project.map(str::to_string));
    let token = take_string(&mut caller, TOKEN_KEY);

    let mut merged = Properties::new();
    if raw.kind.uses_super_properties() {
        if let Some(supers) = ctx.super_properties {
            merged.extend(supers);
        }
    }
    merged.extend(&caller);

    let distinct_id = if raw.kind.is_item() {
        None
    } else {
        Some(validator::check_distinct_id(raw.distinct_id)?.to_string())
    };

    let original_id = if raw.kind == EventType::TrackSignup {
        Some(validator::check_original_id(raw.original_id)?.to_string())
    } else {
        None
    };

    let time = match &user_time {
        Some(value) => validator::normalize_time(value)?,
        None => validator::check_time_digits(ctx.now_millis)?,
    };

    let event = if raw.kind.has_event_name() {
        Some(validator::check_event_name(raw.event)?.to_string())
    } else {
        None
    };

    let (item_type, item_id) = if raw.kind.is_item() {
        let item_type = raw.item_type.unwrap_or_default();
        let item_id = raw.item_id.unwrap_or_default();
        validator::check_item_type(item_type)?;
        validator::check_item_id(item_id)?;
        (Some(item_type.to_string()), Some(item_id.to_string()))
    } else {
        (None, None)
    };

    let mut properties = Map::new();
    for (key, value) in merged.iter() {
        validator::check_property_key(key)?;
        validator::check_property_value(key, value)?;
        check_for_kind(raw.kind, key, value)?;
        properties.insert(key.clone(), to_wire_value(value));
    }
    if raw.is_login_id {
        properties.insert(LOGIN_FLAG_KEY.to_string(), Value::Bool(true));
    }

    let identities = match raw.identities {
        Some(identity) => {
            assert_identities(identity)?;
            Some(identity.to_wire())
        }
        None => None,
    };

    let mut lib = ctx.lib.clone();
    if let Some(app_version) = merged.get(APP_VERSION_KEY).and_then(PropertyValue::as_str) {
        lib.app_version = Some(app_version.to_string());
    }

    Ok(EventRecord {
        kind: raw.kind,
        event,
        time,
        distinct_id,
        original_id,
        item_type,
        item_id,
        properties,
        identities,
        project,
        token,
        lib,
    })
}

/// Extra value constraints of the profile operations that do arithmetic or set union.
fn check_for_kind(kind: EventType, key: &str, value: &PropertyValue) -> TrackResult<()> {
    match kind {
        EventType::ProfileIncrement if !value.is_number() => Err(TrackError::illegal(format!(
            "property value of PROFILE_INCREMENT must be a number. [key='{key}']"
        ))),
        EventType::ProfileAppend if !matches!(value, PropertyValue::List(_)) => Err(TrackError::illegal(
            format!("property value of PROFILE_APPEND must be a list. [key='{key}']"),
        )),
        _ => Ok(()),
    }
}

/// Rewrites an already validated value into its JSON form; date-likes become `YYYY-MM-DD HH:MM:SS.0`.
pub fn to_wire_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Int(i) => Value::Number((*i).into()),
        PropertyValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::DateTime(dt) => Value::String(dt.format(DATE_FORMAT).to_string()),
        PropertyValue::List(items) => Value::Array(items.iter().map(to_wire_value).collect()),
        PropertyValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_wire_value(v)))
                .collect(),
        ),
    }
}

fn take_string(props: &mut Properties, key: &str) -> Option<String> {
    match props.remove(key)? {
        PropertyValue::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
