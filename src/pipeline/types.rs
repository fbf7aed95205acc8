use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Track,
    TrackSignup,
    ProfileSet,
    ProfileSetOnce,
    ProfileIncrement,
    ProfileAppend,
    ProfileUnset,
    ProfileDelete,
    TrackIdBind,
    TrackIdUnbind,
    ItemSet,
    ItemDelete,
}

impl EventType {
    /// Types that carry an `event` name on the wire.
    pub fn has_event_name(&self) -> bool {
        matches!(
            self,
            EventType::Track | EventType::TrackSignup | EventType::TrackIdBind | EventType::TrackIdUnbind
        )
    }

    /// Super properties are only merged into behaviour events, never into profile or item updates.
    pub fn uses_super_properties(&self) -> bool {
        self.has_event_name()
    }

    pub fn is_item(&self) -> bool {
        matches!(self, EventType::ItemSet | EventType::ItemDelete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Track => "track",
            EventType::TrackSignup => "track_signup",
            EventType::ProfileSet => "profile_set",
            EventType::ProfileSetOnce => "profile_set_once",
            EventType::ProfileIncrement => "profile_increment",
            EventType::ProfileAppend => "profile_append",
            EventType::ProfileUnset => "profile_unset",
            EventType::ProfileDelete => "profile_delete",
            EventType::TrackIdBind => "track_id_bind",
            EventType::TrackIdUnbind => "track_id_unbind",
            EventType::ItemSet => "item_set",
            EventType::ItemDelete => "item_delete",
        }
    }
}

/// A property value as the caller hands it in, before validation.
///
/// The enum is deliberately wider than what the wire accepts (`Null`, `Map`,
/// lists of non-strings) so the validator can reject those with a precise reason.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    List(Vec<PropertyValue>),
    Map(Vec<(String, PropertyValue)>),
}

impl PropertyValue {
    pub fn is_number(&self) -> bool {
        matches!(self, PropertyValue::Int(_) | PropertyValue::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short rendering used inside error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            PropertyValue::Null => "null".to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::String(s) => s.clone(),
            PropertyValue::DateTime(dt) => dt.to_rfc3339(),
            PropertyValue::List(_) => "list".to_string(),
            PropertyValue::Map(_) => "map".to_string(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&String> for PropertyValue {
    fn from(v: &String) -> Self {
        PropertyValue::String(v.clone())
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(i64::from(v))
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::Int(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

/// Naive timestamps are taken as UTC.
impl From<NaiveDateTime> for PropertyValue {
    fn from(v: NaiveDateTime) -> Self {
        PropertyValue::DateTime(v.and_utc().fixed_offset())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for PropertyValue {
    fn from(v: DateTime<Tz>) -> Self {
        PropertyValue::DateTime(v.fixed_offset())
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        PropertyValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(PropertyValue::Null, Into::into)
    }
}

impl From<Value> for PropertyValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => PropertyValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => PropertyValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Insertion-ordered property bag. Inserting an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Later values win, like a map merge.
    pub fn extend(&mut self, other: &Properties) {
        for (k, v) in other.iter() {
            self.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, PropertyValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl<K: Into<String>, V: Into<PropertyValue>, const N: usize> From<[(K, V); N]> for Properties {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for Properties {
    type Item = (String, PropertyValue);
    type IntoIter = std::vec::IntoIter<(String, PropertyValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Keys for `profile_unset`: either a bare key list or a ready property map.
#[derive(Debug, Clone, PartialEq)]
pub enum UnsetKeys {
    Keys(Vec<String>),
    Map(Properties),
}

impl UnsetKeys {
    /// Every bare key becomes `key: true`.
    pub fn into_properties(self) -> Properties {
        match self {
            UnsetKeys::Keys(keys) => keys.into_iter().map(|k| (k, true)).collect(),
            UnsetKeys::Map(props) => props,
        }
    }
}

impl From<Vec<String>> for UnsetKeys {
    fn from(keys: Vec<String>) -> Self {
        UnsetKeys::Keys(keys)
    }
}

impl From<Vec<&str>> for UnsetKeys {
    fn from(keys: Vec<&str>) -> Self {
        UnsetKeys::Keys(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for UnsetKeys {
    fn from(keys: &[&str]) -> Self {
        UnsetKeys::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UnsetKeys {
    fn from(keys: [&str; N]) -> Self {
        UnsetKeys::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Properties> for UnsetKeys {
    fn from(props: Properties) -> Self {
        UnsetKeys::Map(props)
    }
}

/// `lib` block of every wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibInfo {
    #[serde(rename = "$lib")]
    pub lib: String,
    #[serde(rename = "$lib_version")]
    pub lib_version: String,
    #[serde(rename = "$lib_method")]
    pub lib_method: String,
    #[serde(rename = "$lib_detail", skip_serializing_if = "Option::is_none", default)]
    pub lib_detail: Option<String>,
    #[serde(rename = "$app_version", skip_serializing_if = "Option::is_none", default)]
    pub app_version: Option<String>,
}

pub const LIB_NAME: &str = "Rust";
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LIB_METHOD: &str = "code";

impl Default for LibInfo {
    fn default() -> Self {
        Self {
            lib: LIB_NAME.to_string(),
            lib_version: LIB_VERSION.to_string(),
            lib_method: LIB_METHOD.to_string(),
            lib_detail: None,
            app_version: None,
        }
    }
}

/// A fully validated event, exactly as it goes on the wire.
///
/// `properties` is a JSON map, so it serializes as `{}` when empty and never as `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub event: Option<String>,
    pub time: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distinct_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item_id: Option<String>,
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identities: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
    pub lib: LibInfo,
}
