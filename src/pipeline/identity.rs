use serde_json::{Map, Value};

use super::validator::{check_distinct_id, check_identity_key, check_identity_value, MAX_ID_LEN};
use crate::error::{TrackError, TrackResult};

pub const LOGIN_ID_KEY: &str = "$identity_login_id";
pub const MOBILE_KEY: &str = "$identity_mobile";
pub const EMAIL_KEY: &str = "$identity_email";
pub const ANONYMOUS_ID_KEY: &str = "$identity_anonymous_id";

/// Ordered set of named identifiers for one subject.
///
/// The first value recorded for a key sticks; `None` values are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    entries: Vec<(String, String)>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(login_id: impl Into<String>) -> Self {
        Self::new().with(LOGIN_ID_KEY, login_id)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    pub fn with_optional(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.insert(key, value.map(Into::into));
        self
    }

    /// Returns `false` when the value was `None` or the key was already taken.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let key = key.into();
        if self.entries.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    /// Folds several identities into one, earlier entries winning on key clashes.
    pub fn merge(identities: &[Identity]) -> Identity {
        let mut merged = Identity::new();
        for identity in identities {
            for (k, v) in &identity.entries {
                merged.insert(k.clone(), Some(v.clone()));
            }
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub distinct_id: String,
    /// Set when the id came from the login identity.
    pub from_login: bool,
}

/// Validates every entry of the identity map.
pub fn assert_identities(identity: &Identity) -> TrackResult<()> {
    if identity.is_empty() {
        return Err(TrackError::illegal("identities must not be empty"));
    }
    for (key, value) in identity.iter() {
        check_identity_key(key)?;
        check_identity_value(key, value)?;
    }
    Ok(())
}

/// bind / unbind relate identities to each other, so one alone means nothing.
pub fn assert_bindable(identity: &Identity) -> TrackResult<()> {
    if identity.len() < 2 {
        return Err(TrackError::illegal("bind/unbind requires at least two identities"));
    }
    assert_identities(identity)
}

/// Picks the distinct id for an identity-bound event.
///
/// Precedence: explicit id, then the login identity verbatim, then the first
/// `key+value` pair that fits in 255 bytes, then the first value.
pub fn resolve_distinct_id(explicit: Option<&str>, identity: &Identity) -> TrackResult<ResolvedId> {
    assert_identities(identity)?;

    if let Some(explicit) = explicit {
        let id = check_distinct_id(Some(explicit))?;
        return Ok(ResolvedId {
            distinct_id: id.to_string(),
            from_login: false,
        });
    }

    if let Some(login) = identity.get(LOGIN_ID_KEY) {
        return Ok(ResolvedId {
            distinct_id: login.to_string(),
            from_login: true,
        });
    }

    let candidate = identity
        .iter()
        .map(|(k, v)| format!("{k}+{v}"))
        .find(|c| c.len() <= MAX_ID_LEN);

    let distinct_id = match candidate {
        Some(c) => c,
        // assert_identities guarantees a first entry
        None => identity.iter().next().map(|(_, v)| v.to_string()).unwrap_or_default(),
    };

    Ok(ResolvedId {
        distinct_id,
        from_login: false,
    })
}
