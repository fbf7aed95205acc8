use std::panic::Location;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::BeaconConfig;
use crate::encoder::encode_event;
use crate::error::TrackResult;
use crate::pipeline::identity::{assert_bindable, resolve_distinct_id, Identity};
use crate::pipeline::normalizer::{normalize, NormalizeContext, RawEvent};
use crate::pipeline::types::{EventType, LibInfo, Properties, UnsetKeys, LIB_NAME, LIB_VERSION};
use crate::sink::Sink;

pub const SIGNUP_EVENT: &str = "$SignUp";
pub const BIND_EVENT: &str = "$BindID";
pub const UNBIND_EVENT: &str = "$UnbindID";

/// The tracking API.
///
/// Every call validates synchronously, encodes, and hands the message to the
/// sink before returning. Super properties live on the instance; nothing is
/// shared between instances. All emitting calls take `&mut self`, so sharing
/// one across threads needs the caller's own lock.
pub struct Beacon {
    config: BeaconConfig,
    sink: Box<dyn Sink>,
    clock: Box<dyn Clock>,
    super_properties: Properties,
}

impl Beacon {
    pub fn new(config: BeaconConfig, sink: Box<dyn Sink>) -> Self {
        Self::with_clock(config, sink, Box::new(SystemClock))
    }

    pub fn with_clock(config: BeaconConfig, sink: Box<dyn Sink>, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            sink,
            clock,
            super_properties: default_super_properties(),
        }
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    pub fn super_properties(&self) -> &Properties {
        &self.super_properties
    }

    /// Merged into every later track-style event; caller properties still win.
    pub fn register_super_properties(&mut self, properties: &Properties) {
        self.super_properties.extend(properties);
    }

    /// Back to the `$lib` / `$lib_version` defaults.
    pub fn clear_super_properties(&mut self) {
        self.super_properties = default_super_properties();
    }

    #[track_caller]
    pub fn track(&mut self, distinct_id: &str, is_login_id: bool, event: &str, properties: &Properties) -> TrackResult<()> {
        let caller = Location::caller();
        let mut raw = RawEvent::new(EventType::Track, properties);
        raw.event = Some(event);
        raw.distinct_id = Some(distinct_id);
        raw.is_login_id = is_login_id;
        self.emit(&raw, caller, "track")
    }

    /// Links an anonymous id to the id the user signed up with.
    #[track_caller]
    pub fn track_signup(&mut self, distinct_id: &str, original_id: &str, properties: &Properties) -> TrackResult<()> {
        let caller = Location::caller();
        let mut raw = RawEvent::new(EventType::TrackSignup, properties);
        raw.event = Some(SIGNUP_EVENT);
        raw.distinct_id = Some(distinct_id);
        raw.original_id = Some(original_id);
        self.emit(&raw, caller, "track_signup")
    }

    #[track_caller]
    pub fn profile_set(&mut self, distinct_id: &str, is_login_id: bool, properties: &Properties) -> TrackResult<()> {
        self.profile_update(EventType::ProfileSet, distinct_id, is_login_id, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_set_once(&mut self, distinct_id: &str, is_login_id: bool, properties: &Properties) -> TrackResult<()> {
        self.profile_update(EventType::ProfileSetOnce, distinct_id, is_login_id, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_increment(&mut self, distinct_id: &str, is_login_id: bool, properties: &Properties) -> TrackResult<()> {
        self.profile_update(EventType::ProfileIncrement, distinct_id, is_login_id, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_append(&mut self, distinct_id: &str, is_login_id: bool, properties: &Properties) -> TrackResult<()> {
        self.profile_update(EventType::ProfileAppend, distinct_id, is_login_id, properties, Location::caller())
    }

    /// Bare keys are sent as `key: true`.
    #[track_caller]
    pub fn profile_unset(&mut self, distinct_id: &str, is_login_id: bool, keys: impl Into<UnsetKeys>) -> TrackResult<()> {
        let properties = keys.into().into_properties();
        self.profile_update(EventType::ProfileUnset, distinct_id, is_login_id, &properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_delete(&mut self, distinct_id: &str, is_login_id: bool) -> TrackResult<()> {
        self.profile_update(EventType::ProfileDelete, distinct_id, is_login_id, &Properties::new(), Location::caller())
    }

    /// Ties two or more identities to one subject.
    #[track_caller]
    pub fn bind(&mut self, identities: &[Identity]) -> TrackResult<()> {
        self.bind_update(EventType::TrackIdBind, BIND_EVENT, identities, Location::caller())
    }

    #[track_caller]
    pub fn unbind(&mut self, identities: &[Identity]) -> TrackResult<()> {
        self.bind_update(EventType::TrackIdUnbind, UNBIND_EVENT, identities, Location::caller())
    }

    #[track_caller]
    pub fn track_by_id(&mut self, identity: &Identity, event: &str, properties: &Properties) -> TrackResult<()> {
        let caller = Location::caller();
        let resolved = resolve_distinct_id(None, identity)?;
        let mut raw = RawEvent::new(EventType::Track, properties);
        raw.event = Some(event);
        raw.distinct_id = Some(resolved.distinct_id.as_str());
        raw.is_login_id = resolved.from_login;
        raw.identities = Some(identity);
        self.emit(&raw, caller, "track_by_id")
    }

    #[track_caller]
    pub fn profile_set_by_id(&mut self, identity: &Identity, properties: &Properties) -> TrackResult<()> {
        self.profile_update_by_id(EventType::ProfileSet, identity, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_set_once_by_id(&mut self, identity: &Identity, properties: &Properties) -> TrackResult<()> {
        self.profile_update_by_id(EventType::ProfileSetOnce, identity, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_increment_by_id(&mut self, identity: &Identity, properties: &Properties) -> TrackResult<()> {
        self.profile_update_by_id(EventType::ProfileIncrement, identity, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_append_by_id(&mut self, identity: &Identity, properties: &Properties) -> TrackResult<()> {
        self.profile_update_by_id(EventType::ProfileAppend, identity, properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_unset_by_id(&mut self, identity: &Identity, keys: impl Into<UnsetKeys>) -> TrackResult<()> {
        let properties = keys.into().into_properties();
        self.profile_update_by_id(EventType::ProfileUnset, identity, &properties, Location::caller())
    }

    #[track_caller]
    pub fn profile_delete_by_id(&mut self, identity: &Identity) -> TrackResult<()> {
        self.profile_update_by_id(EventType::ProfileDelete, identity, &Properties::new(), Location::caller())
    }

    #[track_caller]
    pub fn item_set(&mut self, item_type: &str, item_id: &str, properties: &Properties) -> TrackResult<()> {
        self.item_update(EventType::ItemSet, item_type, item_id, properties, Location::caller())
    }

    #[track_caller]
    pub fn item_delete(&mut self, item_type: &str, item_id: &str) -> TrackResult<()> {
        self.item_update(EventType::ItemDelete, item_type, item_id, &Properties::new(), Location::caller())
    }

    pub fn flush(&mut self) -> TrackResult<()> {
        self.sink.flush()
    }

    pub fn close(&mut self) -> TrackResult<()> {
        self.sink.close()
    }

    fn profile_update(
        &mut self,
        kind: EventType,
        distinct_id: &str,
        is_login_id: bool,
        properties: &Properties,
        caller: &'static Location<'static>,
    ) -> TrackResult<()> {
        let mut raw = RawEvent::new(kind, properties);
        raw.distinct_id = Some(distinct_id);
        raw.is_login_id = is_login_id;
        self.emit(&raw, caller, kind.as_str())
    }

    fn profile_update_by_id(
        &mut self,
        kind: EventType,
        identity: &Identity,
        properties: &Properties,
        caller: &'static Location<'static>,
    ) -> TrackResult<()> {
        let resolved = resolve_distinct_id(None, identity)?;
        let mut raw = RawEvent::new(kind, properties);
        raw.distinct_id = Some(resolved.distinct_id.as_str());
        raw.is_login_id = resolved.from_login;
        raw.identities = Some(identity);
        self.emit(&raw, caller, kind.as_str())
    }

    fn bind_update(
        &mut self,
        kind: EventType,
        event: &str,
        identities: &[Identity],
        caller: &'static Location<'static>,
    ) -> TrackResult<()> {
        let merged = Identity::merge(identities);
        assert_bindable(&merged)?;
        let resolved = resolve_distinct_id(None, &merged)?;
        let properties = Properties::new();
        let mut raw = RawEvent::new(kind, &properties);
        raw.event = Some(event);
        raw.distinct_id = Some(resolved.distinct_id.as_str());
        raw.is_login_id = resolved.from_login;
        raw.identities = Some(&merged);
        self.emit(&raw, caller, kind.as_str())
    }

    fn item_update(
        &mut self,
        kind: EventType,
        item_type: &str,
        item_id: &str,
        properties: &Properties,
        caller: &'static Location<'static>,
    ) -> TrackResult<()> {
        let mut raw = RawEvent::new(kind, properties);
        raw.item_type = Some(item_type);
        raw.item_id = Some(item_id);
        self.emit(&raw, caller, kind.as_str())
    }

    fn emit(&mut self, raw: &RawEvent<'_>, caller: &'static Location<'static>, method: &str) -> TrackResult<()> {
        let ctx = NormalizeContext {
            now_millis: self.clock.now_millis(),
            super_properties: Some(&self.super_properties),
            project: self.config.project.as_deref(),
            lib: self.lib_info(caller, method),
        };
        let record = normalize(raw, &ctx)?;
        let message = encode_event(&record)?;
        debug!(
            kind = record.kind.as_str(),
            distinct_id = record.distinct_id.as_deref().unwrap_or(""),
            "event encoded"
        );
        self.sink.send(message)
    }

    fn lib_info(&self, caller: &Location<'_>, method: &str) -> LibInfo {
        LibInfo {
            lib_detail: self
                .config
                .lib_detail
                .then(|| format!("##{}##{}##{}", method, caller.file(), caller.line())),
            app_version: self.config.app_version.clone(),
            ..LibInfo::default()
        }
    }
}

fn default_super_properties() -> Properties {
    Properties::new().with("$lib", LIB_NAME).with("$lib_version", LIB_VERSION)
}
