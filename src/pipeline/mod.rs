//! Event pipeline: raw call arguments in, wire-ready records out.
//!
//! Nothing in here performs I/O or keeps state between calls. A record
//! either passes every rule or the call fails with the first violation.

pub mod identity;
pub mod normalizer;
pub mod types;
pub mod validator;

pub use identity::{resolve_distinct_id, Identity, ResolvedId, LOGIN_ID_KEY};
pub use normalizer::{normalize, NormalizeContext, RawEvent};
pub use types::{EventRecord, EventType, LibInfo, Properties, PropertyValue, UnsetKeys};
