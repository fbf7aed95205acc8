//! Client-side event tracking.
//!
//! Calls on [`Beacon`] are validated, normalized and encoded on the spot,
//! then handed to a [`Sink`](sink::Sink): an NDJSON file, a batching HTTP
//! sender, or the per-event debug endpoint.
//!
//! ```no_run
//! use beacon::{Beacon, BeaconConfig, Properties};
//! use beacon::sink::FileSink;
//!
//! # fn main() -> beacon::TrackResult<()> {
//! let sink = FileSink::open("events.log")?;
//! let mut beacon = Beacon::new(BeaconConfig::default(), Box::new(sink));
//! beacon.track("1234", true, "ViewProduct", &Properties::new().with("price", 42))?;
//! beacon.close()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod sink;

pub use client::Beacon;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BatchConfig, BeaconConfig, DebugConfig, FileConfig};
pub use error::{TrackError, TrackResult};
pub use pipeline::{EventRecord, EventType, Identity, Properties, PropertyValue, UnsetKeys};
