//! Delivery of already-encoded messages.
//!
//! A sink owns its buffer and handles outright. Calls block until the
//! write or the bounded HTTP request is done; there is no background flushing.

pub mod batch;
pub mod debug;
pub mod file;
pub mod transport;

use crate::error::TrackResult;

pub use batch::BatchSink;
pub use debug::DebugSink;
pub use file::FileSink;
pub use transport::{HttpResponse, HttpTransport, Transport};

pub trait Sink: Send {
    /// Hands over one encoded message, in call order.
    fn send(&mut self, message: String) -> TrackResult<()>;

    /// Pushes out anything buffered.
    fn flush(&mut self) -> TrackResult<()> {
        Ok(())
    }

    /// Flushes and releases resources. Later sends fail with `SinkClosed`.
    fn close(&mut self) -> TrackResult<()> {
        self.flush()
    }
}
