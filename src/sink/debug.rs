use tracing::{info, warn};
use url::Url;

use super::transport::{HttpTransport, Transport};
use super::Sink;
use crate::config::DebugConfig;
use crate::encoder::encode_batch;
use crate::error::{TrackError, TrackResult};

pub const DRY_RUN_HEADER: &str = "Dry-Run";

/// Sends every message on its own to the server's `/debug` endpoint.
///
/// Meant for integration testing: a rejected event surfaces as
/// `TrackError::Debug` right at the call site.
pub struct DebugSink {
    url: String,
    write_data: bool,
    transport: Box<dyn Transport>,
    closed: bool,
}

impl DebugSink {
    pub fn new(config: DebugConfig) -> TrackResult<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Self::with_transport(config, Box::new(transport))
    }

    pub fn with_transport(config: DebugConfig, transport: Box<dyn Transport>) -> TrackResult<Self> {
        Ok(Self {
            url: debug_url(&config.url)?,
            write_data: config.write_data,
            transport,
            closed: false,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Same host and query, path replaced by `/debug`.
pub fn debug_url(raw: &str) -> TrackResult<String> {
    let mut url = Url::parse(raw).map_err(|e| TrackError::Config(format!("invalid debug url '{raw}': {e}")))?;
    url.set_path("/debug");
    Ok(url.to_string())
}

impl Sink for DebugSink {
    fn send(&mut self, message: String) -> TrackResult<()> {
        if self.closed {
            return Err(TrackError::SinkClosed);
        }

        let data_list = encode_batch(std::slice::from_ref(&message))?;
        let form = [("data_list", data_list.as_str()), ("gzip", "1")];
        let headers: &[(&str, &str)] = if self.write_data { &[] } else { &[(DRY_RUN_HEADER, "true")] };

        let resp = match self.transport.post_form(&self.url, &form, headers) {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, payload = %message, "debug request failed");
                return Err(e);
            }
        };

        if resp.status >= 300 {
            warn!(status = resp.status, body = %resp.body, payload = %message, "debug endpoint rejected event");
            return Err(TrackError::Debug {
                status: resp.status,
                body: resp.body,
            });
        }

        info!(status = resp.status, dry_run = !self.write_data, payload = %message, "debug endpoint accepted event");
        Ok(())
    }

    fn close(&mut self) -> TrackResult<()> {
        self.closed = true;
        Ok(())
    }
}
