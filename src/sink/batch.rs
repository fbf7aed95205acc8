use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use tracing::{debug, info, warn};

use super::transport::{HttpResponse, HttpTransport, Transport};
use super::Sink;
use crate::config::BatchConfig;
use crate::encoder::encode_batch;
use crate::error::{TrackError, TrackResult};

/// Buffers encoded messages and POSTs them as one gzip envelope.
///
/// A failed flush keeps the buffer exactly as it was; the next flush
/// (explicit or threshold-triggered) carries every message again.
pub struct BatchSink {
    config: BatchConfig,
    transport: Box<dyn Transport>,
    buffer: Vec<String>,
    response_log: Option<File>,
    closed: bool,
}

impl BatchSink {
    pub fn new(config: BatchConfig) -> TrackResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout())?;
        Self::with_transport(config, Box::new(transport))
    }

    pub fn with_transport(config: BatchConfig, transport: Box<dyn Transport>) -> TrackResult<Self> {
        config.validate()?;
        let response_log = match &config.response_log {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        Ok(Self {
            buffer: Vec::with_capacity(config.max_size),
            config,
            transport,
            response_log,
            closed: false,
        })
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffered(&self) -> &[String] {
        &self.buffer
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn log_response(&mut self, count: usize, outcome: &TrackResult<HttpResponse>) {
        let Some(log) = self.response_log.as_mut() else {
            return;
        };
        let line = match outcome {
            Ok(resp) => format!("{}\t{}\t{}\t{}\n", Utc::now().to_rfc3339(), resp.status, count, resp.body),
            Err(e) => format!("{}\t-\t{}\t{}\n", Utc::now().to_rfc3339(), count, e),
        };
        if let Err(e) = log.write_all(line.as_bytes()) {
            warn!("failed to write batch response log: {}", e);
        }
    }
}

impl Sink for BatchSink {
    fn send(&mut self, message: String) -> TrackResult<()> {
        if self.closed {
            return Err(TrackError::SinkClosed);
        }
        self.buffer.push(message);
        if self.buffer.len() >= self.config.max_size {
            return self.flush();
        }
        Ok(())
    }

    fn flush(&mut self) -> TrackResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let count = self.buffer.len();
        let data_list = encode_batch(&self.buffer)?;
        let form = [("data_list", data_list.as_str()), ("gzip", "1")];
        let outcome = self.transport.post_form(&self.config.url, &form, &[]);
        self.log_response(count, &outcome);

        match outcome {
            Ok(resp) if resp.is_success() => {
                info!(count, status = resp.status, "batch delivered");
                self.buffer.clear();
                Ok(())
            }
            Ok(resp) => {
                warn!(count, status = resp.status, "batch rejected, keeping buffer");
                Err(TrackError::Network(format!(
                    "server answered status {}: {}",
                    resp.status, resp.body
                )))
            }
            Err(e) => {
                warn!(count, error = %e, "batch delivery failed, keeping buffer");
                Err(e)
            }
        }
    }

    fn close(&mut self) -> TrackResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush();
        if let Some(mut log) = self.response_log.take() {
            if let Err(e) = log.flush() {
                warn!("failed to flush batch response log: {}", e);
            }
        }
        self.closed = true;
        if self.buffer.is_empty() {
            debug!("batch sink closed");
        } else {
            warn!(count = self.buffer.len(), "batch sink closed with undelivered messages, dropping them");
            self.buffer.clear();
        }
        result
    }
}
