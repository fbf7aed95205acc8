#![allow(dead_code)]

use beacon::encoder::decode_batch;
use beacon::sink::{HttpResponse, Sink, Transport};
use beacon::{TrackError, TrackResult};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const NOW_MS: i64 = 1_437_816_376_123;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("beacon=debug")
        .with_test_writer()
        .try_init();
}

/// Keeps every message in memory so the test can read the wire output.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn json(&self) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }

    pub fn last(&self) -> Value {
        self.json().pop().expect("no message was sent")
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl Sink for MemorySink {
    fn send(&mut self, message: String) -> TrackResult<()> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Decodes the `data_list` envelope back into wire messages.
    pub fn messages(&self) -> Vec<Value> {
        decode_batch(self.field("data_list").expect("data_list missing")).unwrap()
    }
}

#[derive(Default)]
struct TransportState {
    requests: Vec<RecordedRequest>,
    fail_network: bool,
    status: Option<u16>,
}

/// Stands in for the HTTP client: records every POST and answers as told.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<TransportState>>,
}

impl RecordingTransport {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn delivered_messages(&self) -> usize {
        self.requests().iter().map(|r| r.messages().len()).sum()
    }

    pub fn fail_network(&self, fail: bool) {
        self.state.lock().unwrap().fail_network = fail;
    }

    pub fn answer_status(&self, status: u16) {
        self.state.lock().unwrap().status = Some(status);
    }
}

impl Transport for RecordingTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> TrackResult<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            url: url.to_string(),
            form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
        if state.fail_network {
            return Err(TrackError::Network("connection refused".to_string()));
        }
        let status = state.status.unwrap_or(200);
        Ok(HttpResponse {
            status,
            body: if status < 300 { "{}".to_string() } else { "{\"error\":\"bad event\"}".to_string() },
        })
    }
}
